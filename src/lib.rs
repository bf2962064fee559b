//! `outbound-http` is an async outbound HTTP client layered over `reqwest`.
//!
//! It adds what the raw transport leaves to the caller:
//! - a bounded retry loop driven by a pluggable predicate
//!   ([`ClientOptions::with_retry_times`], [`ClientOptions::with_should_retry`])
//! - connection-pool tuning, static proxy and disabled keep-alive
//! - host resolution through a caller-supplied function
//!   ([`ClientOptions::with_dns_resolver`])
//! - request/response dumps to stdout ([`ClientOptions::with_debug`])
//! - convenience verbs: [`HttpClient::get`], [`HttpClient::post`],
//!   [`HttpClient::post_json`]
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use outbound_http::{ClientOptions, FormValues, HttpClient};
//! use reqwest::header::HeaderMap;
//!
//! # async fn run() -> outbound_http::Result<()> {
//! let client = HttpClient::new(
//!     ClientOptions::new()
//!         .with_retry_times(2)
//!         .with_timeout(Duration::from_secs(3)),
//! )?;
//!
//! let params = FormValues::from([("q", "rust")]);
//! let response = client
//!     .get("https://example.com/search", Some(&params), HeaderMap::new())
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod dns;
mod error;
mod options;
mod payload;
mod request;
mod response;
mod retry;
mod trace;
mod transport;

pub use client::HttpClient;
pub use dns::{DnsOverride, DnsResolverFn};
pub use error::{BoxError, DnsError, HttpClientError};
pub use options::{ClientOptions, EffectiveConfig};
pub use payload::{append_query, FormValues, Payload};
pub use request::DEFAULT_HEADERS;
pub use response::Response;
pub use retry::{default_should_retry, ShouldRetry};
pub use trace::{format_request, format_response};

pub type Result<T> = std::result::Result<T, HttpClientError>;

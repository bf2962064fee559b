use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};

use crate::{dns::DnsOverride, EffectiveConfig, HttpClientError, Result};

/// TCP keep-alive probe interval.
pub(crate) const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);
/// Idle pooled connections are evicted after this long.
pub(crate) const IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
/// Upper bound for idle pooled connections.
pub(crate) const MAX_IDLE_CONNS: usize = 100;

/// Produces the pooled client for a finalized configuration.
///
/// A caller-supplied client is returned unchanged: its own transport always
/// wins over the settings built here.
pub(crate) fn build_client(config: &EffectiveConfig) -> Result<reqwest::Client> {
    if let Some(client) = &config.custom_client {
        return Ok(client.clone());
    }

    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .tcp_keepalive(KEEP_ALIVE_INTERVAL)
        .pool_idle_timeout(IDLE_CONN_TIMEOUT)
        .pool_max_idle_per_host(config.max_idle_conns_per_host().min(MAX_IDLE_CONNS));

    if config.disable_keep_alive() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        builder = builder.pool_max_idle_per_host(0).default_headers(headers);
    }

    // Environment proxies are ignored: only an explicit proxy URL routes traffic.
    builder = match config.proxy_url().filter(|url| !url.is_empty()) {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url).map_err(|source| HttpClientError::Proxy {
                url: url.to_owned(),
                source,
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    if let Some(resolver) = &config.dns_resolver {
        builder = builder.dns_resolver(Arc::new(DnsOverride::new(resolver.clone())));
    }

    if let Some(jar) = &config.cookie_jar {
        builder = builder.cookie_provider(jar.clone());
    }

    builder.build().map_err(HttpClientError::Build)
}

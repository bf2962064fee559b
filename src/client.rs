use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

use crate::{
    payload::append_query,
    request::build_request,
    retry::{self, RetryPlan},
    trace,
    transport::build_client,
    ClientOptions, EffectiveConfig, FormValues, HttpClientError, Payload, Response, Result,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Long-lived outbound HTTP handle.
///
/// Owns one finalized configuration and the pooled client built from it.
/// Cloning is cheap and every clone shares the same pool; nothing is mutated
/// per call, so a single handle can serve many concurrent callers. Changing
/// any setting means building a new handle.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: Arc<EffectiveConfig>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Finalizes `options` and builds the underlying transport.
    ///
    /// Fails when the proxy URL is malformed or the transport cannot be
    /// constructed; no network I/O happens here.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let config = options.finalize();
        let http = build_client(&config)?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Read-only view of the effective configuration.
    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    /// Sends a `GET`, appending `params` to the URL query.
    pub async fn get(
        &self,
        url: &str,
        params: Option<&FormValues>,
        headers: HeaderMap,
    ) -> Result<Response> {
        let url = append_query(url, params);
        self.send(Method::GET, &url, Payload::Empty, headers).await
    }

    /// Sends a form `POST`; the content type is always form-urlencoded.
    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Payload>,
        mut headers: HeaderMap,
    ) -> Result<Response> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        self.send(Method::POST, url, body.into(), headers).await
    }

    /// Serializes `value` to JSON and posts it.
    ///
    /// Strings and byte buffers are encoded as JSON values too; use
    /// [`HttpClient::post_json_encoded`] for bodies that are already JSON.
    /// Serialization failures are returned before any request is sent.
    pub async fn post_json<T>(&self, url: &str, value: &T, headers: HeaderMap) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(value).map_err(HttpClientError::Json)?;
        self.post_json_encoded(url, Bytes::from(body), headers).await
    }

    /// Posts an already encoded JSON body (text, bytes or stream) unchanged.
    pub async fn post_json_encoded(
        &self,
        url: &str,
        body: impl Into<Payload>,
        mut headers: HeaderMap,
    ) -> Result<Response> {
        let body = body.into();
        if let Payload::Form(_) = body {
            return Err(HttpClientError::UnsupportedPayload(
                "form values cannot be sent as an encoded JSON body",
            ));
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.send(Method::POST, url, body, headers).await
    }

    /// Builds one request and runs it through the retry loop.
    ///
    /// The outcome of the last attempt is returned: a non-200 status is still
    /// an `Ok` response, only transport-level failures become errors.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
        headers: HeaderMap,
    ) -> Result<Response> {
        let request = build_request(&self.http, &self.config, method, url, payload, headers)?;
        if self.config.debug() {
            trace::dump_request(&request);
        }

        let retry_times = if request.try_clone().is_some() {
            self.config.retry_times()
        } else {
            #[cfg(feature = "tracing")]
            if self.config.retry_times() > 0 {
                tracing::warn!("streaming request body cannot be replayed, retries disabled");
            }
            0
        };
        let plan = RetryPlan::new(retry_times, self.config.retry_backoff());
        let total = plan.total_attempts();
        let mut pending = Some(request);

        retry::drive(
            plan,
            |outcome: &Result<Response>| self.config.should_retry(outcome),
            |attempt| {
                let request = if attempt + 1 < total {
                    pending.as_ref().and_then(reqwest::Request::try_clone)
                } else {
                    pending.take()
                };
                self.attempt(request)
            },
        )
        .await
    }

    async fn attempt(&self, request: Option<reqwest::Request>) -> Result<Response> {
        let request = request.ok_or(HttpClientError::BodyNotReplayable)?;
        let outcome = self.execute(request).await;
        if self.config.debug() {
            trace::dump_outcome(&outcome);
        }
        outcome
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Response> {
        let response = self
            .http
            .execute(request)
            .await
            .map_err(HttpClientError::Transport)?;
        let response = Response::new(response);
        if self.config.debug() {
            // The dump needs the body; keep it buffered for the caller.
            response.buffer().await
        } else {
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderMap;

    use super::HttpClient;
    use crate::{ClientOptions, FormValues, HttpClientError};

    #[test]
    fn handle_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<HttpClient>();
    }

    #[test]
    fn debug_lists_effective_config() {
        let client = HttpClient::new(ClientOptions::new().with_retry_times(3))
            .expect("must build client");
        let debug = format!("{client:?}");
        assert!(debug.contains("retry_times: 3"));
    }

    #[tokio::test]
    async fn encoded_json_rejects_form_values() {
        let client = HttpClient::new(ClientOptions::new()).expect("must build client");
        let err = client
            .post_json_encoded(
                "http://127.0.0.1:9/",
                FormValues::from([("a", "1")]),
                HeaderMap::new(),
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, HttpClientError::UnsupportedPayload(_)));
    }

    #[tokio::test]
    async fn unserializable_json_is_reported_before_sending() {
        use std::collections::HashMap;

        let client = HttpClient::new(ClientOptions::new()).expect("must build client");
        let mut value = HashMap::new();
        value.insert(vec![1u8], "non-string keys do not serialize");

        let err = client
            .post_json("http://127.0.0.1:9/", &value, HeaderMap::new())
            .await
            .expect_err("must fail");
        assert!(matches!(err, HttpClientError::Json(_)));
    }
}

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::{EffectiveConfig, HttpClientError, Payload, Result};

/// Browser-like headers merged into requests when default-header mode is on.
///
/// `accept-encoding` is deliberately absent so the transport keeps
/// negotiating and decoding compression itself.
pub const DEFAULT_HEADERS: [(&str, &str); 5] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
    ),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8,ja;q=0.7"),
    ("cache-control", "no-cache"),
    ("pragma", "no-cache"),
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/66.0.3359.170 Safari/537.36",
    ),
];

/// Adds every default header the caller did not set.
pub(crate) fn merge_default_headers(headers: &mut HeaderMap) {
    for (name, value) in DEFAULT_HEADERS {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
}

/// Builds the transport request for one logical call.
///
/// A caller-supplied `Host` header is kept and overrides the virtual host
/// derived from the URL.
pub(crate) fn build_request(
    client: &reqwest::Client,
    config: &EffectiveConfig,
    method: Method,
    url: &str,
    payload: Payload,
    mut headers: HeaderMap,
) -> Result<reqwest::Request> {
    if config.enable_default_header() {
        merge_default_headers(&mut headers);
    }

    let mut builder = client
        .request(method, url)
        .headers(headers)
        .timeout(config.timeout());
    if let Some(body) = payload.into_body() {
        builder = builder.body(body);
    }

    builder.build().map_err(HttpClientError::Request)
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, HOST, USER_AGENT};
    use reqwest::Method;

    use super::{build_request, merge_default_headers, DEFAULT_HEADERS};
    use crate::{ClientOptions, FormValues, HttpClientError, Payload};

    #[test]
    fn default_headers_fill_gaps_only() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("my-agent/1.0"));

        merge_default_headers(&mut headers);

        assert_eq!(headers.get(USER_AGENT).expect("user-agent"), "my-agent/1.0");
        assert_eq!(headers.get_all(USER_AGENT).iter().count(), 1);
        assert_eq!(headers.len(), DEFAULT_HEADERS.len());
        assert!(headers.contains_key(ACCEPT));
    }

    #[test]
    fn build_keeps_host_override_and_body() {
        let client = reqwest::Client::new();
        let config = ClientOptions::new().finalize();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("virtual.example"));

        let request = build_request(
            &client,
            &config,
            Method::POST,
            "http://127.0.0.1:9/submit",
            Payload::form(FormValues::from([("a", "1")])),
            headers,
        )
        .expect("must build request");

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers().get(HOST).expect("host"), "virtual.example");
        assert_eq!(
            request.body().and_then(|body| body.as_bytes()),
            Some("a=1".as_bytes())
        );
        assert_eq!(request.timeout(), Some(&config.timeout()));
    }

    #[test]
    fn build_without_default_header_mode_adds_nothing() {
        let client = reqwest::Client::new();
        let config = ClientOptions::new().finalize();

        let request = build_request(
            &client,
            &config,
            Method::GET,
            "http://127.0.0.1:9/",
            Payload::Empty,
            HeaderMap::new(),
        )
        .expect("must build request");

        assert!(request.headers().is_empty());
        assert!(request.body().is_none());
    }

    #[test]
    fn build_merges_defaults_when_enabled() {
        let client = reqwest::Client::new();
        let config = ClientOptions::new().with_default_header().finalize();

        let request = build_request(
            &client,
            &config,
            Method::GET,
            "http://127.0.0.1:9/",
            Payload::Empty,
            HeaderMap::new(),
        )
        .expect("must build request");

        assert_eq!(request.headers().len(), DEFAULT_HEADERS.len());
    }

    #[test]
    fn malformed_url_is_a_build_error() {
        let client = reqwest::Client::new();
        let config = ClientOptions::new().finalize();

        let err = build_request(
            &client,
            &config,
            Method::GET,
            "not a url",
            Payload::Empty,
            HeaderMap::new(),
        )
        .expect_err("must fail");

        assert!(matches!(err, HttpClientError::Request(_)));
    }
}

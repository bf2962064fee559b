use std::fmt;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url, Version};
use serde::de::DeserializeOwned;

use crate::{HttpClientError, Result};

enum Body {
    Streaming(reqwest::Response),
    Buffered(Bytes),
}

/// Final HTTP response handed back to the caller.
///
/// Status, version, URL and headers are captured up front; the body is
/// read lazily unless debug tracing already buffered it.
pub struct Response {
    status: StatusCode,
    version: Version,
    url: Url,
    headers: HeaderMap,
    body: Body,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("buffered", &matches!(self.body, Body::Buffered(_)))
            .finish()
    }
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self {
            status: inner.status(),
            version: inner.version(),
            url: inner.url().clone(),
            headers: inner.headers().clone(),
            body: Body::Streaming(inner),
        }
    }

    /// Reads the whole body into memory so it can be inspected more than once.
    pub(crate) async fn buffer(self) -> Result<Self> {
        let body = match self.body {
            Body::Streaming(inner) => {
                Body::Buffered(inner.bytes().await.map_err(HttpClientError::Transport)?)
            }
            buffered @ Body::Buffered(_) => buffered,
        };
        Ok(Self { body, ..self })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes, if they have already been read.
    pub fn buffered_body(&self) -> Option<&Bytes> {
        match &self.body {
            Body::Buffered(bytes) => Some(bytes),
            Body::Streaming(_) => None,
        }
    }

    pub async fn bytes(self) -> Result<Bytes> {
        match self.body {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Streaming(inner) => inner.bytes().await.map_err(HttpClientError::Transport),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(HttpClientError::Json)
    }
}

use std::collections::BTreeMap;

use bytes::Bytes;
use futures_util::stream::TryStream;

use crate::BoxError;

/// Multi-valued form or query parameters.
///
/// Keys encode in sorted order; values of one key keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), vec![value.into()]);
        self
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.0 {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Request body in one of the accepted shapes.
#[derive(Debug, Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// UTF-8 text sent as is.
    Text(String),
    /// Raw bytes sent as is.
    Bytes(Bytes),
    /// Form values, sent form-encoded.
    Form(FormValues),
    /// Already-open byte stream. Streams cannot be replayed across retries.
    Stream(reqwest::Body),
}

impl Payload {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    pub fn form(values: impl Into<FormValues>) -> Self {
        Self::Form(values.into())
    }

    /// Wraps a fallible chunk stream as a streaming body.
    pub fn stream<S>(stream: S) -> Self
    where
        S: TryStream + Send + Sync + 'static,
        S::Error: Into<BoxError>,
        Bytes: From<S::Ok>,
    {
        Self::Stream(reqwest::Body::wrap_stream(stream))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts the payload into a transport body; `None` means no body.
    pub(crate) fn into_body(self) -> Option<reqwest::Body> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text.into()),
            Self::Bytes(bytes) => Some(bytes.into()),
            Self::Form(values) => Some(values.encode().into()),
            Self::Stream(body) => Some(body),
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<&'static [u8]> for Payload {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<FormValues> for Payload {
    fn from(value: FormValues) -> Self {
        Self::Form(value)
    }
}

impl From<reqwest::Body> for Payload {
    fn from(value: reqwest::Body) -> Self {
        Self::Stream(value)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

/// Appends encoded query parameters to `url`.
///
/// An empty URL or missing parameters leave the URL untouched. A URL that
/// already has a query gets `&` unless it ends in a bare `?`.
pub fn append_query(url: &str, params: Option<&FormValues>) -> String {
    let Some(params) = params else {
        return url.to_owned();
    };
    if url.is_empty() {
        return url.to_owned();
    }

    let mut target = String::with_capacity(url.len() + 1);
    target.push_str(url);
    if url.contains('?') {
        if !url.ends_with('?') {
            target.push('&');
        }
    } else {
        target.push('?');
    }
    target.push_str(&params.encode());
    target
}

#[cfg(test)]
mod tests {
    use crate::{append_query, FormValues, Payload};

    #[test]
    fn query_is_added_with_question_mark() {
        let params = FormValues::from([("a", "1")]);
        assert_eq!(
            append_query("http://x/y", Some(&params)),
            "http://x/y?a=1"
        );
    }

    #[test]
    fn trailing_question_mark_is_not_duplicated() {
        let params = FormValues::from([("a", "1")]);
        assert_eq!(
            append_query("http://x/y?", Some(&params)),
            "http://x/y?a=1"
        );
    }

    #[test]
    fn existing_query_gets_ampersand() {
        let params = FormValues::from([("b", "2")]);
        assert_eq!(
            append_query("http://x/y?a=1", Some(&params)),
            "http://x/y?a=1&b=2"
        );
    }

    #[test]
    fn missing_params_or_url_leave_url_unchanged() {
        let params = FormValues::from([("a", "1")]);
        assert_eq!(append_query("http://x/y", None), "http://x/y");
        assert_eq!(append_query("", Some(&params)), "");
    }

    #[test]
    fn form_encoding_sorts_keys_and_escapes() {
        let mut values = FormValues::new();
        values.add("q", "rust lang").add("a", "x&y").add("q", "second");
        assert_eq!(values.encode(), "a=x%26y&q=rust+lang&q=second");
    }

    #[test]
    fn set_replaces_all_values() {
        let mut values = FormValues::from([("k", "1"), ("k", "2")]);
        values.set("k", "3");
        assert_eq!(values.encode(), "k=3");
        assert_eq!(values.get("k"), Some("3"));
    }

    #[test]
    fn payload_conversions() {
        assert!(Payload::from(()).is_empty());
        assert!(matches!(Payload::from("abc"), Payload::Text(_)));
        assert!(matches!(Payload::from(vec![1u8, 2]), Payload::Bytes(_)));
        assert!(matches!(
            Payload::from(FormValues::from([("a", "1")])),
            Payload::Form(_)
        ));
    }

    #[test]
    fn form_payload_body_is_encoded() {
        let body = Payload::form([("a", "1"), ("b", "two words")])
            .into_body()
            .expect("form payload must produce a body");
        assert_eq!(body.as_bytes(), Some("a=1&b=two+words".as_bytes()));
    }
}

//! Incoming HTTP request type and matched path arguments.

use std::collections::HashMap;

use bytes::Bytes;

use crate::headers::Headers;

/// An incoming HTTP request.
#[derive(Clone, Debug)]
pub struct Request {
    method: String,
    uri: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn uri(&self) -> &str { &self.uri }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// `true` for `HEAD`, in any letter case.
    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

/// Path arguments extracted by the matcher.
///
/// For a route `/users/{id}`, `params.get("id")` on `/users/42` returns `Some("42")`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_detection_ignores_case() {
        assert!(Request::new("HEAD", "/").is_head());
        assert!(Request::new("head", "/").is_head());
        assert!(Request::new("HeAd", "/").is_head());
        assert!(!Request::new("GET", "/").is_head());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new("GET", "/").with_header("X-Request-Id", "abc");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn params_lookup() {
        let params: Params = [("id", "42")].into_iter().collect();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("name"), None);
        assert_eq!(params.len(), 1);
    }
}

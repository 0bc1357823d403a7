use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::{ProbeError, Result};

/// Request body payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// JSON document, serialized by the transport.
    Json(serde_json::Value),
    /// Raw text sent verbatim.
    Raw(String),
}

/// One outbound call, built fresh per request.
///
/// The struct enumerates every recognized per-call option; there is no
/// passthrough for arbitrary transport settings.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub(crate) method: Method,
    /// Path relative to the client base URL, or an absolute `http(s)` URL
    /// used verbatim.
    pub(crate) target: String,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) body: Option<Body>,
    pub(crate) headers: HeaderMap,
    pub(crate) timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            params: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn patch(target: impl Into<String>) -> Self {
        Self::new(Method::PATCH, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Appends one query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Appends query parameters from an iterator of pairs.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Sets a raw text body.
    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Raw(body.into()));
        self
    }

    /// Overrides or adds one header for this call only. Caller-supplied
    /// headers win over session defaults of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|err| ProbeError::Header(err.to_string()))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|err| ProbeError::Header(err.to_string()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Overrides the client default timeout for this call only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::RequestSpec;
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn verb_constructors() {
        assert_eq!(RequestSpec::get("/a").method, Method::GET);
        assert_eq!(RequestSpec::post("/a").method, Method::POST);
        assert_eq!(RequestSpec::put("/a").method, Method::PUT);
        assert_eq!(RequestSpec::patch("/a").method, Method::PATCH);
        assert_eq!(RequestSpec::delete("/a").method, Method::DELETE);
    }

    #[test]
    fn query_pairs_accumulate_in_order() {
        let spec = RequestSpec::get("/list")
            .query("page", "1")
            .query_pairs([("size", "20"), ("sort", "id")]);
        assert_eq!(
            spec.params,
            vec![
                ("page".to_owned(), "1".to_owned()),
                ("size".to_owned(), "20".to_owned()),
                ("sort".to_owned(), "id".to_owned()),
            ]
        );
    }

    #[test]
    fn json_body_and_timeout_override() {
        let spec = RequestSpec::post("/items")
            .json(json!({"name": "kit"}))
            .timeout(Duration::from_millis(250));
        assert!(spec.body.is_some());
        assert_eq!(spec.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let err = RequestSpec::get("/")
            .header("X-Bad", "line\nbreak")
            .expect_err("control characters must be rejected");
        assert!(err.to_string().contains("invalid header"));
    }
}

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::{ProbeError, Result};

/// Snapshot of one HTTP response.
///
/// Built eagerly from the transport response, body fully read, so the
/// assertion layer can inspect it any number of times without touching the
/// connection again. An error status (4xx/5xx) is still a `ResponseRecord`.
#[derive(Clone, Debug)]
pub struct ResponseRecord {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body text. Binary bodies arrive lossily converted.
    pub body: String,
    /// Wall-clock duration of the final transport attempt.
    pub elapsed: Duration,
}

impl ResponseRecord {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body text.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decodes the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|err| ProbeError::Decode(format!("invalid JSON body: {err}")))
    }

    /// Looks up a value in the JSON body by dotted path, e.g. `"data.id"`.
    ///
    /// Returns `None` when the body is not JSON, the path is missing, or an
    /// intermediate segment is not an object.
    pub fn field(&self, path: &str) -> Option<serde_json::Value> {
        let root: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        let mut current = &root;
        for key in path.split('.') {
            current = current.as_object()?.get(key)?;
        }
        Some(current.clone())
    }
}

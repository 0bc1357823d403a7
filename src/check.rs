//! Response checks for test code.
//!
//! Each check returns `Err(CheckError)` instead of panicking, so a test can
//! decide whether a mismatch fails the case, skips it, or is retried at a
//! higher level. The failing response body is carried in the error where it
//! helps diagnosis.

use std::time::Duration;

use crate::ResponseRecord;

/// A failed response check.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("expected status {expected}, got {actual}; body: {body}")]
    Status {
        expected: u16,
        actual: u16,
        body: String,
    },
    #[error("elapsed {actual:.3?} exceeded ceiling {ceiling:.3?}")]
    Elapsed { actual: Duration, ceiling: Duration },
    #[error("response body is not a JSON object")]
    NotJson,
    #[error("missing fields: {0:?}")]
    MissingFields(Vec<String>),
    #[error("field {path}: expected {expected}, got {actual}")]
    FieldValue {
        path: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    },
    #[error("field {0} not found")]
    FieldMissing(String),
}

/// Checks the status code.
pub fn expect_status(response: &ResponseRecord, expected: u16) -> Result<(), CheckError> {
    if response.status == expected {
        return Ok(());
    }
    Err(CheckError::Status {
        expected,
        actual: response.status,
        body: response.body.clone(),
    })
}

/// Checks that the final attempt completed within `ceiling`.
pub fn expect_max_elapsed(response: &ResponseRecord, ceiling: Duration) -> Result<(), CheckError> {
    if response.elapsed <= ceiling {
        return Ok(());
    }
    Err(CheckError::Elapsed {
        actual: response.elapsed,
        ceiling,
    })
}

/// Checks that every named top-level field is present in the JSON body.
/// Reports all missing fields at once.
pub fn expect_fields(response: &ResponseRecord, fields: &[&str]) -> Result<(), CheckError> {
    let root: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|_| CheckError::NotJson)?;
    let object = root.as_object().ok_or(CheckError::NotJson)?;

    let missing: Vec<String> = fields
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| (*field).to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CheckError::MissingFields(missing))
    }
}

/// Checks a dotted-path field against an expected value.
pub fn expect_field(
    response: &ResponseRecord,
    path: &str,
    expected: &serde_json::Value,
) -> Result<(), CheckError> {
    let actual = response
        .field(path)
        .ok_or_else(|| CheckError::FieldMissing(path.to_owned()))?;
    if &actual == expected {
        return Ok(());
    }
    Err(CheckError::FieldValue {
        path: path.to_owned(),
        expected: expected.clone(),
        actual,
    })
}

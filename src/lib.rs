//! `probe-http` is a resilient async HTTP client for API test harnesses.
//!
//! Every call runs through one explicit pipeline: resolve the URL against
//! the configured base, resolve the effective timeout and headers, drive the
//! transport through a bounded fixed-delay retry loop, then emit exactly one
//! summary record. Two rules shape the design:
//!
//! - Only transient transport faults (connect failure, client-side timeout,
//!   reset) are retried. An HTTP response with an error status is a business
//!   outcome for the test layer to assert on; retrying it would mask real
//!   defects or duplicate non-idempotent writes.
//! - A session-backed client carries mutable default headers (including a
//!   bearer credential) over one shared connection pool; a sessionless
//!   client rejects header mutation and makes every call independent.
//!
//! ```no_run
//! use probe_http::{check, ClientOptions, ProbeClient, RequestSpec};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut api = ProbeClient::new("http://127.0.0.1:8080/api", ClientOptions::default())?;
//!     api.set_token("abc123")?;
//!
//!     let response = api
//!         .send(RequestSpec::post("/coupons").json(json!({"name": "WELCOME10"})))
//!         .await?;
//!     check::expect_status(&response, 201)?;
//!     check::expect_field(&response, "data.name", &json!("WELCOME10"))?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod observe;
mod options;
mod request;
mod response;

pub mod check;
pub mod config;

pub use client::ProbeClient;
pub use error::ProbeError;
pub use observe::{CallOutcome, CallRecord, CaptureSink};
pub use options::{ClientOptions, RetryPolicy};
pub use request::{Body, RequestSpec};
pub use response::ResponseRecord;

pub type Result<T> = std::result::Result<T, ProbeError>;

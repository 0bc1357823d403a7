use std::fmt;
use std::time::Duration;

/// Outcome of one logical call, as seen by the observability layer.
#[derive(Clone, Debug)]
pub enum CallOutcome {
    /// A response was obtained; carries the status code.
    Status(u16),
    /// All attempts failed; carries the final fault description.
    Failed(String),
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Summary record for one logical call: emitted exactly once per
/// [`crate::ProbeClient::send`], whether it returned a response or exhausted
/// its retry budget.
///
/// Fields are captured as supplied; nothing is redacted. Keep secrets out of
/// query parameters and bodies that end up in reports.
#[derive(Clone, Debug)]
pub struct CallRecord {
    /// HTTP method name.
    pub method: String,
    /// Fully resolved URL the call was issued against.
    pub url: String,
    /// Transport attempts made, including the first.
    pub attempts: u32,
    /// Status code or failure description.
    pub outcome: CallOutcome,
    /// Wall-clock time for the whole call, retry delays included.
    pub elapsed: Duration,
    /// Compact rendering of query parameters, if any were supplied.
    pub params: Option<String>,
    /// Compact rendering of the request body, if one was supplied.
    pub body: Option<String>,
}

impl CallRecord {
    /// Renders the record as the text blob handed to a [`CaptureSink`],
    /// one `key: value` line per populated field.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "{} {}\nattempts: {}\noutcome: {}\nelapsed: {:.3}s\n",
            self.method,
            self.url,
            self.attempts,
            self.outcome,
            self.elapsed.as_secs_f64(),
        );
        if let Some(params) = &self.params {
            out.push_str("params: ");
            out.push_str(params);
            out.push('\n');
        }
        if let Some(body) = &self.body {
            out.push_str("body: ");
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

/// Attachment sink for per-call capture records.
///
/// Test-report tooling implements this to attach one named text blob per
/// call. Installing a sink is optional; the client behaves identically
/// without one, and a sink must never influence the call result.
pub trait CaptureSink: Send + Sync {
    fn capture(&self, record: &CallRecord);
}

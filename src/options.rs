use std::time::Duration;

/// Configures timeout, session and retry behavior for a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Default per-request timeout. Overridable per call.
    pub timeout: Duration,
    /// Whether the client keeps a persistent session: one shared connection
    /// pool plus a mutable default-header store. Without a session every
    /// call is fully independent and header mutation is rejected.
    pub use_session: bool,
    /// Retry behavior for transient transport faults.
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            use_session: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientOptions {
    /// Options for a sessionless client.
    pub fn sessionless() -> Self {
        Self {
            use_session: false,
            ..Self::default()
        }
    }
}

/// Bounded fixed-delay retry for transient transport faults.
///
/// Only connectivity-class faults are retried; an HTTP response with an
/// error status ends the attempt loop like any other response. The policy
/// does not distinguish idempotent methods: a POST that times out after the
/// server already processed the write can be duplicated by the retry. Set
/// `max_attempts` to 1 where duplicates are unacceptable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Fixed delay between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

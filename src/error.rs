/// Error type returned by this crate.
///
/// HTTP responses with 4xx/5xx statuses are deliberately absent: the client
/// returns them as ordinary [`crate::ResponseRecord`]s for the assertion
/// layer to classify.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Invalid client construction input or configuration document.
    #[error("config error: {0}")]
    Config(String),
    /// A session-only mutation was attempted on a sessionless client.
    #[error("{0} requires a session-backed client; pass headers per call instead")]
    Session(&'static str),
    /// A header name or value could not be represented on the wire.
    #[error("invalid header: {0}")]
    Header(String),
    /// The request could not be constructed (malformed URL, unencodable
    /// body). Never retried.
    #[error("request error: {0}")]
    Request(String),
    /// Connectivity-class fault that survived the whole retry budget.
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        /// Number of attempts actually made, including the first.
        attempts: u32,
        /// The fault from the final attempt.
        source: reqwest::Error,
    },
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

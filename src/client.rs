use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    config::Profile,
    observe::{CallOutcome, CallRecord, CaptureSink},
    request::{Body, RequestSpec},
    ClientOptions, ProbeError, ResponseRecord, Result,
};

const USER_AGENT_VALUE: &str = concat!("probe-http/", env!("CARGO_PKG_VERSION"));

/// Resolves a call target against the client base URL.
///
/// A target carrying its own scheme is used verbatim; anything else is
/// appended to the base URL (callers supply the leading `/`).
fn resolve_url(base_url: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_owned()
    } else {
        format!("{base_url}{target}")
    }
}

/// Persistent session context: one shared connection pool plus the mutable
/// default headers applied to every call.
#[derive(Clone)]
struct Session {
    http: reqwest::Client,
    headers: HeaderMap,
}

impl Session {
    fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Self {
            http: reqwest::Client::new(),
            headers,
        }
    }
}

/// Result of the attempt loop, kept whole until the summary record has been
/// emitted so the call is observed exactly once.
enum Attempted {
    Response { attempts: u32, record: ResponseRecord },
    Transport { attempts: u32, source: reqwest::Error },
    Request { attempts: u32, message: String },
}

#[derive(Clone)]
/// Resilient HTTP client for exercising an API under test.
///
/// Each call resolves its URL, timeout and headers, then drives the
/// transport through a bounded fixed-delay retry loop. Transient transport
/// faults (connect failure, client-side timeout, reset) are retried; HTTP
/// responses, error statuses included, are returned as [`ResponseRecord`]s
/// for the assertion layer to judge.
pub struct ProbeClient {
    base_url: String,
    options: ClientOptions,
    session: Option<Session>,
    capture: Option<Arc<dyn CaptureSink>>,
}

impl fmt::Debug for ProbeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authorization = self.session.as_ref().map(|session| {
            if session.headers.contains_key(AUTHORIZATION) {
                "<redacted>"
            } else {
                "<none>"
            }
        });
        f.debug_struct("ProbeClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("authorization", &authorization)
            .finish()
    }
}

impl ProbeClient {
    /// Creates a client for `base_url`.
    ///
    /// The trailing slash of the base URL is stripped. Fails with
    /// [`ProbeError::Config`] on an empty base URL, a zero timeout, or a
    /// zero attempt budget.
    pub fn new(base_url: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ProbeError::Config("base URL must not be empty".to_owned()));
        }
        if options.timeout.is_zero() {
            return Err(ProbeError::Config("timeout must be positive".to_owned()));
        }
        if options.retry.max_attempts == 0 {
            return Err(ProbeError::Config(
                "retry policy needs at least one attempt".to_owned(),
            ));
        }

        let session = options.use_session.then(Session::new);
        Ok(Self {
            base_url,
            options,
            session,
            capture: None,
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `PROBE_BASE_URL` (required) and `PROBE_TOKEN` (optional;
    /// applied as a bearer credential).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PROBE_BASE_URL").map_err(|_| {
            ProbeError::Config("missing PROBE_BASE_URL environment variable".to_owned())
        })?;
        if base_url.trim().is_empty() {
            return Err(ProbeError::Config(
                "PROBE_BASE_URL is set but empty".to_owned(),
            ));
        }

        let mut client = Self::new(base_url, ClientOptions::default())?;
        if let Ok(token) = std::env::var("PROBE_TOKEN") {
            if !token.trim().is_empty() {
                client.set_token(token)?;
            }
        }
        Ok(client)
    }

    /// Creates a session-backed client from an environment [`Profile`],
    /// applying its timeout and token.
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        let options = ClientOptions {
            timeout: profile.timeout(),
            ..ClientOptions::default()
        };
        let mut client = Self::new(profile.base_url.clone(), options)?;
        if let Some(token) = &profile.token {
            client.set_token(token)?;
        }
        Ok(client)
    }

    /// Installs an attachment sink receiving one [`CallRecord`] per call.
    pub fn with_capture(mut self, sink: Arc<dyn CaptureSink>) -> Self {
        self.capture = Some(sink);
        self
    }

    /// The configured base URL, trailing slash stripped.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or(ProbeError::Session(operation))
    }

    /// Sets the bearer credential sent with every subsequent call.
    ///
    /// An existing `Bearer ` prefix (any case) is preserved; otherwise one
    /// is added. Fails with [`ProbeError::Session`] on a sessionless client.
    pub fn set_token(&mut self, token: impl AsRef<str>) -> Result<()> {
        let value = normalize_bearer_authorization(token.as_ref());
        let session = self.session_mut("set_token")?;
        let value =
            HeaderValue::try_from(value).map_err(|err| ProbeError::Header(err.to_string()))?;
        session.headers.insert(AUTHORIZATION, value);
        debug!("authorization credential set");
        Ok(())
    }

    /// Sets the `Authorization` header verbatim, for non-bearer schemes.
    pub fn set_raw_auth(&mut self, value: impl AsRef<str>) -> Result<()> {
        let session = self.session_mut("set_raw_auth")?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|err| ProbeError::Header(err.to_string()))?;
        session.headers.insert(AUTHORIZATION, value);
        debug!("authorization credential set");
        Ok(())
    }

    /// Clears the credential if present. No-op otherwise, sessionless
    /// clients included.
    pub fn remove_token(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.headers.remove(AUTHORIZATION).is_some() {
                debug!("authorization credential removed");
            }
        }
    }

    /// Merges extra default headers into the session context.
    ///
    /// Fails with [`ProbeError::Session`] on a sessionless client and with
    /// [`ProbeError::Header`] on a name or value invalid on the wire.
    pub fn set_headers<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let session = self.session_mut("set_headers")?;
        for (name, value) in pairs {
            let name = HeaderName::try_from(name.as_ref())
                .map_err(|err| ProbeError::Header(err.to_string()))?;
            let value = HeaderValue::try_from(value.as_ref())
                .map_err(|err| ProbeError::Header(err.to_string()))?;
            session.headers.insert(name, value);
        }
        Ok(())
    }

    /// Executes one request through the full pipeline.
    pub async fn send(&self, spec: RequestSpec) -> Result<ResponseRecord> {
        let url = resolve_url(&self.base_url, &spec.target);
        let timeout = spec.timeout.unwrap_or(self.options.timeout);
        let headers = self.resolve_headers(&spec.headers);
        debug!(method = %spec.method, %url, ?timeout, "dispatching request");

        let started = Instant::now();
        let attempted = self.run_attempts(&spec, &url, timeout, &headers).await;
        self.observe(&spec, &url, &attempted, started.elapsed());

        match attempted {
            Attempted::Response { record, .. } => Ok(record),
            Attempted::Transport { attempts, source } => {
                Err(ProbeError::Transport { attempts, source })
            }
            Attempted::Request { message, .. } => Err(ProbeError::Request(message)),
        }
    }

    /// `GET` without query parameters.
    pub async fn get(&self, path: impl Into<String>) -> Result<ResponseRecord> {
        self.send(RequestSpec::get(path)).await
    }

    /// `GET` with query parameters.
    pub async fn get_with<I, K, V>(&self, path: impl Into<String>, params: I) -> Result<ResponseRecord>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.send(RequestSpec::get(path).query_pairs(params)).await
    }

    /// `POST` with a JSON body.
    pub async fn post_json(
        &self,
        path: impl Into<String>,
        body: serde_json::Value,
    ) -> Result<ResponseRecord> {
        self.send(RequestSpec::post(path).json(body)).await
    }

    /// `PUT` with a JSON body.
    pub async fn put_json(
        &self,
        path: impl Into<String>,
        body: serde_json::Value,
    ) -> Result<ResponseRecord> {
        self.send(RequestSpec::put(path).json(body)).await
    }

    /// `PATCH` with a JSON body.
    pub async fn patch_json(
        &self,
        path: impl Into<String>,
        body: serde_json::Value,
    ) -> Result<ResponseRecord> {
        self.send(RequestSpec::patch(path).json(body)).await
    }

    /// `DELETE` without a body.
    pub async fn delete(&self, path: impl Into<String>) -> Result<ResponseRecord> {
        self.send(RequestSpec::delete(path)).await
    }

    /// Header-resolve stage: session defaults, then caller overrides, then
    /// the crate defaults wherever still absent. Caller values always win.
    fn resolve_headers(&self, overrides: &HeaderMap) -> HeaderMap {
        let mut headers = match &self.session {
            Some(session) => session.headers.clone(),
            None => HeaderMap::new(),
        };
        for (name, value) in overrides {
            headers.insert(name, value.clone());
        }
        headers
            .entry(CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json"));
        headers
            .entry(USER_AGENT)
            .or_insert_with(|| HeaderValue::from_static(USER_AGENT_VALUE));
        headers
    }

    /// Attempt loop: dispatches up to `max_attempts` times, sleeping the
    /// fixed delay between transient faults. HTTP statuses never retry.
    async fn run_attempts(
        &self,
        spec: &RequestSpec,
        url: &str,
        timeout: Duration,
        headers: &HeaderMap,
    ) -> Attempted {
        let max_attempts = self.options.retry.max_attempts;
        let mut attempt = 1u32;
        loop {
            match self.dispatch(spec, url, timeout, headers).await {
                Ok(record) => {
                    return Attempted::Response {
                        attempts: attempt,
                        record,
                    }
                }
                Err(err) if err.is_builder() => {
                    return Attempted::Request {
                        attempts: attempt,
                        message: err.to_string(),
                    }
                }
                Err(err) if attempt < max_attempts && is_transient(&err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "transient transport fault, retrying"
                    );
                    sleep(self.options.retry.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Attempted::Transport {
                        attempts: attempt,
                        source: err,
                    }
                }
            }
        }
    }

    /// One transport dispatch. Reads the body eagerly so the returned
    /// record is self-contained.
    async fn dispatch(
        &self,
        spec: &RequestSpec,
        url: &str,
        timeout: Duration,
        headers: &HeaderMap,
    ) -> std::result::Result<ResponseRecord, reqwest::Error> {
        let http = match &self.session {
            Some(session) => session.http.clone(),
            None => reqwest::Client::new(),
        };

        let mut request = http
            .request(spec.method.clone(), url)
            .timeout(timeout)
            .headers(headers.clone());
        if !spec.params.is_empty() {
            request = request.query(&spec.params);
        }
        request = match &spec.body {
            Some(Body::Json(value)) => request.json(value),
            Some(Body::Raw(text)) => request.body(text.clone()),
            None => request,
        };

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(ResponseRecord {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }

    /// Observe stage: one summary per logical call, after the attempt loop
    /// has fully ended.
    fn observe(&self, spec: &RequestSpec, url: &str, attempted: &Attempted, elapsed: Duration) {
        let (attempts, outcome) = match attempted {
            Attempted::Response { attempts, record } => {
                (*attempts, CallOutcome::Status(record.status))
            }
            Attempted::Transport { attempts, source } => {
                (*attempts, CallOutcome::Failed(source.to_string()))
            }
            Attempted::Request { attempts, message } => {
                (*attempts, CallOutcome::Failed(message.clone()))
            }
        };

        let record = CallRecord {
            method: spec.method.to_string(),
            url: url.to_owned(),
            attempts,
            outcome,
            elapsed,
            params: render_params(&spec.params),
            body: spec.body.as_ref().map(render_body),
        };

        match &record.outcome {
            CallOutcome::Status(status) => info!(
                method = %record.method,
                url = %record.url,
                status,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "request completed"
            ),
            CallOutcome::Failed(reason) => error!(
                method = %record.method,
                url = %record.url,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                %reason,
                "request failed"
            ),
        }

        if let Some(sink) = &self.capture {
            sink.capture(&record);
        }
    }
}

fn render_params(params: &[(String, String)]) -> Option<String> {
    if params.is_empty() {
        return None;
    }
    let rendered = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    Some(rendered)
}

fn render_body(body: &Body) -> String {
    match body {
        Body::Json(value) => value.to_string(),
        Body::Raw(text) => text.clone(),
    }
}

/// Transient transport fault: a failure before any HTTP response exists.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

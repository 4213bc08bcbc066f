//! A single chat request from submission to settlement.
//!
//! [`RequestLifecycle`] posts one user message to the relay and races the call against
//! a deadline.  Whichever side loses is torn down: a response that arrives first drops
//! the timer, and a deadline that fires first cancels the request's token and drops the
//! in-flight call.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;

use crate::chat::timeline::MessageRef;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_FAILURES, CLIENT_REQUEST_DURATION, CLIENT_REQUESTS, CLIENT_TIMEOUTS,
};
use crate::types::ChatRequest;

/// How long a chat request may take before it is abandoned.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Path of the relay endpoint, resolved against the client's origin.
pub const CHAT_PATH: &str = "/api/chat";

/// Status and body of a relay answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response from a status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The call failed before a complete response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Carries a chat request to the relay.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post `request` and return the relay's answer.
    ///
    /// Implementations should stop work promptly once `cancel` fires; the caller also
    /// drops the returned future at that point.
    async fn post_chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// [`ChatTransport`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport posting to `origin` + `/api/chat`.
    pub fn new(origin: &str) -> Result<Self> {
        let endpoint = Url::parse(origin)?.join(CHAT_PATH)?;
        // No client-level timeout: the lifecycle owns the deadline.
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(Self { client, endpoint })
    }

    /// The resolved chat endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<TransportResponse, TransportError> {
        debug!(endpoint = %self.endpoint, "POST chat request");
        let call = async {
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(request)
                .send()
                .await
                .map_err(|e| TransportError::new(format!("request failed: {e}")))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::new(format!("reading response failed: {e}")))?;
            Ok::<_, TransportError>(TransportResponse { status, body })
        };
        tokio::select! {
            outcome = call => outcome,
            _ = cancel.cancelled() => Err(TransportError::new("request aborted")),
        }
    }
}

/// Discriminant of a [`SendError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure.
    NetworkError,
    /// Deadline exceeded.
    Timeout,
    /// Non-2xx status.
    ServerError,
    /// 2xx without usable text.
    EmptyResponse,
}

/// Why a chat request produced no reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The call failed before a response arrived.
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The deadline passed first; the call was cancelled.
    Timeout {
        /// Time waited before giving up.
        after: Duration,
    },

    /// The relay answered with a non-success status.
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// The relay answered 2xx, but with no parseable, non-blank `result`.
    EmptyResponse,
}

impl SendError {
    /// The error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SendError::Network { .. } => ErrorKind::NetworkError,
            SendError::Timeout { .. } => ErrorKind::Timeout,
            SendError::Server { .. } => ErrorKind::ServerError,
            SendError::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Network { message } => write!(f, "network error: {message}"),
            SendError::Timeout { after } => {
                write!(f, "request timed out after {}ms", after.as_millis())
            }
            SendError::Server { status } => write!(f, "server responded with status {status}"),
            SendError::EmptyResponse => write!(f, "no response text received"),
        }
    }
}

impl std::error::Error for SendError {}

/// The one request allowed in flight while input is disabled.
#[derive(Debug)]
pub struct PendingRequest {
    text: String,
    placeholder: MessageRef,
    cancel: CancellationToken,
    deadline: Instant,
}

impl PendingRequest {
    /// Start the clock on a request for `text` whose answer will replace `placeholder`.
    pub fn new(text: impl Into<String>, placeholder: MessageRef, timeout: Duration) -> Self {
        Self {
            text: text.into(),
            placeholder,
            cancel: CancellationToken::new(),
            deadline: Instant::now() + timeout,
        }
    }

    /// The submitted user text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The placeholder message awaiting replacement.
    pub fn placeholder(&self) -> MessageRef {
        self.placeholder
    }

    /// Token cancelled when the deadline wins.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// When the request is abandoned.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Sends chat requests with a bounded wait.
pub struct RequestLifecycle<T: ChatTransport> {
    transport: T,
    timeout: Duration,
}

impl<T: ChatTransport> RequestLifecycle<T> {
    /// Create a lifecycle with the default 30 second deadline.
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, REQUEST_TIMEOUT)
    }

    /// Create a lifecycle with a custom deadline.
    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// The deadline applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `text` as a single user message and wait for the reply text.
    pub async fn send_chat(&self, text: &str) -> std::result::Result<String, SendError> {
        let cancel = CancellationToken::new();
        self.send_until(text, Instant::now() + self.timeout, &cancel)
            .await
    }

    /// Drive a pending request to settlement against its own deadline and token.
    pub async fn send_pending(
        &self,
        pending: &PendingRequest,
    ) -> std::result::Result<String, SendError> {
        self.send_until(&pending.text, pending.deadline, &pending.cancel)
            .await
    }

    async fn send_until(
        &self,
        text: &str,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, SendError> {
        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let request = ChatRequest::single_user(text);

        let answer = tokio::select! {
            answer = self.transport.post_chat(&request, cancel) => Some(answer),
            _ = tokio::time::sleep_until(deadline) => None,
        };
        let elapsed = started.elapsed();
        CLIENT_REQUEST_DURATION.add(elapsed.as_secs_f64());

        let result = match answer {
            None => {
                cancel.cancel();
                CLIENT_TIMEOUTS.click();
                warn!(elapsed_ms = elapsed.as_millis() as u64, "chat request timed out");
                return Err(SendError::Timeout { after: elapsed });
            }
            Some(Err(err)) => Err(SendError::Network {
                message: err.to_string(),
            }),
            Some(Ok(response)) => interpret(&response),
        };
        if let Err(err) = &result {
            CLIENT_FAILURES.click();
            error!(error = %err, "chat request failed");
        }
        result
    }
}

/// Map a relay answer to reply text.
///
/// Only a 2xx whose JSON body has a string `result` that is non-blank after trimming
/// produces text.
pub fn interpret(response: &TransportResponse) -> std::result::Result<String, SendError> {
    if !(200..300).contains(&response.status) {
        return Err(SendError::Server {
            status: response.status,
        });
    }
    let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
        return Err(SendError::EmptyResponse);
    };
    body.get("result")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(SendError::EmptyResponse)
}

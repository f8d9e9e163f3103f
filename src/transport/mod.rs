mod http;

pub use http::HttpTransport;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use thiserror::Error;

/// Broad classification of a request failure, for callers that branch on the
/// cause rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Unauthorized,
    Forbidden,
    NotFound,
    Backend,
}

/// Uniform error surfaced by the transport to every caller. Always carries a
/// human-readable message.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Parse(String),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Http { status: 401, .. } => ErrorKind::Unauthorized,
            RequestError::Http { status: 403, .. } => ErrorKind::Forbidden,
            RequestError::Http { status: 404, .. } => ErrorKind::NotFound,
            RequestError::Http { .. } => ErrorKind::Backend,
            RequestError::Network(_) => ErrorKind::Network,
            RequestError::Parse(_) => ErrorKind::Parse,
        }
    }
}

/// Per-upload progress observer. Receives integer percentages 0-100; the
/// transport delivers only strictly increasing values.
pub type ProgressFn = Arc<dyn Fn(u32) + Send + Sync>;

/// Abstraction over the HTTP backend. Callers never build requests
/// themselves; tests substitute mock implementations at this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// JSON request/response. `body`, when present, is sent as a JSON body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, RequestError>;

    /// Raw binary upload with incremental progress reporting.
    async fn upload(
        &self,
        path: &str,
        file_name: &str,
        data: Bytes,
        on_progress: Option<ProgressFn>,
    ) -> Result<serde_json::Value, RequestError>;

    /// Raw binary download.
    async fn download(&self, path: &str) -> Result<Bytes, RequestError>;
}

/// Where bearer tokens come from. A missing token is not an error at this
/// layer; the backend answers 401 and that surfaces as
/// `ErrorKind::Unauthorized`.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Mutable token store for sessions whose token changes over time.
#[derive(Debug, Default)]
pub struct SessionToken {
    inner: RwLock<Option<String>>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut lock = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *lock = Some(token.into());
    }

    pub fn clear(&self) {
        let mut lock = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *lock = None;
    }
}

impl TokenSource for SessionToken {
    fn token(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Fixed token, mostly for one-shot CLI use.
#[derive(Debug)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Tracks bytes handed to the connection and yields only strictly increasing
/// integer percentages, suppressing duplicates and decreases.
pub(crate) struct ProgressGate {
    total: u64,
    sent: u64,
    last: u32,
}

impl ProgressGate {
    pub(crate) fn new(total: u64) -> Self {
        Self {
            total,
            sent: 0,
            last: 0,
        }
    }

    /// Record `bytes` more bytes sent. Returns a percentage only when it is
    /// higher than anything previously returned.
    pub(crate) fn advance(&mut self, bytes: u64) -> Option<u32> {
        self.sent = self.sent.saturating_add(bytes);
        let pct = if self.total == 0 {
            100
        } else {
            ((self.sent.min(self.total) as u128 * 100) / self.total as u128) as u32
        };
        if pct > self.last {
            self.last = pct;
            Some(pct)
        } else {
            None
        }
    }
}

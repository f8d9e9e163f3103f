use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};

use super::{ProgressFn, ProgressGate, RequestError, TokenSource, Transport};

/// reqwest-backed transport speaking to the files + groups backend.
pub struct HttpTransport {
    base_url: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
    chunk_size: usize,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
        request_timeout: Duration,
        chunk_size: usize,
    ) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RequestError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            tokens,
            chunk_size: chunk_size.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token when the session has one. No token is not an
    /// error here; the backend answers 401.
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn parse_json(resp: reqwest::Response) -> Result<serde_json::Value, RequestError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RequestError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| RequestError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, RequestError> {
        let mut req = self.authorize(self.client.request(method.clone(), self.url(path)));
        if let Some(ref body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        tracing::trace!(%method, path, status = resp.status().as_u16(), "request completed");
        Self::parse_json(resp).await
    }

    async fn upload(
        &self,
        path: &str,
        file_name: &str,
        data: Bytes,
        on_progress: Option<ProgressFn>,
    ) -> Result<serde_json::Value, RequestError> {
        let mut gate = ProgressGate::new(data.len() as u64);
        let chunk_size = self.chunk_size;
        let total_chunks = data.len().div_ceil(chunk_size).max(1);

        // Progress fires as reqwest pulls each chunk into the connection, so
        // percentages track bytes handed off rather than bytes acknowledged.
        let chunks = (0..total_chunks).map(move |i| {
            let start = i * chunk_size;
            let end = ((i + 1) * chunk_size).min(data.len());
            let piece = data.slice(start..end);
            if let Some(pct) = gate.advance((end - start) as u64) {
                if let Some(ref cb) = on_progress {
                    cb(pct);
                }
            }
            Ok::<Bytes, std::convert::Infallible>(piece)
        });

        let resp = self
            .authorize(self.client.post(self.url(path)))
            .header("Content-Type", "application/octet-stream")
            .header("X-File-Name", urlencoding::encode(file_name).into_owned())
            .body(reqwest::Body::wrap_stream(futures_util::stream::iter(chunks)))
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        tracing::trace!(path, file_name, status = resp.status().as_u16(), "upload completed");
        Self::parse_json(resp).await
    }

    async fn download(&self, path: &str) -> Result<Bytes, RequestError> {
        let resp = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RequestError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        resp.bytes()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body. Backends answer with
/// `{"message": ...}`, `{"error": ...}`, or a JSend `{"data": {"message":
/// ...}}` envelope; anything unparseable falls back to the HTTP reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.get("message"),
            value.get("error"),
            value.get("data").and_then(|d| d.get("message")),
        ];
        for candidate in candidates {
            if let Some(text) = candidate.and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

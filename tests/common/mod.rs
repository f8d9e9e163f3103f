//! Shared test doubles for the transport seam.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::{json, Value};

use file_sync::{ProgressFn, RequestError, Transport};

/// One call observed by a test transport. Uploads are recorded with the
/// pseudo-method `UPLOAD` and the file name in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport that replays a scripted queue of responses and records every
/// call. Uploads emit a fixed, strictly increasing progress sequence the way
/// the real transport's gate guarantees.
#[derive(Default)]
pub struct ScriptedTransport {
    pub calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<Result<Value, RequestError>>>,
}

impl ScriptedTransport {
    pub const UPLOAD_PERCENTS: [u32; 4] = [25, 50, 75, 100];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_err(&self, err: RequestError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: impl Into<String>, path: &str, body: Option<Value>) {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.into(),
            path: path.to_string(),
            body,
        });
    }

    fn next_response(&self) -> Result<Value, RequestError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        self.record(method.to_string(), path, body);
        self.next_response()
    }

    async fn upload(
        &self,
        path: &str,
        file_name: &str,
        data: Bytes,
        on_progress: Option<ProgressFn>,
    ) -> Result<Value, RequestError> {
        self.record(
            "UPLOAD",
            path,
            Some(json!({ "fileName": file_name, "size": data.len() })),
        );
        let response = self.next_response()?;
        if let Some(cb) = on_progress {
            for pct in Self::UPLOAD_PERCENTS {
                cb(pct);
            }
        }
        Ok(response)
    }

    async fn download(&self, path: &str) -> Result<Bytes, RequestError> {
        self.record("DOWNLOAD", path, None);
        self.next_response().map(|_| Bytes::new())
    }
}

/// JSON the upload endpoint answers with.
pub fn uploaded_file_json(id: &str, name: &str, size: u64) -> Value {
    json!({
        "file": {
            "id": id,
            "name": name,
            "size": size,
            "uploadTime": "2024-05-01T10:00:00Z",
            "ownerId": "user-1"
        }
    })
}

/// Minimal in-memory stand-in for the files + groups backend. Routes on
/// method + path the way the real service does, so tests can verify that a
/// refetch reconciles local projections to server truth.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

#[derive(Default)]
struct BackendState {
    next_id: i64,
    files: Vec<StoredFile>,
    // (file_id, group_id, permission)
    links: Vec<(String, i64, String)>,
}

struct StoredFile {
    id: String,
    name: String,
    data: Bytes,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_json(file: &StoredFile) -> Value {
        json!({
            "id": file.id,
            "name": file.name,
            "size": file.data.len(),
            "uploadTime": "2024-05-01T10:00:00Z",
            "ownerId": "user-1"
        })
    }

    fn not_found(message: &str) -> RequestError {
        RequestError::Http {
            status: 404,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let mut state = self.state.lock().unwrap();

        match (method.as_str(), path) {
            ("GET", "/api/files") => {
                let files: Vec<Value> = state.files.iter().map(Self::file_json).collect();
                let total_size: usize = state.files.iter().map(|f| f.data.len()).sum();
                Ok(json!({
                    "files": files,
                    "total": files.len(),
                    "totalSize": total_size
                }))
            }
            ("GET", "/api/groups/files") => {
                let mut rows = Vec::new();
                for (file_id, group_id, permission) in &state.links {
                    if let Some(file) = state.files.iter().find(|f| &f.id == file_id) {
                        let mut row = Self::file_json(file);
                        row["groupId"] = json!(group_id);
                        row["permission"] = json!(permission);
                        rows.push(row);
                    }
                }
                Ok(json!({ "files": rows, "total": rows.len() }))
            }
            ("POST", _) if path.starts_with("/api/groups/") && path.ends_with("/files") => {
                let group_id: i64 = path
                    .trim_start_matches("/api/groups/")
                    .trim_end_matches("/files")
                    .parse()
                    .expect("group id in path");
                let body = body.expect("share body");
                let file_id = body["fileId"].as_str().expect("fileId").to_string();
                let permission = body["permission"].as_str().unwrap_or("READ").to_string();

                if !state.files.iter().any(|f| f.id == file_id) {
                    return Err(Self::not_found("File not found"));
                }
                state.links.push((file_id, group_id, permission));
                Ok(Value::Null)
            }
            ("DELETE", _) if path.starts_with("/api/groups/files/") => {
                let file_id = path.trim_start_matches("/api/groups/files/");
                match state.links.iter().position(|(id, _, _)| id == file_id) {
                    Some(idx) => {
                        state.links.remove(idx);
                        Ok(Value::Null)
                    }
                    None => Err(Self::not_found("Share not found")),
                }
            }
            ("DELETE", _) if path.starts_with("/api/files/") => {
                let file_id = path.trim_start_matches("/api/files/");
                match state.files.iter().position(|f| f.id == file_id) {
                    Some(idx) => {
                        state.files.remove(idx);
                        Ok(Value::Null)
                    }
                    None => Err(Self::not_found("File not found")),
                }
            }
            _ => panic!("unexpected request: {method} {path}"),
        }
    }

    async fn upload(
        &self,
        _path: &str,
        file_name: &str,
        data: Bytes,
        on_progress: Option<ProgressFn>,
    ) -> Result<Value, RequestError> {
        if let Some(cb) = on_progress {
            cb(50);
            cb(100);
        }

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let file = StoredFile {
            // Numeric JSON id, to exercise client-side id normalization.
            id: state.next_id.to_string(),
            name: file_name.to_string(),
            data,
        };
        let mut row = Self::file_json(&file);
        row["id"] = json!(state.next_id);
        state.files.push(file);
        Ok(json!({ "file": row }))
    }

    async fn download(&self, path: &str) -> Result<Bytes, RequestError> {
        let file_id = path.trim_start_matches("/api/files/");
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.data.clone())
            .ok_or_else(|| Self::not_found("File not found"))
    }
}

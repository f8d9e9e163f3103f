use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

use crate::client::share_file;
use crate::record::{map_to_file_record, BackendFileRecord, FileRecord, Permission};
use crate::transport::{ProgressFn, RequestError, Transport};

/// One file selected for upload: a display name plus the raw payload.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub name: String,
    pub data: Bytes,
}

impl UploadSource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Lifecycle of a single transfer. Terminal states are never retried
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

/// Transfer state for one file. `progress` mirrors the percentages the
/// transport delivers, so it is monotonically non-decreasing until the task
/// reaches a terminal status.
#[derive(Debug)]
pub(crate) struct UploadTask {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) status: UploadStatus,
    pub(crate) progress: Arc<AtomicU32>,
    pub(crate) error: Option<String>,
    data: Bytes,
}

impl UploadTask {
    fn new(source: UploadSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: source.name,
            status: UploadStatus::Pending,
            progress: Arc::new(AtomicU32::new(0)),
            error: None,
            data: source.data,
        }
    }
}

/// Caller-facing progress observer: `(file_name, percent)` pairs. Percent is
/// scoped to the named file, not aggregated across the batch.
pub type BatchProgressFn = Box<dyn FnMut(&str, u32) + Send>;

pub(crate) async fn run_batch(
    transport: &dyn Transport,
    sources: Vec<UploadSource>,
    on_progress: Option<BatchProgressFn>,
    target_group_id: Option<i64>,
) -> Result<Vec<FileRecord>, RequestError> {
    let mut tasks: Vec<UploadTask> = sources.into_iter().map(UploadTask::new).collect();
    drive_tasks(transport, &mut tasks, on_progress, target_group_id).await
}

/// Sequential batch driver: owns at most one in-flight transport call, so the
/// upload and share follow-up for file N fully resolve before file N+1 is
/// dispatched. The first failure aborts the remaining batch; files already
/// uploaded stay uploaded.
async fn drive_tasks(
    transport: &dyn Transport,
    tasks: &mut [UploadTask],
    on_progress: Option<BatchProgressFn>,
    target_group_id: Option<i64>,
) -> Result<Vec<FileRecord>, RequestError> {
    let shared = on_progress.map(|f| Arc::new(Mutex::new(f)));
    let mut uploaded = Vec::with_capacity(tasks.len());

    for task in tasks.iter_mut() {
        task.status = UploadStatus::Uploading;
        tracing::debug!(task_id = %task.id, name = %task.name, "upload dispatched");

        let per_file: ProgressFn = {
            let cell = Arc::clone(&task.progress);
            let cb = shared.clone();
            let name = task.name.clone();
            Arc::new(move |pct: u32| {
                cell.store(pct, Ordering::Relaxed);
                if let Some(ref cb) = cb {
                    if let Ok(mut f) = cb.lock() {
                        f(&name, pct);
                    }
                }
            })
        };

        let value = match transport
            .upload("/api/files", &task.name, task.data.clone(), Some(per_file))
            .await
        {
            Ok(value) => value,
            Err(err) => {
                task.status = UploadStatus::Error;
                task.error = Some(err.to_string());
                tracing::warn!(task_id = %task.id, name = %task.name, error = %err, "upload failed, aborting batch");
                return Err(err);
            }
        };

        let record = match parse_uploaded(value) {
            Ok(record) => record,
            Err(err) => {
                task.status = UploadStatus::Error;
                task.error = Some(err.to_string());
                return Err(err);
            }
        };
        task.progress.store(100, Ordering::Relaxed);
        task.status = UploadStatus::Success;

        if let Some(group_id) = target_group_id {
            share_file(transport, &record.id, group_id, Permission::Read).await?;
        }

        tracing::debug!(task_id = %task.id, file_id = %record.id, "upload complete");
        uploaded.push(record);
    }

    Ok(uploaded)
}

/// The upload endpoint wraps the new row in a `{"file": ...}` envelope.
fn parse_uploaded(value: serde_json::Value) -> Result<FileRecord, RequestError> {
    let raw = value
        .get("file")
        .cloned()
        .ok_or_else(|| RequestError::Parse("upload response missing 'file'".to_string()))?;
    let record: BackendFileRecord =
        serde_json::from_value(raw).map_err(|e| RequestError::Parse(e.to_string()))?;
    Ok(map_to_file_record(record))
}

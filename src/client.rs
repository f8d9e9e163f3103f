use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;

use crate::record::{map_to_file_record, BackendFileRecord, FileRecord, Permission};
use crate::transport::{RequestError, Transport};
use crate::upload::{run_batch, BatchProgressFn, UploadSource};

/// Envelope for `GET /api/files`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonalListing {
    files: Vec<BackendFileRecord>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    total_size: u64,
}

/// Envelope for `GET /api/groups/files`.
#[derive(Debug, Deserialize)]
struct GroupListing {
    files: Vec<BackendFileRecord>,
    #[serde(default)]
    total: u64,
}

/// Handle on the files + groups backend. Constructed once and passed by
/// reference to consumers; holds no list state of its own. Every operation
/// suspends only at network I/O and surfaces failures as `RequestError`
/// without retrying.
pub struct FileClient {
    transport: Arc<dyn Transport>,
}

impl FileClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Files owned by the caller. `group_id` is absent on every record.
    pub async fn list_personal_files(&self) -> Result<Vec<FileRecord>, RequestError> {
        let value = self.transport.send(Method::GET, "/api/files", None).await?;
        let listing: PersonalListing =
            serde_json::from_value(value).map_err(|e| RequestError::Parse(e.to_string()))?;

        tracing::debug!(
            total = listing.total,
            total_size = listing.total_size,
            "fetched personal files"
        );
        Ok(listing.files.into_iter().map(map_to_file_record).collect())
    }

    /// Group-shared files across every group the caller can see, with
    /// `group_id` populated. Server-side scoped to the caller's memberships.
    pub async fn list_group_files(&self) -> Result<Vec<FileRecord>, RequestError> {
        let value = self
            .transport
            .send(Method::GET, "/api/groups/files", None)
            .await?;
        let listing: GroupListing =
            serde_json::from_value(value).map_err(|e| RequestError::Parse(e.to_string()))?;

        tracing::debug!(total = listing.total, "fetched group files");
        Ok(listing.files.into_iter().map(map_to_file_record).collect())
    }

    /// Upload a batch strictly sequentially, optionally sharing each new file
    /// into `target_group_id` at READ permission. Fails fast on the first
    /// error; files uploaded before the failure stay uploaded.
    pub async fn upload_many(
        &self,
        sources: Vec<UploadSource>,
        on_progress: Option<BatchProgressFn>,
        target_group_id: Option<i64>,
    ) -> Result<Vec<FileRecord>, RequestError> {
        run_batch(self.transport.as_ref(), sources, on_progress, target_group_id).await
    }

    /// Associate an existing file with a group. Duplicate-call behavior is
    /// backend-defined; this client neither dedupes nor retries.
    pub async fn share_existing(
        &self,
        file_id: &str,
        group_id: i64,
        permission: Permission,
    ) -> Result<(), RequestError> {
        share_file(self.transport.as_ref(), file_id, group_id, permission).await
    }

    /// Remove one group association. The underlying file is untouched.
    pub async fn unshare(&self, group_file_id: &str) -> Result<(), RequestError> {
        self.transport
            .send(
                Method::DELETE,
                &format!("/api/groups/files/{group_file_id}"),
                None,
            )
            .await?;
        tracing::debug!(file_id = %group_file_id, "unshared file");
        Ok(())
    }

    /// Delete an owned file outright.
    pub async fn delete_personal(&self, file_id: &str) -> Result<(), RequestError> {
        self.transport
            .send(Method::DELETE, &format!("/api/files/{file_id}"), None)
            .await?;
        tracing::debug!(file_id = %file_id, "deleted file");
        Ok(())
    }

    /// Fetch a file's raw contents.
    pub async fn download(&self, file_id: &str) -> Result<Bytes, RequestError> {
        self.transport
            .download(&format!("/api/files/{file_id}"))
            .await
    }
}

pub(crate) async fn share_file(
    transport: &dyn Transport,
    file_id: &str,
    group_id: i64,
    permission: Permission,
) -> Result<(), RequestError> {
    let body = serde_json::json!({ "fileId": file_id, "permission": permission });
    transport
        .send(
            Method::POST,
            &format!("/api/groups/{group_id}/files"),
            Some(body),
        )
        .await?;
    tracing::debug!(file_id = %file_id, group_id, "shared file to group");
    Ok(())
}

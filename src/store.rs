use crate::record::FileRecord;

/// Records whose `group_id` equals `group_id`, relative order preserved. Pure.
pub fn filter_by_group(files: &[FileRecord], group_id: i64) -> Vec<FileRecord> {
    files
        .iter()
        .filter(|f| f.group_id == Some(group_id))
        .cloned()
        .collect()
}

/// In-memory file list for one view.
///
/// This projection is never authoritative: it is mutated optimistically after
/// actions so a caller can reflect them immediately, and replaced wholesale
/// via `replace_all` from the next server fetch. Each view owns its store
/// exclusively; concurrent views refetch independently.
#[derive(Debug, Default)]
pub struct FileListStore {
    files: Vec<FileRecord>,
}

impl FileListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authoritative reset from a fresh server fetch.
    pub fn replace_all(&mut self, files: Vec<FileRecord>) {
        self.files = files;
    }

    /// Optimistic insert after a successful upload.
    pub fn record_uploaded(&mut self, file: FileRecord) {
        self.files.push(file);
    }

    /// Optimistic removal after a successful delete.
    pub fn record_deleted(&mut self, file_id: &str) {
        self.files.retain(|f| f.id != file_id);
    }

    /// Optimistic removal of one group association after an unshare.
    pub fn record_unshared(&mut self, file_id: &str, group_id: i64) {
        self.files
            .retain(|f| !(f.id == file_id && f.group_id == Some(group_id)));
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

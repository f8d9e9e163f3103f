use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Classification of a file derived from its name's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Link,
    Audio,
    Image,
    Video,
    Document,
}

impl FileKind {
    /// Derive the kind from a file name. Pure lookup over a fixed extension
    /// table; unknown or missing extensions classify as `File`.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => return FileKind::File,
        };

        match ext.as_str() {
            "doc" | "docx" | "pdf" | "txt" | "md" => FileKind::Document,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" => FileKind::Image,
            "mp3" | "wav" | "flac" | "aac" => FileKind::Audio,
            "mp4" | "avi" | "mov" | "wmv" => FileKind::Video,
            "url" | "lnk" => FileKind::Link,
            _ => FileKind::File,
        }
    }
}

/// Access level carried on a group share link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    #[default]
    Read,
    Write,
}

/// A file row as the backend serves it. Personal listings omit `groupId` and
/// `permission`; group listings populate both.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFileRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub upload_time: DateTime<Utc>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub permission: Option<Permission>,
}

/// Normalized client-side representation of a stored file.
///
/// `id` is unique within a single fetched list; `kind` is a pure function of
/// `name`. `group_id` is present only on group-shared copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub owner_id: Option<String>,
    pub group_id: Option<i64>,
    pub permission: Option<Permission>,
}

/// Convert a backend row into the normalized client shape. Pure.
pub fn map_to_file_record(record: BackendFileRecord) -> FileRecord {
    FileRecord {
        kind: FileKind::from_name(&record.name),
        id: record.id,
        name: record.name,
        size_bytes: record.size,
        uploaded_at: record.upload_time,
        owner_id: record.owner_id,
        group_id: record.group_id,
        permission: record.permission,
    }
}

/// Backends are inconsistent about numeric vs string ids; normalize to String.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count: base 1024, two decimal places. Zero is the
/// literal "0 B".
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Render a timestamp relative to `now`. `now` is an explicit parameter so
/// callers and tests agree on the clock.
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(ts);
    if elapsed < chrono::Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < chrono::Duration::hours(1) {
        format!("{} minutes ago", elapsed.num_minutes())
    } else if elapsed < chrono::Duration::days(1) {
        format!("{} hours ago", elapsed.num_hours())
    } else if elapsed < chrono::Duration::days(7) {
        format!("{} days ago", elapsed.num_days())
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

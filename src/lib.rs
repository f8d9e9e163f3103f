//! file-sync - client-side file transfer and synchronization for a files + groups REST API
//!
//! This crate implements the transfer core a UI sits on top of:
//! - Bearer-authenticated HTTP transport with streamed, progress-reporting uploads
//! - Normalization of backend file rows into a uniform client shape
//! - A sequential upload coordinator with optional share-to-group follow-up
//! - Personal vs. group-shared listings, share/unshare/delete
//! - A non-authoritative in-memory list store reconciled from server fetches

pub mod client;
pub mod config;
pub mod record;
pub mod store;
pub mod transport;
pub mod upload;

pub use client::FileClient;
pub use record::{
    format_relative_time, format_size, map_to_file_record, BackendFileRecord, FileKind,
    FileRecord, Permission,
};
pub use store::{filter_by_group, FileListStore};
pub use transport::{
    ErrorKind, HttpTransport, ProgressFn, RequestError, SessionToken, StaticToken, TokenSource,
    Transport,
};
pub use upload::{BatchProgressFn, UploadSource};

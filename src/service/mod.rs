//! The remote directory service boundary.
//!
//! The picker consumes a file-browsing service through the
//! [`DirectoryService`] trait: one listing call and one creation call.
//! Authentication, transports and pagination live behind the trait; the
//! wire types below mirror the JSON shape such services respond with
//! (`{"files": [{"name", "path", "type"}], "error"}`).

pub mod local;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a directory service implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O errors from a local or transport-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested path is outside what the service exposes.
    #[error("access denied: {0}")]
    Denied(String),

    /// Any other failure the service reports.
    #[error("service error: {0}")]
    Remote(String),
}

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "dir")]
    Directory,
    #[serde(rename = "file")]
    File,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    /// Absolute path of the entry. Some services omit it for the `.` and
    /// `..` pseudo-entries, hence the default.
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// A directory listing response.
///
/// Services report errors either as a transport failure (`ServiceError`)
/// or in-band through the `error` field; the picker treats both the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirListing {
    #[serde(default)]
    pub files: Vec<DirEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A hierarchical file-browsing service.
///
/// Implementations are called from worker tasks via `spawn_blocking`, so
/// methods may block.
pub trait DirectoryService: Send + Sync {
    /// List all entries directly under `path`.
    fn list_directory(&self, path: &str) -> Result<DirListing, ServiceError>;

    /// Create a directory called `name` under `parent`.
    ///
    /// Name validation is the service's responsibility; callers forward
    /// user input untouched.
    fn create_directory(&self, parent: &str, name: &str) -> Result<(), ServiceError>;
}

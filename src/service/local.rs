//! Local-filesystem directory service.
//!
//! Maps the picker's virtual `/` namespace onto a directory on the local
//! machine, so the binary and the integration tests can drive the picker
//! without a remote file-browsing server behind the trait.

use std::fs;
use std::path::PathBuf;

use crate::service::{DirEntry, DirListing, DirectoryService, EntryKind, ServiceError};
use crate::tree::join_path;

/// A [`DirectoryService`] backed by a local directory subtree.
pub struct LocalDirectoryService {
    root: PathBuf,
}

impl LocalDirectoryService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a virtual path onto the served root. `.` and `..` components
    /// are rejected so the service never escapes its root.
    fn resolve(&self, path: &str) -> Result<PathBuf, ServiceError> {
        let mut real = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if part == "." || part == ".." {
                return Err(ServiceError::Denied(path.to_string()));
            }
            real.push(part);
        }
        Ok(real)
    }
}

impl DirectoryService for LocalDirectoryService {
    fn list_directory(&self, path: &str) -> Result<DirListing, ServiceError> {
        let real = self.resolve(path)?;
        let mut files = Vec::new();
        for entry in fs::read_dir(&real)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let kind = match entry.file_type() {
                Ok(t) if t.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(_) => continue,
            };
            files.push(DirEntry {
                path: join_path(path, &name),
                name,
                kind,
            });
        }
        // Local read order is arbitrary; sort so the "service order" the
        // tree preserves is stable.
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(DirListing { files, error: None })
    }

    fn create_directory(&self, parent: &str, name: &str) -> Result<(), ServiceError> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(ServiceError::Remote(format!("invalid folder name: {name:?}")));
        }
        let real = self.resolve(parent)?.join(name);
        fs::create_dir(&real)?;
        Ok(())
    }
}

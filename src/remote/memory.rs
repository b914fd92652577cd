//! In-memory [`RemoteStore`] with failure injection.
//!
//! Builds a remote tree from plain paths and records every call made against
//! it, so crawl behavior can be checked without a server.
//!
//! ```
//! use ftp_crawler_core::remote::{MemoryStore, RemotePath, RemoteStore};
//!
//! let mut store = MemoryStore::new()
//!     .with_file("/a/secret.pem", b"key")
//!     .deny("/private");
//! let listing = store.list_directory(&RemotePath::new("/a")).unwrap();
//! assert_eq!(listing.files.len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::{Listing, RemoteEntry, RemoteError, RemotePath, RemoteStore};

#[derive(Debug, Clone, Copy)]
struct InjectedFailure {
    code: u32,
    remaining: Option<u32>,
}

/// An in-memory remote tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    directories: BTreeSet<RemotePath>,
    files: BTreeMap<RemotePath, Vec<u8>>,
    denied: HashSet<RemotePath>,
    connection_lost_at: HashSet<RemotePath>,
    failing_downloads: HashMap<RemotePath, InjectedFailure>,
    list_calls: Vec<RemotePath>,
    download_calls: Vec<RemotePath>,
}

impl MemoryStore {
    /// An empty tree containing only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self::default();
        store.directories.insert(RemotePath::root());
        store
    }

    /// Adds a directory and all of its ancestors.
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert_dir_chain(RemotePath::new(path));
        self
    }

    /// Adds a file (and its ancestor directories) with the given contents.
    #[must_use]
    pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
        let path = RemotePath::new(path);
        if let Some(parent) = path.parent() {
            self.insert_dir_chain(parent);
        }
        self.files.insert(path, contents.to_vec());
        self
    }

    /// Makes listing `path` fail with access denied. The directory is created.
    #[must_use]
    pub fn deny(mut self, path: &str) -> Self {
        let path = RemotePath::new(path);
        self.insert_dir_chain(path.clone());
        self.denied.insert(path);
        self
    }

    /// Makes listing `path` report a lost connection.
    #[must_use]
    pub fn lose_connection_at(mut self, path: &str) -> Self {
        let path = RemotePath::new(path);
        self.insert_dir_chain(path.clone());
        self.connection_lost_at.insert(path);
        self
    }

    /// Makes every download of `path` fail with the given FTP reply code.
    #[must_use]
    pub fn fail_download(mut self, path: &str, code: u32) -> Self {
        self.failing_downloads.insert(
            RemotePath::new(path),
            InjectedFailure {
                code,
                remaining: None,
            },
        );
        self
    }

    /// Makes the first `times` downloads of `path` fail with the given reply code.
    #[must_use]
    pub fn fail_download_times(mut self, path: &str, code: u32, times: u32) -> Self {
        self.failing_downloads.insert(
            RemotePath::new(path),
            InjectedFailure {
                code,
                remaining: Some(times),
            },
        );
        self
    }

    /// Directories listed so far, in call order.
    #[must_use]
    pub fn list_calls(&self) -> &[RemotePath] {
        &self.list_calls
    }

    /// Files requested so far, in call order.
    #[must_use]
    pub fn download_calls(&self) -> &[RemotePath] {
        &self.download_calls
    }

    fn insert_dir_chain(&mut self, path: RemotePath) {
        let mut current = Some(path);
        while let Some(dir) = current {
            current = dir.parent();
            self.directories.insert(dir);
        }
    }

    fn take_injected_failure(&mut self, path: &RemotePath) -> Option<u32> {
        let failure = self.failing_downloads.get_mut(path)?;
        match failure.remaining.as_mut() {
            None => Some(failure.code),
            Some(0) => None,
            Some(remaining) => {
                *remaining -= 1;
                Some(failure.code)
            }
        }
    }
}

impl RemoteStore for MemoryStore {
    fn list_directory(&mut self, path: &RemotePath) -> Result<Listing, RemoteError> {
        self.list_calls.push(path.clone());

        if self.connection_lost_at.contains(path) {
            return Err(RemoteError::connection_lost(format!(
                "control connection closed while listing {path}"
            )));
        }
        if self.denied.contains(path) || !self.directories.contains(path) {
            return Err(RemoteError::access_denied(
                path.clone(),
                "550 Permission denied",
            ));
        }

        let is_child = |candidate: &RemotePath| candidate.parent().as_ref() == Some(path);
        let mut entries: Vec<RemoteEntry> = self
            .directories
            .iter()
            .filter(|&dir| is_child(dir))
            .cloned()
            .map(RemoteEntry::directory)
            .collect();
        entries.extend(
            self.files
                .keys()
                .filter(|&file| is_child(file))
                .cloned()
                .map(RemoteEntry::file),
        );

        Ok(Listing::from_entries(path.clone(), entries))
    }

    fn download(&mut self, remote: &RemotePath, local: &Path) -> Result<u64, RemoteError> {
        self.download_calls.push(remote.clone());

        if let Some(code) = self.take_injected_failure(remote) {
            return Err(RemoteError::transfer(
                remote.clone(),
                Some(code),
                format!("{code} injected failure"),
            ));
        }
        let Some(contents) = self.files.get(remote) else {
            return Err(RemoteError::transfer(
                remote.clone(),
                Some(550),
                "550 No such file or directory",
            ));
        };
        fs::write(local, contents).map_err(|e| RemoteError::local_io(local, e))?;
        Ok(contents.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_listing_returns_direct_children_only() {
        let mut store = MemoryStore::new()
            .with_file("/a/one.sql", b"1")
            .with_file("/a/b/two.sql", b"2");
        let listing = store.list_directory(&RemotePath::new("/a")).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.subdirectories.len(), 1);
        assert_eq!(listing.subdirectories[0].path().as_str(), "/a/b");
    }

    #[test]
    fn test_denied_and_missing_directories() {
        let mut store = MemoryStore::new().deny("/locked");
        assert!(matches!(
            store.list_directory(&RemotePath::new("/locked")),
            Err(RemoteError::AccessDenied { .. })
        ));
        assert!(matches!(
            store.list_directory(&RemotePath::new("/missing")),
            Err(RemoteError::AccessDenied { .. })
        ));
        assert_eq!(store.list_calls().len(), 2);
    }

    #[test]
    fn test_fail_download_times_recovers() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("f.zip");
        let remote = RemotePath::new("/f.zip");
        let mut store = MemoryStore::new()
            .with_file("/f.zip", b"zip")
            .fail_download_times("/f.zip", 450, 1);

        assert!(store.download(&remote, &local).is_err());
        assert_eq!(store.download(&remote, &local).unwrap(), 3);
        assert_eq!(fs::read(&local).unwrap(), b"zip");
    }
}

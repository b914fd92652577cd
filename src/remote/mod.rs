//! Remote file store capability.
//!
//! The crawl engine only needs two operations from a remote host: list one
//! directory and retrieve one file. [`RemoteStore`] captures exactly that, so
//! the engine can run against a live FTP session ([`FtpStore`]) or an
//! in-memory tree ([`MemoryStore`]).
//!
//! Listing failures are returned as [`RemoteError`] values; callers decide by
//! pattern matching whether a failure skips a subtree or ends the run.

pub mod error;
pub mod ftp;
pub mod memory;
pub mod path;

use std::path::Path;

pub use error::RemoteError;
pub use ftp::{Credentials, FtpOptions, FtpStore, Target, TargetError};
pub use memory::MemoryStore;
pub use path::{RemotePath, SuffixChain};

/// One node returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    path: RemotePath,
    directory: bool,
}

impl RemoteEntry {
    #[must_use]
    pub fn file(path: RemotePath) -> Self {
        Self {
            path,
            directory: false,
        }
    }

    #[must_use]
    pub fn directory(path: RemotePath) -> Self {
        Self {
            path,
            directory: true,
        }
    }

    #[must_use]
    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Final path component; empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or("")
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.directory
    }
}

/// Contents of a single directory, split by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub directory: RemotePath,
    pub subdirectories: Vec<RemoteEntry>,
    pub files: Vec<RemoteEntry>,
}

impl Listing {
    /// Partitions entries into subdirectories and files, preserving order.
    #[must_use]
    pub fn from_entries(directory: RemotePath, entries: Vec<RemoteEntry>) -> Self {
        let (subdirectories, files) = entries.into_iter().partition(RemoteEntry::is_directory);
        Self {
            directory,
            subdirectories,
            files,
        }
    }
}

/// Blocking access to a remote file tree.
pub trait RemoteStore {
    /// Lists the direct children of `path`.
    ///
    /// # Errors
    ///
    /// [`RemoteError::AccessDenied`] when the directory cannot be entered or
    /// listed; a fatal variant when the session is gone.
    fn list_directory(&mut self, path: &RemotePath) -> Result<Listing, RemoteError>;

    /// Retrieves `remote` into the local file `local`, returning the byte count.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Transfer`] or [`RemoteError::LocalIo`] for per-file
    /// failures; a fatal variant when the session is gone.
    fn download(&mut self, remote: &RemotePath, local: &Path) -> Result<u64, RemoteError>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &mut S {
    fn list_directory(&mut self, path: &RemotePath) -> Result<Listing, RemoteError> {
        (**self).list_directory(path)
    }

    fn download(&mut self, remote: &RemotePath, local: &Path) -> Result<u64, RemoteError> {
        (**self).download(remote, local)
    }
}

//! Error types for remote store operations.
//!
//! Errors fall into two groups: fatal ones that leave the session unusable
//! ([`RemoteError::is_fatal`]) and per-node ones that callers isolate and
//! continue past.

use std::path::PathBuf;

use thiserror::Error;

use super::RemotePath;

/// Errors raised by a [`RemoteStore`](super::RemoteStore).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Host could not be resolved or the control connection could not be opened.
    #[error("cannot connect to {target}: {message}")]
    Connect {
        /// The `host:port` that was dialed.
        target: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// Login was rejected.
    #[error("login rejected for user '{user}': {message}")]
    Auth {
        /// The user name that was rejected.
        user: String,
        /// Server reply text.
        message: String,
    },

    /// Listing a directory was refused (typically FTP 550).
    #[error("access denied for {path}: {message}")]
    AccessDenied {
        /// The directory or file that was refused.
        path: RemotePath,
        /// Server reply text.
        message: String,
    },

    /// The control connection dropped or the server is shutting down.
    #[error("connection lost: {message}")]
    ConnectionLost {
        /// Description of the underlying failure.
        message: String,
    },

    /// Retrieving a file failed with a server reply.
    #[error("transfer of {path} failed: {message}")]
    Transfer {
        /// The remote file.
        path: RemotePath,
        /// FTP reply code, when the server sent one.
        code: Option<u32>,
        /// Server reply text.
        message: String,
    },

    /// Writing the retrieved bytes locally failed.
    #[error("IO error writing to {path}: {source}")]
    LocalIo {
        /// The local destination.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    /// Creates a connection error.
    pub fn connect(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn auth(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            user: user.into(),
            message: message.into(),
        }
    }

    /// Creates an access-denied error.
    pub fn access_denied(path: RemotePath, message: impl Into<String>) -> Self {
        Self::AccessDenied {
            path,
            message: message.into(),
        }
    }

    /// Creates a connection-lost error.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
        }
    }

    /// Creates a transfer error.
    pub fn transfer(path: RemotePath, code: Option<u32>, message: impl Into<String>) -> Self {
        Self::Transfer {
            path,
            code,
            message: message.into(),
        }
    }

    /// Creates a local IO error.
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the session can no longer be used and the run must end.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Auth { .. } | Self::ConnectionLost { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_variants() {
        assert!(RemoteError::connect("host:21", "refused").is_fatal());
        assert!(RemoteError::auth("anonymous", "530 Login incorrect").is_fatal());
        assert!(RemoteError::connection_lost("reset by peer").is_fatal());
    }

    #[test]
    fn test_per_node_variants_are_not_fatal() {
        let path = RemotePath::new("/a");
        assert!(!RemoteError::access_denied(path.clone(), "550").is_fatal());
        assert!(!RemoteError::transfer(path, Some(550), "no such file").is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!RemoteError::local_io("/tmp/x", io).is_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let error =
            RemoteError::access_denied(RemotePath::new("/private"), "550 Permission denied");
        let msg = error.to_string();
        assert!(msg.contains("/private"), "Expected path in: {msg}");
        assert!(msg.contains("550"), "Expected reply in: {msg}");

        let error = RemoteError::connect("10.0.0.5:21", "connection refused");
        assert!(error.to_string().contains("10.0.0.5:21"));
    }
}

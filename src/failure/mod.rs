//! Failure classification and user-facing descriptors for run-ending errors.

use ftp_crawler_core::{RemoteError, ReportError, RuleError, TargetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Auth,
    Input,
    Network,
    Local,
    Other,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Auth => "🔐",
            Self::Input => "❌",
            Self::Network => "🌐",
            Self::Local => "💾",
            Self::Other => "⚠️",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication",
            Self::Input => "Input/Config",
            Self::Network => "Network",
            Self::Local => "Local filesystem",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

const UNHANDLED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Other,
    what: "Unhandled failure",
    why: "The error did not match a known category and needs closer inspection.",
    fix: "Rerun with -v or RUST_LOG=debug and inspect the log.",
};

/// Describes an error that ended the run (typed sources first, then message-based classification).
#[must_use]
pub fn describe_error(error: &anyhow::Error) -> FailureDescriptor {
    for cause in error.chain() {
        if let Some(remote) = cause.downcast_ref::<RemoteError>() {
            return remote_descriptor(remote);
        }
        if cause.downcast_ref::<TargetError>().is_some() {
            return FailureDescriptor {
                category: FailureCategory::Input,
                what: "Target could not be parsed",
                why: "The target must be a host name, an IP address, host:port or an ftp:// URL.",
                fix: "Pass a target such as `-t 10.0.0.5`, `-t ftp.example.com:2121` or `-t ftp://host`.",
            };
        }
        if cause.downcast_ref::<RuleError>().is_some() {
            return FailureDescriptor {
                category: FailureCategory::Input,
                what: "Rule configuration is invalid",
                why: "An extension or directory entry is blank, or a glob is malformed.",
                fix: "Fix the `[rules]` table in the config file.",
            };
        }
        if cause.downcast_ref::<ReportError>().is_some() {
            return FailureDescriptor {
                category: FailureCategory::Local,
                what: "Inventory could not be written",
                why: "The output directory is not writable or the disk is full.",
                fix: "Check permissions and free space in the output directory.",
            };
        }
    }

    classify_failure(&format!("{error:#}"))
}

/// Classifies an error message string into a category and descriptor.
#[must_use]
pub fn classify_failure(error: &str) -> FailureDescriptor {
    if error.contains("config file") || error.contains("Invalid config value") {
        FailureDescriptor {
            category: FailureCategory::Input,
            what: "Configuration file rejected",
            why: "The config file is unreadable, is not valid TOML, has unknown keys or out-of-range values.",
            fix: "Fix the reported key, or pass --config with a different file.",
        }
    } else if error.contains("Invalid effective") {
        FailureDescriptor {
            category: FailureCategory::Input,
            what: "Setting out of range",
            why: "A value merged from the command line and config file is outside its allowed range.",
            fix: "Adjust the reported setting.",
        }
    } else if error.contains("output directory") {
        FailureDescriptor {
            category: FailureCategory::Local,
            what: "Output directory unavailable",
            why: "The output path exists as a file, or the directory cannot be created.",
            fix: "Choose another directory with -o or fix its permissions.",
        }
    } else {
        UNHANDLED
    }
}

fn remote_descriptor(error: &RemoteError) -> FailureDescriptor {
    match error {
        RemoteError::Connect { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "Could not connect to the FTP server",
            why: "The host did not resolve, refused the connection or did not answer within the timeout.",
            fix: "Check the target and port, then retry (raise --timeout-secs on slow links).",
        },
        RemoteError::Auth { .. } => FailureDescriptor {
            category: FailureCategory::Auth,
            what: "Login rejected",
            why: "The server refused the user name and password.",
            fix: "Pass valid credentials with -u/-p (anonymous login may be disabled).",
        },
        RemoteError::ConnectionLost { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "Connection to the FTP server was lost",
            why: "The control connection dropped or the server closed the session mid-crawl.",
            fix: "Rerun; increase --pace-max-ms if the server throttles clients.",
        },
        RemoteError::LocalIo { .. } => FailureDescriptor {
            category: FailureCategory::Local,
            what: "Local write failed",
            why: "A downloaded file could not be written to the output directory.",
            fix: "Check permissions and free space in the output directory.",
        },
        RemoteError::AccessDenied { .. } | RemoteError::Transfer { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "Remote operation failed",
            why: "The server refused the request or the transfer was interrupted.",
            fix: "Check that the remote path exists and is readable by this user.",
        },
    }
}

/// Multi-line What/Why/Fix block for stderr.
#[must_use]
pub fn render_failure(error: &anyhow::Error) -> String {
    let descriptor = describe_error(error);
    format!(
        "{} {}: {}\n  What: {error:#}\n  Why:  {}\n  Fix:  {}",
        descriptor.category.icon(),
        descriptor.category.label(),
        descriptor.what,
        descriptor.why,
        descriptor.fix
    )
}

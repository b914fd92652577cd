//! Local file naming for downloads and report artifacts.
//!
//! Downloads are flattened into one destination directory, so only the final
//! component of the remote path is used. Names that could escape that
//! directory or are meaningless on disk are refused rather than rewritten.

use std::path::{Path, PathBuf};

/// Why a remote name cannot be used as a local file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidName {
    Empty,
    DotSegment,
    Separator,
    Nul,
}

impl InvalidName {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Empty => "empty file name",
            Self::DotSegment => "file name is a dot segment",
            Self::Separator => "file name contains a path separator",
            Self::Nul => "file name contains a NUL byte",
        }
    }
}

/// Validates `name` as a single, safe path segment.
///
/// # Errors
///
/// The [`InvalidName`] reason when the name is empty, `.` or `..`, or contains
/// `/`, `\` or NUL.
pub fn validate_file_name(name: &str) -> Result<&str, InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }
    if name == "." || name == ".." {
        return Err(InvalidName::DotSegment);
    }
    if name.contains(['/', '\\']) {
        return Err(InvalidName::Separator);
    }
    if name.contains('\0') {
        return Err(InvalidName::Nul);
    }
    Ok(name)
}

/// Destination path for a flattened download.
///
/// # Errors
///
/// See [`validate_file_name`].
pub fn local_destination(destination: &Path, name: &str) -> Result<PathBuf, InvalidName> {
    validate_file_name(name).map(|name| destination.join(name))
}

/// Reduces free text to characters safe in a file name.
///
/// Runs of unsafe characters collapse into a single `_`; leading and trailing
/// underscores are dropped.
#[must_use]
pub fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\'' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

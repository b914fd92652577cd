//! Remote path value type and suffix-chain extraction.
//!
//! Remote hosts address entries with POSIX-style, slash-separated absolute
//! paths. [`RemotePath`] keeps them normalized so that equality, hashing and
//! prefix tests behave predictably across listings:
//!
//! - always starts with `/`
//! - repeated slashes are collapsed
//! - no trailing slash, except for the root itself
//!
//! Case is preserved; `.` and `..` segments are kept verbatim (the remote side
//! decides what they mean).

use std::fmt;

/// A normalized absolute path on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    /// The root of the remote tree (`/`).
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalizes a raw path string. Relative input is anchored at the root.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let mut normalized = String::with_capacity(raw.len() + 1);
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            return Self::root();
        }
        Self(normalized)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Appends a single entry name as returned by a directory listing.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self::new(name)
        } else {
            Self::new(&format!("{}/{}", self.0, name))
        }
    }

    /// Final path component, or `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Containing directory, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(index) => Some(Self(self.0[..index].to_string())),
        }
    }

    /// Suffix chain of the final component (see [`SuffixChain::from_name`]).
    #[must_use]
    pub fn suffix_chain(&self) -> SuffixChain {
        self.file_name()
            .map_or(SuffixChain::None, SuffixChain::from_name)
    }

    /// Returns true when `self` is `prefix` or nested under it.
    ///
    /// Matching respects component boundaries: `/a/b` contains `/a/b/c` but
    /// not `/a/bc`.
    #[must_use]
    pub fn is_within(&self, prefix: &RemotePath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemotePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The dot-separated suffixes of a file name, lower-cased.
///
/// Multi-part suffixes are kept whole so that `.tar.gz` is distinguishable
/// from a bare `.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixChain {
    /// No suffix at all (`README`, `.bashrc`, `trailing.`).
    None,
    /// Exactly one suffix, e.g. `.pem`.
    Single(String),
    /// Two or more suffixes joined, e.g. `.tar.gz`.
    Multi(String),
}

impl SuffixChain {
    /// Extracts the suffix chain from a bare file name.
    ///
    /// - a name ending in `.` has no suffix
    /// - leading dots are ignored, so `.bashrc` has no suffix and
    ///   `.hidden.sql` has `.sql`
    /// - every segment after the first one is a suffix
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() || name.ends_with('.') {
            return Self::None;
        }
        let stem_and_suffixes = name.trim_start_matches('.');
        let suffixes: Vec<&str> = stem_and_suffixes.split('.').skip(1).collect();

        let mut chain = String::new();
        for suffix in &suffixes {
            chain.push('.');
            chain.push_str(&suffix.to_lowercase());
        }

        match suffixes.len() {
            0 => Self::None,
            1 => Self::Single(chain),
            _ => Self::Multi(chain),
        }
    }

    /// Lower-cased chain with a leading dot, or `None`.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Single(chain) | Self::Multi(chain) => Some(chain),
        }
    }
}

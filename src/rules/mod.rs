//! Interest and exclusion rules for remote entries.
//!
//! A [`RuleSet`] is built once per run from a [`RuleConfig`] (the built-in
//! defaults, optionally overridden by the config file) and is read-only
//! afterwards. It only answers membership questions; the decision of what to
//! report or download lives in [`classifier`].

pub mod classifier;

use std::collections::HashSet;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::remote::{RemotePath, SuffixChain};

pub use classifier::{Classification, EntryClassifier, MatchRule, ReportMode};

/// Suffixes reported by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".bak", ".cftp", ".conf", ".csv", ".db", ".ini", ".jar", ".kdb", ".kdbx", ".ovpn", ".pem",
    ".ps1", ".sh", ".sql", ".sqlite", ".tar", ".tar.gz", ".tar.bzip", ".xls", ".xlsx", ".xlsm",
    ".zip",
];

/// File names downloaded (and reported) wherever they appear.
pub const DEFAULT_FILENAMES: &[&str] = &[
    "backup.zip",
    "config.php",
    "ConsoleHost_history.txt",
    "db.php",
    "flag.txt",
    "id_rsa",
    "MicrosoftEdgeCookiesBackup.dat",
    "ntuser.dat",
    "SAM",
    "SYSTEM",
    "web.config",
    "WinSCP.ini",
    "ws_ftp.ini",
];

/// File names never reported by the extension rule.
pub const DEFAULT_EXCLUDED_FILENAMES: &[&str] = &["IconCache.db", "desktop.ini"];

/// Directory subtrees that are never listed.
pub const DEFAULT_EXCLUDED_DIRECTORIES: &[&str] = &["/AppData/Local/Microsoft/local"];

/// Name patterns for cache files, consulted only when enforcement is enabled.
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &["iconcache_*", "thumbcache_*"];

/// Errors raised while building a [`RuleSet`].
#[derive(Debug, Error)]
pub enum RuleError {
    /// A name pattern is not a valid glob.
    #[error("invalid name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The compiled pattern set could not be built.
    #[error("cannot compile name patterns: {source}")]
    PatternSet {
        #[source]
        source: globset::Error,
    },

    /// An extension entry is empty or only a dot.
    #[error("extension list contains an empty entry")]
    EmptyExtension,

    /// A directory exclusion is blank; it would otherwise normalize to `/`.
    #[error("excluded directory list contains an empty entry")]
    EmptyDirectory,
}

/// Raw rule lists, as found in the `[rules]` table of the config file.
///
/// Every omitted list keeps its built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    pub extensions: Vec<String>,
    pub filenames: Vec<String>,
    pub exclude_files: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub enforce_patterns: bool,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            extensions: owned(DEFAULT_EXTENSIONS),
            filenames: owned(DEFAULT_FILENAMES),
            exclude_files: owned(DEFAULT_EXCLUDED_FILENAMES),
            exclude_dirs: owned(DEFAULT_EXCLUDED_DIRECTORIES),
            exclude_patterns: owned(DEFAULT_EXCLUDED_PATTERNS),
            enforce_patterns: false,
        }
    }
}

/// Compiled, immutable lookup tables.
#[derive(Debug, Clone)]
pub struct RuleSet {
    interesting_extensions: HashSet<String>,
    interesting_filenames: HashSet<String>,
    excluded_filenames: HashSet<String>,
    excluded_directories: Vec<RemotePath>,
    excluded_patterns: GlobSet,
    enforce_patterns: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        match Self::from_config(&RuleConfig::default()) {
            Ok(rules) => rules,
            Err(error) => {
                warn!(%error, "built-in rules failed to compile, nothing will match");
                Self::empty()
            }
        }
    }
}

impl RuleSet {
    /// Builds the lookup tables.
    ///
    /// Extensions are lower-cased and given a leading dot when missing.
    /// Name patterns are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// [`RuleError::EmptyExtension`] for a blank extension entry,
    /// [`RuleError::EmptyDirectory`] for a blank directory exclusion,
    /// [`RuleError::InvalidPattern`] for a malformed glob.
    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        let interesting_extensions = config
            .extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect::<Result<HashSet<_>, _>>()?;

        let excluded_patterns = compile_patterns(&config.exclude_patterns)?;
        let excluded_directories = config
            .exclude_dirs
            .iter()
            .map(|dir| normalize_directory(dir))
            .collect::<Result<Vec<_>, _>>()?;

        let rules = Self {
            interesting_extensions,
            interesting_filenames: config.filenames.iter().cloned().collect(),
            excluded_filenames: config.exclude_files.iter().cloned().collect(),
            excluded_directories,
            excluded_patterns,
            enforce_patterns: config.enforce_patterns,
        };

        debug!(
            extensions = rules.interesting_extensions.len(),
            filenames = rules.interesting_filenames.len(),
            excluded_files = rules.excluded_filenames.len(),
            excluded_dirs = rules.excluded_directories.len(),
            enforce_patterns = rules.enforce_patterns,
            "rule set compiled"
        );
        Ok(rules)
    }

    /// A rule set that matches nothing and excludes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            interesting_extensions: HashSet::new(),
            interesting_filenames: HashSet::new(),
            excluded_filenames: HashSet::new(),
            excluded_directories: Vec::new(),
            excluded_patterns: GlobSet::empty(),
            enforce_patterns: false,
        }
    }

    /// Whole-chain membership: `archive.tar.gz` is looked up as `.tar.gz` only.
    #[must_use]
    pub fn is_interesting_extension(&self, chain: &SuffixChain) -> bool {
        chain
            .key()
            .is_some_and(|key| self.interesting_extensions.contains(key))
    }

    /// Exact, case-sensitive.
    #[must_use]
    pub fn is_interesting_filename(&self, name: &str) -> bool {
        self.interesting_filenames.contains(name)
    }

    /// Exact, case-sensitive.
    #[must_use]
    pub fn is_excluded_filename(&self, name: &str) -> bool {
        self.excluded_filenames.contains(name)
    }

    /// True when `dir` is, or is nested under, an excluded prefix.
    #[must_use]
    pub fn is_excluded_directory(&self, dir: &RemotePath) -> bool {
        self.excluded_directories
            .iter()
            .any(|prefix| dir.is_within(prefix))
    }

    #[must_use]
    pub fn matches_excluded_pattern(&self, name: &str) -> bool {
        self.excluded_patterns.is_match(name)
    }

    #[must_use]
    pub fn name_patterns_enforced(&self) -> bool {
        self.enforce_patterns
    }
}

fn normalize_extension(raw: &str) -> Result<String, RuleError> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(RuleError::EmptyExtension);
    }
    Ok(format!(".{}", trimmed.to_lowercase()))
}

fn normalize_directory(raw: &str) -> Result<RemotePath, RuleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RuleError::EmptyDirectory);
    }
    Ok(RemotePath::new(trimmed))
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, RuleError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| RuleError::PatternSet { source })
}

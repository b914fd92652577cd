//! Per-entry report/download decision.

use std::fmt;

use super::RuleSet;
use crate::remote::RemoteEntry;

/// Marker contained in Windows thumbnail cache names; never reported by suffix.
const THUMBNAIL_CACHE_MARKER: &str = "thumbcache_";

/// Which files end up in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Only files selected by the rules.
    #[default]
    Matches,
    /// Every file seen.
    AllFiles,
}

/// The rule that selected an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Exact name is in the interesting-filename list.
    Filename,
    /// Report mode is [`ReportMode::AllFiles`].
    AllFiles,
    /// Suffix chain is in the interesting-extension list.
    Extension(String),
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filename => f.write_str("filename"),
            Self::AllFiles => f.write_str("all-files"),
            Self::Extension(chain) => write!(f, "extension {chain}"),
        }
    }
}

/// Outcome of classifying one entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub should_report: bool,
    pub should_download: bool,
    /// Which rule fired; `None` when nothing matched.
    pub rule: Option<MatchRule>,
}

impl Classification {
    /// Whether the entry belongs in the match list.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.should_report || self.should_download
    }
}

/// Applies a [`RuleSet`] to remote entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryClassifier<'a> {
    rules: &'a RuleSet,
    mode: ReportMode,
}

impl<'a> EntryClassifier<'a> {
    #[must_use]
    pub fn new(rules: &'a RuleSet, mode: ReportMode) -> Self {
        Self { rules, mode }
    }

    /// Classifies a single entry. Directories never match.
    ///
    /// A filename-rule hit always sets `should_download`, which forces the
    /// entry into the match list even when an exclusion suppresses reporting.
    #[must_use]
    pub fn classify(&self, entry: &RemoteEntry) -> Classification {
        if entry.is_directory() {
            return Classification::default();
        }
        let name = entry.name();
        let should_download = self.rules.is_interesting_filename(name);

        let extension_hit = if self.mode == ReportMode::AllFiles {
            None
        } else {
            self.extension_hit(entry)
        };
        let should_report = self.mode == ReportMode::AllFiles || extension_hit.is_some();

        let rule = if should_download {
            Some(MatchRule::Filename)
        } else if self.mode == ReportMode::AllFiles {
            Some(MatchRule::AllFiles)
        } else {
            extension_hit.map(MatchRule::Extension)
        };

        Classification {
            should_report,
            should_download,
            rule,
        }
    }

    /// Suffix chain key when the extension rule reports this entry.
    fn extension_hit(&self, entry: &RemoteEntry) -> Option<String> {
        let name = entry.name();
        let chain = entry.path().suffix_chain();
        if !self.rules.is_interesting_extension(&chain)
            || self.rules.is_excluded_filename(name)
            || name.contains(THUMBNAIL_CACHE_MARKER)
        {
            return None;
        }
        if self.rules.name_patterns_enforced() && self.rules.matches_excluded_pattern(name) {
            return None;
        }
        chain.key().map(str::to_string)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::RemotePath;
    use crate::rules::RuleConfig;

    fn file(path: &str) -> RemoteEntry {
        RemoteEntry::file(RemotePath::new(path))
    }

    fn rules_with(extensions: &[&str], filenames: &[&str]) -> RuleSet {
        let config = RuleConfig {
            extensions: extensions.iter().map(|s| (*s).to_string()).collect(),
            filenames: filenames.iter().map(|s| (*s).to_string()).collect(),
            ..RuleConfig::default()
        };
        RuleSet::from_config(&config).unwrap()
    }

    // ==================== Extension rule ====================

    #[test]
    fn test_interesting_extension_is_reported_not_downloaded() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/a/secret.pem"));
        assert!(result.should_report);
        assert!(!result.should_download);
        assert!(result.is_match());
        assert_eq!(result.rule, Some(MatchRule::Extension(".pem".to_string())));
    }

    #[test]
    fn test_uninteresting_file_is_not_matched() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/a/notes.txt"));
        assert!(!result.is_match());
        assert_eq!(result.rule, None);
    }

    #[test]
    fn test_thumbnail_cache_never_reported_by_extension() {
        let rules = rules_with(&[".pem", ".db"], &[]);
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        assert!(!classifier.classify(&file("/a/thumbcache_1.db")).is_match());
        assert!(!classifier.classify(&file("/a/x_thumbcache_idx.db")).is_match());
    }

    #[test]
    fn test_excluded_filename_suppresses_report() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        assert!(!classifier.classify(&file("/Users/x/IconCache.db")).is_match());
        assert!(!classifier.classify(&file("/desktop.ini")).is_match());
        assert!(classifier.classify(&file("/other.ini")).should_report);
    }

    #[test]
    fn test_multi_suffix_uses_whole_chain() {
        let rules = rules_with(&[".gz"], &[]);
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        assert!(!classifier.classify(&file("/archive.tar.gz")).is_match());
        assert!(classifier.classify(&file("/archive.gz")).is_match());

        let rules = rules_with(&[".tar.gz"], &[]);
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        assert!(classifier.classify(&file("/archive.tar.gz")).is_match());
        assert!(!classifier.classify(&file("/archive.gz")).is_match());
    }

    // ==================== Filename rule ====================

    #[test]
    fn test_interesting_filename_is_downloaded_and_matched() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/home/user/.ssh/id_rsa"));
        assert!(result.should_download);
        assert!(result.is_match());
        assert_eq!(result.rule, Some(MatchRule::Filename));
    }

    #[test]
    fn test_filename_rule_overrides_exclusions() {
        let config = RuleConfig {
            filenames: vec!["desktop.ini".to_string()],
            ..RuleConfig::default()
        };
        let rules = RuleSet::from_config(&config).unwrap();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/desktop.ini"));
        assert!(!result.should_report);
        assert!(result.should_download);
        assert!(result.is_match());
    }

    #[test]
    fn test_filename_and_extension_both_fire() {
        let rules = RuleSet::default();
        // backup.zip is both an interesting name and an interesting suffix
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/backup.zip"));
        assert!(result.should_report);
        assert!(result.should_download);
        assert_eq!(result.rule, Some(MatchRule::Filename));
    }

    // ==================== Patterns ====================

    #[test]
    fn test_patterns_ignored_unless_enforced() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/IconCache_1.db"));
        assert!(result.should_report);

        let config = RuleConfig {
            enforce_patterns: true,
            ..RuleConfig::default()
        };
        let rules = RuleSet::from_config(&config).unwrap();
        let classifier = EntryClassifier::new(&rules, ReportMode::Matches);
        let result = classifier.classify(&file("/IconCache_1.db"));
        assert!(!result.should_report);
    }

    // ==================== Modes ====================

    #[test]
    fn test_all_files_mode_reports_everything() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::AllFiles);
        let result = classifier.classify(&file("/notes.txt"));
        assert!(result.should_report);
        assert!(!result.should_download);
        assert_eq!(result.rule, Some(MatchRule::AllFiles));
        assert!(classifier.classify(&file("/thumbcache_1.db")).should_report);
    }

    #[test]
    fn test_directories_never_match() {
        let rules = RuleSet::default();
        let classifier = EntryClassifier::new(&rules, ReportMode::AllFiles);
        let result = classifier.classify(&RemoteEntry::directory(RemotePath::new("/id_rsa")));
        assert_eq!(result, Classification::default());
    }

    #[test]
    fn test_match_rule_display() {
        assert_eq!(MatchRule::Filename.to_string(), "filename");
        assert_eq!(MatchRule::Extension(".sql".into()).to_string(), "extension .sql");
    }
}

//! Depth-first traversal of a remote tree.
//!
//! The walker lists directories through a [`RemoteStore`], hands each listing
//! to a [`DirectoryVisitor`] exactly once and then descends, pre-order, in
//! listing order. A directory that cannot be listed is reported to the visitor
//! and skipped; only errors that end the session stop the walk.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use super::events::SkipReason;
use crate::download::Pacer;
use crate::remote::{Listing, RemoteError, RemotePath, RemoteStore};
use crate::rules::RuleSet;

/// Receives each listed directory from [`TreeWalker::walk`].
///
/// The visitor gets the store back so it can act on the listing (for example
/// download files) before the walk descends.
pub trait DirectoryVisitor<S: ?Sized> {
    /// Called once per successfully listed directory.
    ///
    /// # Errors
    ///
    /// Any error aborts the walk and is returned from [`TreeWalker::walk`].
    fn visit(&mut self, store: &mut S, listing: &Listing) -> Result<(), RemoteError>;

    /// Called for a directory that was not listed or not descended into.
    fn skipped(&mut self, _dir: &RemotePath, _reason: &SkipReason) {}
}

/// Totals for one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories listed and handed to the visitor.
    pub visited: usize,
    /// Directories skipped because of an excluded prefix.
    pub excluded: usize,
    /// Directories whose listing failed.
    pub unreadable: usize,
    /// Files seen across all listings.
    pub files_seen: usize,
}

/// Walks a remote tree, honoring excluded directory prefixes.
#[derive(Debug, Clone)]
pub struct TreeWalker<'a> {
    rules: &'a RuleSet,
    pacer: Pacer,
}

impl<'a> TreeWalker<'a> {
    #[must_use]
    pub fn new(rules: &'a RuleSet, pacer: Pacer) -> Self {
        Self { rules, pacer }
    }

    /// Walks from `root`, depth-first and pre-order.
    ///
    /// # Errors
    ///
    /// Fatal listing errors ([`RemoteError::is_fatal`]) and any error returned
    /// by the visitor.
    #[instrument(skip(self, store, visitor), fields(root = %root))]
    pub fn walk<S, V>(
        &self,
        store: &mut S,
        root: &RemotePath,
        visitor: &mut V,
    ) -> Result<WalkStats, RemoteError>
    where
        S: RemoteStore + ?Sized,
        V: DirectoryVisitor<S> + ?Sized,
    {
        let mut stats = WalkStats::default();
        let mut listed: HashSet<RemotePath> = HashSet::new();
        let mut stack = vec![root.clone()];

        while let Some(dir) = stack.pop() {
            if self.rules.is_excluded_directory(&dir) {
                debug!(dir = %dir, "directory excluded");
                stats.excluded += 1;
                visitor.skipped(&dir, &SkipReason::Excluded);
                continue;
            }
            if !listed.insert(dir.clone()) {
                debug!(dir = %dir, "directory already listed");
                continue;
            }

            match store.list_directory(&dir) {
                Ok(listing) => {
                    stats.visited += 1;
                    stats.files_seen += listing.files.len();
                    debug!(
                        dir = %dir,
                        files = listing.files.len(),
                        subdirectories = listing.subdirectories.len(),
                        "directory listed"
                    );

                    visitor.visit(store, &listing)?;
                    self.pacer.pause();

                    // Reversed so the first listed subdirectory is popped first.
                    stack.extend(
                        listing
                            .subdirectories
                            .iter()
                            .rev()
                            .map(|entry| entry.path().clone()),
                    );
                }
                Err(error) if error.is_fatal() => {
                    warn!(dir = %dir, error = %error, "walk aborted");
                    return Err(error);
                }
                Err(error) => {
                    stats.unreadable += 1;
                    let reason = match error {
                        RemoteError::AccessDenied { message, .. } => {
                            SkipReason::AccessDenied(message)
                        }
                        other => SkipReason::ListingFailed(other.to_string()),
                    };
                    warn!(dir = %dir, reason = %reason, "skipping directory");
                    visitor.skipped(&dir, &reason);
                    self.pacer.pause();
                }
            }
        }

        info!(
            visited = stats.visited,
            excluded = stats.excluded,
            unreadable = stats.unreadable,
            files = stats.files_seen,
            "walk complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::remote::MemoryStore;
    use crate::rules::RuleConfig;

    #[derive(Default)]
    struct Recorder {
        visited: Vec<String>,
        skipped: Vec<(String, SkipReason)>,
    }

    impl<S: ?Sized> DirectoryVisitor<S> for Recorder {
        fn visit(&mut self, _store: &mut S, listing: &Listing) -> Result<(), RemoteError> {
            self.visited.push(listing.directory.to_string());
            Ok(())
        }

        fn skipped(&mut self, dir: &RemotePath, reason: &SkipReason) {
            self.skipped.push((dir.to_string(), reason.clone()));
        }
    }

    fn walk(
        store: &mut MemoryStore,
        rules: &RuleSet,
    ) -> (Result<WalkStats, RemoteError>, Recorder) {
        let mut recorder = Recorder::default();
        let walker = TreeWalker::new(rules, Pacer::disabled());
        let result = walker.walk(store, &RemotePath::root(), &mut recorder);
        (result, recorder)
    }

    #[test]
    fn test_walk_is_depth_first_pre_order() {
        let mut store = MemoryStore::new()
            .with_dir("/a/x")
            .with_dir("/a/y")
            .with_dir("/b");
        let (result, recorder) = walk(&mut store, &RuleSet::empty());

        assert_eq!(recorder.visited, ["/", "/a", "/a/x", "/a/y", "/b"]);
        assert_eq!(result.unwrap().visited, 5);
    }

    #[test]
    fn test_excluded_prefix_is_never_listed() {
        let mut store = MemoryStore::new()
            .with_file("/AppData/Local/Microsoft/local/cache.db", b"x")
            .with_file("/AppData/Local/Microsoft/local/deep/er.db", b"x")
            .with_dir("/AppData/Local/Microsoft/localized");
        let (result, recorder) = walk(&mut store, &RuleSet::default());

        let stats = result.unwrap();
        assert_eq!(stats.excluded, 1);
        assert!(
            store
                .list_calls()
                .iter()
                .all(|dir| !dir.is_within(&RemotePath::new("/AppData/Local/Microsoft/local")))
        );
        assert!(recorder.visited.contains(&"/AppData/Local/Microsoft/localized".to_string()));
        assert_eq!(
            recorder.skipped,
            [(
                "/AppData/Local/Microsoft/local".to_string(),
                SkipReason::Excluded
            )]
        );
    }

    #[test]
    fn test_excluded_root_lists_nothing() {
        let config = RuleConfig {
            exclude_dirs: vec!["/".to_string()],
            ..RuleConfig::default()
        };
        let rules = RuleSet::from_config(&config).unwrap();
        let mut store = MemoryStore::new().with_dir("/a");
        let (result, recorder) = walk(&mut store, &rules);

        assert_eq!(result.unwrap().visited, 0);
        assert!(store.list_calls().is_empty());
        assert!(recorder.visited.is_empty());
    }

    #[test]
    fn test_denied_directory_does_not_stop_siblings() {
        let mut store = MemoryStore::new()
            .deny("/a")
            .with_dir("/a/hidden")
            .with_dir("/b");
        let (result, recorder) = walk(&mut store, &RuleSet::empty());

        let stats = result.unwrap();
        assert_eq!(stats.unreadable, 1);
        assert_eq!(recorder.visited, ["/", "/b"]);
        assert!(matches!(
            recorder.skipped.as_slice(),
            [(dir, SkipReason::AccessDenied(_))] if dir == "/a"
        ));
    }

    #[test]
    fn test_connection_loss_aborts_walk() {
        let mut store = MemoryStore::new()
            .lose_connection_at("/a")
            .with_dir("/b");
        let (result, recorder) = walk(&mut store, &RuleSet::empty());

        assert!(matches!(result, Err(RemoteError::ConnectionLost { .. })));
        assert_eq!(recorder.visited, ["/"]);
    }

    #[test]
    fn test_visitor_error_aborts_walk() {
        struct Failing;
        impl DirectoryVisitor<MemoryStore> for Failing {
            fn visit(&mut self, _: &mut MemoryStore, _: &Listing) -> Result<(), RemoteError> {
                Err(RemoteError::connection_lost("visitor gave up"))
            }
        }

        let mut store = MemoryStore::new().with_dir("/a");
        let result = TreeWalker::new(&RuleSet::empty(), Pacer::disabled()).walk(
            &mut store,
            &RemotePath::root(),
            &mut Failing,
        );
        assert!(result.is_err());
        assert_eq!(store.list_calls().len(), 1);
    }

    #[test]
    fn test_files_seen_counts_every_listing() {
        let mut store = MemoryStore::new()
            .with_file("/one.txt", b"")
            .with_file("/a/two.txt", b"")
            .with_file("/a/three.txt", b"");
        let (result, _) = walk(&mut store, &RuleSet::empty());
        assert_eq!(result.unwrap().files_seen, 3);
    }

    #[test]
    fn test_pacing_after_visits_and_error_skips() {
        let pacer = Pacer::new(Duration::from_millis(5));
        let mut store = MemoryStore::new().deny("/a").with_dir("/b");
        let rules = RuleSet::empty();
        let mut recorder = Recorder::default();

        TreeWalker::new(&rules, pacer.clone())
            .walk(&mut store, &RemotePath::root(), &mut recorder)
            .unwrap();

        // "/" and "/b" visited, "/a" denied
        assert_eq!(pacer.pauses(), 3);
    }
}

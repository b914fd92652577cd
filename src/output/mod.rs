//! CLI output formatting and display helpers.

use std::path::Path;

use ftp_crawler_core::{CrawlSummary, DownloadOutcome, RemotePath};

/// Summary lines printed after a crawl.
pub(crate) fn crawl_summary_lines(summary: &CrawlSummary, inventory: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!(
        "Crawled {} directories ({} skipped), {} files seen",
        summary.walk.visited,
        summary.walk.excluded + summary.walk.unreadable,
        summary.walk.files_seen
    )];

    let downloads = &summary.downloads;
    let mut download_line = format!("Downloaded {} file(s)", downloads.completed());
    if downloads.failed() > 0 {
        download_line.push_str(&format!(", {} failed", downloads.failed()));
    }
    if downloads.retried() > 0 {
        download_line.push_str(&format!(", {} retries", downloads.retried()));
    }
    lines.push(download_line);

    match inventory {
        Some(path) => lines.push(format!(
            "Found {} matching file(s); inventory written to {}",
            summary.matches.len(),
            path.display()
        )),
        None => lines.push("No matching files found; no inventory written".to_string()),
    }
    lines
}

pub(crate) fn print_crawl_summary(summary: &CrawlSummary, inventory: Option<&Path>) {
    for line in crawl_summary_lines(summary, inventory) {
        println!("{line}");
    }
}

/// One-line result of single-file mode.
pub(crate) fn fetch_summary_line(remote: &RemotePath, outcome: &DownloadOutcome) -> String {
    match outcome {
        DownloadOutcome::Downloaded { local, bytes, .. } => {
            format!("Downloaded {remote} to {} ({bytes} bytes)", local.display())
        }
        DownloadOutcome::Failed { error, attempts } => {
            format!("Failed to download {remote} after {attempts} attempt(s): {error}")
        }
        DownloadOutcome::Skipped(reason) => format!("Did not download {remote}: {reason}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use ftp_crawler_core::{
        CrawlSettings, DownloadSkip, MemoryStore, NoopEvents, Pacer, RemoteError, RuleSet, crawl,
    };
    use tempfile::TempDir;

    use super::*;

    fn summary_for(store: &mut MemoryStore, temp: &TempDir) -> CrawlSummary {
        let settings = CrawlSettings {
            pacer: Pacer::disabled(),
            ..CrawlSettings::new(temp.path())
        };
        crawl(store, &RuleSet::default(), settings, &mut NoopEvents).unwrap()
    }

    #[test]
    fn test_crawl_summary_names_inventory() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new()
            .with_file("/db/dump.sql", b"")
            .with_file("/id_rsa", b"k");
        let summary = summary_for(&mut store, &temp);
        let inventory = PathBuf::from("saved/FTP_Files_listing_h_20240101.txt");

        let lines = crawl_summary_lines(&summary, Some(&inventory));
        assert_eq!(lines[0], "Crawled 2 directories (0 skipped), 2 files seen");
        assert_eq!(lines[1], "Downloaded 1 file(s)");
        assert!(lines[2].contains("Found 2 matching file(s)"));
        assert!(lines[2].ends_with("FTP_Files_listing_h_20240101.txt"));
    }

    #[test]
    fn test_crawl_summary_without_matches() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new().with_file("/readme.txt", b"");
        let summary = summary_for(&mut store, &temp);

        let lines = crawl_summary_lines(&summary, None);
        assert_eq!(lines[2], "No matching files found; no inventory written");
    }

    #[test]
    fn test_fetch_summary_line_variants() {
        let remote = RemotePath::new("/etc/shadow");
        let ok = DownloadOutcome::Downloaded {
            local: PathBuf::from("saved/shadow"),
            bytes: 12,
            attempts: 1,
        };
        assert_eq!(
            fetch_summary_line(&remote, &ok),
            "Downloaded /etc/shadow to saved/shadow (12 bytes)"
        );

        let failed = DownloadOutcome::Failed {
            error: RemoteError::transfer(remote.clone(), Some(550), "Permission denied"),
            attempts: 2,
        };
        assert!(
            fetch_summary_line(&remote, &failed)
                .starts_with("Failed to download /etc/shadow after 2")
        );

        let skipped = DownloadOutcome::Skipped(DownloadSkip::AlreadyAttempted);
        assert_eq!(
            fetch_summary_line(&remote, &skipped),
            "Did not download /etc/shadow: already attempted"
        );
    }
}

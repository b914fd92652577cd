use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ftp_crawler_core::report::{listing_file_name, today, write_listing};
use ftp_crawler_core::{
    CrawlSettings, Credentials, DownloadOrchestrator, FtpOptions, FtpStore, Pacer,
    RemotePath, ReportMode, RetryPolicy, Target, crawl,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::progress_manager::ConsoleEvents;
use crate::app::{config_manager, config_runtime, exit_handler, terminal};
use crate::cli::Args;
use crate::output;

pub(crate) fn run_crawler() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();
    let resolved = config_manager::resolve_config(args, &cli_sources)?;
    let args = resolved.args;

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let profile = terminal::TerminalProfile::detect();
    terminal::init_tracing(default_level, force_cli_log_level, profile);

    debug!(
        config = ?resolved.config_path,
        verbosity = config_runtime::verbosity_label(args.verbose, args.quiet, args.debug),
        "configuration resolved"
    );

    prepare_output_dir(&args.output_dir)?;
    let target = Target::parse(&args.target, args.port)?;
    info!(%target, user = %args.user, "FTP crawler starting");

    let pacer = pacer_from_args(&args);
    if pacer.is_disabled() {
        warn!("pacing disabled, requests will be sent back to back");
    }
    let retry_policy = RetryPolicy::with_max_retries(u32::from(args.max_retries));

    let mut events = ConsoleEvents::new(profile.use_spinner(args.quiet), args.quiet);

    let credentials = Credentials::new(args.user.as_str(), args.password.as_str());
    let options = FtpOptions {
        include_hidden: !args.no_hidden,
        timeout: Duration::from_secs(args.timeout_secs),
    };
    let mut store = match FtpStore::connect(&target, &credentials, &options) {
        Ok(store) => store,
        Err(error) => {
            events.finish();
            return Err(error.into());
        }
    };

    if let Some(remote) = args.download_file.as_deref() {
        let remote = RemotePath::new(remote);
        let mut orchestrator = DownloadOrchestrator::new(&args.output_dir, retry_policy, pacer);
        let result = orchestrator.fetch(&mut store, &remote);
        store.quit();
        events.finish();

        let outcome = result?;
        println!("{}", output::fetch_summary_line(&remote, &outcome));
        return Ok(exit_handler::determine_fetch_outcome(&outcome));
    }

    let settings = CrawlSettings {
        mode: if args.all_files {
            ReportMode::AllFiles
        } else {
            ReportMode::Matches
        },
        retry_policy,
        pacer,
        ..CrawlSettings::new(&args.output_dir)
    };
    let result = crawl(&mut store, &resolved.rules, settings, &mut events);
    store.quit();
    events.finish();
    let summary = result?;
    debug!(confirmed_downloads = events.downloaded(), "crawl finished");

    let inventory_path = args
        .output_dir
        .join(listing_file_name(&target.label(), today()));
    let inventory = write_listing(summary.matches.all(), &inventory_path)?
        .then_some(inventory_path.as_path());

    if !args.quiet {
        output::print_crawl_summary(&summary, inventory);
    }
    Ok(ProcessExit::Success)
}

fn pacer_from_args(args: &Args) -> Pacer {
    Pacer::new(Duration::from_millis(args.pace_max_ms))
}

/// Creates the destination directory when absent.
fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        bail!(
            "Failed to create output directory '{}': path exists and is not a directory",
            dir.display()
        );
    }
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
        info!(dir = %dir.display(), "Created output directory");
    }
    Ok(())
}

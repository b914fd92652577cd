use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which settings were given explicitly on the command line; those win over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) port: bool,
    pub(crate) user: bool,
    pub(crate) pace_max_ms: bool,
    pub(crate) max_retries: bool,
    pub(crate) no_hidden: bool,
    pub(crate) timeout_secs: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
    pub(crate) debug: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, sources_from_matches(&matches))
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        port: is_commandline_value(matches, "port"),
        user: is_commandline_value(matches, "user"),
        pace_max_ms: is_commandline_value(matches, "pace_max_ms"),
        max_retries: is_commandline_value(matches, "max_retries"),
        no_hidden: is_commandline_value(matches, "no_hidden"),
        timeout_secs: is_commandline_value(matches, "timeout_secs"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
        debug: is_commandline_value(matches, "debug"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.output_dir
            && let Some(output_dir) = &file_config.output_dir
        {
            args.output_dir.clone_from(output_dir);
        }

        if !cli_sources.port
            && let Some(port) = file_config.port
        {
            args.port = port;
        }

        if !cli_sources.user
            && let Some(user) = &file_config.user
        {
            args.user.clone_from(user);
        }

        if !cli_sources.pace_max_ms
            && let Some(pace_max_ms) = file_config.pace_max_ms
        {
            args.pace_max_ms = pace_max_ms;
        }

        if !cli_sources.max_retries
            && let Some(max_retries) = file_config.max_retries
        {
            args.max_retries = max_retries;
        }

        if !cli_sources.no_hidden
            && let Some(include_hidden) = file_config.include_hidden
        {
            args.no_hidden = !include_hidden;
        }

        if !cli_sources.timeout_secs
            && let Some(timeout_secs) = file_config.timeout_secs
        {
            args.timeout_secs = timeout_secs;
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && !cli_sources.debug
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if args.port == 0 {
        bail!("Invalid effective port value: 0. Expected range: 1..=65535");
    }
    if args.pace_max_ms > 60_000 {
        bail!(
            "Invalid effective pace_max_ms value: {}. Expected range: 0..=60000",
            args.pace_max_ms
        );
    }
    if args.max_retries > 10 {
        bail!(
            "Invalid effective max_retries value: {}. Expected range: 0..=10",
            args.max_retries
        );
    }
    if !(1..=3600).contains(&args.timeout_secs) {
        bail!(
            "Invalid effective timeout_secs value: {}. Expected range: 1..=3600",
            args.timeout_secs
        );
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.debug = false;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.debug = false;
            args.verbose = 1;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.debug = false;
            args.verbose = 0;
        }
        VerbositySetting::Debug => {
            args.quiet = false;
            args.debug = true;
            args.verbose = 0;
        }
    }
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else if args.debug {
        "debug"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet || cli_sources.debug
}

pub(crate) fn verbosity_label(verbose: u8, quiet: bool, debug: bool) -> &'static str {
    if debug {
        VerbositySetting::Debug.as_str()
    } else if quiet {
        VerbositySetting::Quiet.as_str()
    } else if verbose == 0 {
        VerbositySetting::Default.as_str()
    } else if verbose == 1 {
        VerbositySetting::Verbose.as_str()
    } else {
        VerbositySetting::Debug.as_str()
    }
}

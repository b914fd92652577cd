//! Configuration lifecycle: load file config, merge CLI, build the rule set.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ftp_crawler_core::RuleSet;

use crate::app::config_runtime::{self, CliValueSources};
use crate::app_config::{LoadedConfig, load_default_file_config, load_explicit_file_config};
use crate::cli::Args;

/// Effective settings for one run.
#[derive(Debug)]
pub(crate) struct ResolvedConfig {
    pub(crate) args: Args,
    pub(crate) rules: RuleSet,
    /// Config file that was read, if any.
    pub(crate) config_path: Option<PathBuf>,
}

/// Loads the config file (explicit `--config` or the default location), merges
/// CLI overrides and compiles the rules.
pub(crate) fn resolve_config(args: Args, cli_sources: &CliValueSources) -> Result<ResolvedConfig> {
    let loaded = match args.config.as_deref() {
        Some(path) => load_explicit_file_config(path)?,
        None => load_default_file_config()?,
    };
    let LoadedConfig {
        path,
        config,
        loaded_from_file,
    } = loaded;

    let args = config_runtime::apply_config_defaults(args, cli_sources, config.as_ref())?;

    let rules = match config.as_ref().and_then(|cfg| cfg.rules.as_ref()) {
        Some(rule_config) => {
            RuleSet::from_config(rule_config).context("Invalid `[rules]` table in config file")?
        }
        None => RuleSet::default(),
    };

    Ok(ResolvedConfig {
        args,
        rules,
        config_path: path.filter(|_| loaded_from_file),
    })
}

//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use ftp_crawler_core::RuleConfig;
use ftp_crawler_core::download::MAX_RETRIES_LIMIT;

const CONFIG_DIR_NAME: &str = "ftp-crawler";
const CONFIG_FILE_NAME: &str = "config.toml";

/// TOML-backed file configuration for crawler defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default directory for downloads and the inventory.
    pub output_dir: Option<PathBuf>,
    /// Control port used when the target has none.
    pub port: Option<u16>,
    /// Login user.
    pub user: Option<String>,
    /// Upper bound of the pacing pause in milliseconds.
    pub pace_max_ms: Option<u64>,
    /// Extra attempts for transient download failures.
    pub max_retries: Option<u8>,
    /// Request hidden entries when listing.
    pub include_hidden: Option<bool>,
    /// Connect and read timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub verbosity: Option<VerbositySetting>,
    /// Rule overrides; each omitted list keeps its built-in default.
    pub rules: Option<RuleConfig>,
}

impl FileConfig {
    /// Validates config values against the CLI ranges.
    pub fn validate(&self) -> Result<()> {
        if self.port == Some(0) {
            bail!("Invalid config value for `port`: 0. Expected range: 1..=65535");
        }

        if let Some(pace_max_ms) = self.pace_max_ms
            && pace_max_ms > 60_000
        {
            bail!("Invalid config value for `pace_max_ms`: {pace_max_ms}. Expected range: 0..=60000");
        }

        if let Some(max_retries) = self.max_retries
            && u32::from(max_retries) > MAX_RETRIES_LIMIT
        {
            bail!(
                "Invalid config value for `max_retries`: {max_retries}. Expected range: 0..={MAX_RETRIES_LIMIT}"
            );
        }

        if let Some(timeout_secs) = self.timeout_secs
            && !(1..=3600).contains(&timeout_secs)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout_secs}. Expected range: 1..=3600");
        }

        if let Some(user) = &self.user
            && user.trim().is_empty()
        {
            bail!("Invalid config value for `user`: must not be empty");
        }

        Ok(())
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ftp-crawler/config.toml`
/// 2. `$HOME/.config/ftp-crawler/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Loads an explicitly requested config file; a missing file is an error.
pub fn load_explicit_file_config(path: &Path) -> Result<LoadedConfig> {
    let config = load_file_config(path)?;
    Ok(LoadedConfig {
        path: Some(path.to_path_buf()),
        config: Some(config),
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

//! Stderr capabilities and the tracing subscriber for a crawl run.

use std::ffi::OsString;
use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Target of the FTP client's own `log` records.
const FTP_CLIENT_TARGET: &str = "suppaftp";

/// What stderr can render for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TerminalProfile {
    /// Stderr is a terminal that can redraw a spinner line.
    pub(crate) interactive: bool,
    /// ANSI colors are allowed in log lines.
    pub(crate) ansi: bool,
}

impl TerminalProfile {
    pub(crate) fn detect() -> Self {
        Self::from_parts(
            io::stderr().is_terminal(),
            std::env::var_os("NO_COLOR"),
            std::env::var_os("TERM"),
        )
    }

    /// An empty `NO_COLOR` does not count; `TERM=dumb` disables both.
    fn from_parts(
        stderr_is_terminal: bool,
        no_color: Option<OsString>,
        term: Option<OsString>,
    ) -> Self {
        let dumb = term.is_some_and(|value| value.eq_ignore_ascii_case("dumb"));
        let no_color = no_color.is_some_and(|value| !value.is_empty());
        Self {
            interactive: stderr_is_terminal && !dumb,
            ansi: !no_color && !dumb,
        }
    }

    /// The progress spinner needs an interactive stderr and a non-quiet run.
    pub(crate) fn use_spinner(self, quiet: bool) -> bool {
        self.interactive && !quiet
    }
}

/// Filter directives for a crawl at `level`.
///
/// The FTP client logs every command it sends; that chatter stays at `info`
/// until `trace` is requested so `-v` shows crawl decisions, not the protocol.
pub(crate) fn crawl_directives(level: &str) -> String {
    if level == "debug" {
        format!("{level},{FTP_CLIENT_TARGET}=info")
    } else {
        level.to_string()
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins unless a verbosity flag was given.
pub(crate) fn init_tracing(default_level: &str, force_cli_level: bool, profile: TerminalProfile) {
    let directives = crawl_directives(default_level);
    let filter = if force_cli_level {
        EnvFilter::new(&directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives))
    };
    let installed = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(profile.ansi)
        .with_env_filter(filter)
        .try_init();
    if let Err(error) = installed {
        // Fails only when a global subscriber is already set.
        tracing::debug!(%error, "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(terminal: bool, no_color: Option<&str>, term: Option<&str>) -> TerminalProfile {
        TerminalProfile::from_parts(
            terminal,
            no_color.map(OsString::from),
            term.map(OsString::from),
        )
    }

    #[test]
    fn test_profile_plain_terminal() {
        let p = profile(true, None, Some("xterm-256color"));
        assert!(p.interactive);
        assert!(p.ansi);
    }

    #[test]
    fn test_profile_no_color_keeps_spinner() {
        let p = profile(true, Some("1"), None);
        assert!(!p.ansi);
        assert!(p.use_spinner(false));
    }

    #[test]
    fn test_profile_empty_no_color_is_ignored() {
        assert!(profile(true, Some(""), None).ansi);
    }

    #[test]
    fn test_profile_dumb_terminal_disables_spinner_and_color() {
        let p = profile(true, None, Some("DUMB"));
        assert!(!p.interactive);
        assert!(!p.ansi);
        assert!(!p.use_spinner(false));
    }

    #[test]
    fn test_spinner_needs_terminal_and_non_quiet_run() {
        assert!(!profile(false, None, None).use_spinner(false));
        assert!(!profile(true, None, None).use_spinner(true));
    }

    #[test]
    fn test_crawl_directives_quiet_ftp_client_at_debug() {
        assert_eq!(crawl_directives("debug"), "debug,suppaftp=info");
        assert_eq!(crawl_directives("trace"), "trace");
        assert_eq!(crawl_directives("warn"), "warn");
        assert!(EnvFilter::try_new(crawl_directives("debug")).is_ok());
    }
}

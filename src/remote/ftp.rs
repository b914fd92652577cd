//! FTP implementation of [`RemoteStore`] on top of a blocking `suppaftp` session.
//!
//! # Reply mapping
//!
//! | Reply / failure | Error |
//! |-----------------|-------|
//! | socket error | [`RemoteError::ConnectionLost`] |
//! | 421 service closing | [`RemoteError::ConnectionLost`] |
//! | 530 not logged in | [`RemoteError::Auth`] |
//! | 550 on CWD/LIST | [`RemoteError::AccessDenied`] |
//! | anything else | [`RemoteError::Transfer`] with the reply code |

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use suppaftp::list::File as ListLine;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::{Host, Url};

use super::{Listing, RemoteEntry, RemoteError, RemotePath, RemoteStore};

/// Default FTP control port.
pub const DEFAULT_PORT: u16 = 21;

/// Default user name and password for anonymous access.
pub const ANONYMOUS: &str = "anonymous";

/// Default connect/read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const REPLY_SERVICE_CLOSING: u32 = 421;
const REPLY_NOT_LOGGED_IN: u32 = 530;
const REPLY_FILE_UNAVAILABLE: u32 = 550;

/// Suffix of a download still in flight; renamed away once the server confirms it.
const PARTIAL_SUFFIX: &str = ".part";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Errors parsing a target specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,

    #[error("invalid target '{raw}': {message}")]
    Invalid { raw: String, message: String },

    #[error("unsupported scheme '{scheme}' in target '{raw}' (only ftp:// is supported)")]
    UnsupportedScheme { raw: String, scheme: String },
}

/// Host and port of the FTP server to crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Parses `host`, `host:port` or `ftp://host[:port][/path]`.
    ///
    /// A port given in the target wins over `default_port`.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] for empty input, a non-ftp scheme, or an
    /// unparseable host.
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("ftp://{trimmed}")
        };
        let url = Url::parse(&candidate).map_err(|e| TargetError::Invalid {
            raw: trimmed.to_string(),
            message: e.to_string(),
        })?;

        if url.scheme() != "ftp" {
            return Err(TargetError::UnsupportedScheme {
                raw: trimmed.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => {
                return Err(TargetError::Invalid {
                    raw: trimmed.to_string(),
                    message: "missing host".to_string(),
                });
            }
        };

        Ok(Self {
            host,
            port: url.port().unwrap_or(default_port),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Identifier used when naming output artifacts.
    #[must_use]
    pub fn label(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}_{}", self.host, self.port)
        }
    }

    fn resolve(&self) -> Result<SocketAddr, RemoteError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| RemoteError::connect(self.address(), e.to_string()))?
            .next()
            .ok_or_else(|| RemoteError::connect(self.address(), "host resolved to no addresses"))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Username/password pair passed through to the server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(ANONYMOUS, ANONYMOUS)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session options.
#[derive(Debug, Clone)]
pub struct FtpOptions {
    /// Request hidden entries with `LIST -a` (falls back to plain `LIST`).
    pub include_hidden: bool,
    /// Connect and read timeout.
    pub timeout: Duration,
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            include_hidden: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A logged-in FTP session.
pub struct FtpStore {
    stream: FtpStream,
    include_hidden: bool,
    user: String,
}

impl fmt::Debug for FtpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpStore")
            .field("include_hidden", &self.include_hidden)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl FtpStore {
    /// Opens the control connection, logs in and switches to binary transfers.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Connect`] when the host cannot be reached,
    /// [`RemoteError::Auth`] when the login is rejected.
    #[instrument(skip(credentials, options), fields(target = %target, user = credentials.user()))]
    pub fn connect(
        target: &Target,
        credentials: &Credentials,
        options: &FtpOptions,
    ) -> Result<Self, RemoteError> {
        let address = target.resolve()?;
        debug!(%address, "dialing");

        let mut stream = FtpStream::connect_timeout(address, options.timeout)
            .map_err(|e| RemoteError::connect(target.address(), e.to_string()))?;
        if let Err(e) = stream.get_ref().set_read_timeout(Some(options.timeout)) {
            debug!(error = %e, "could not set read timeout");
        }

        stream
            .login(credentials.user(), credentials.password())
            .map_err(|e| match e {
                FtpError::ConnectionError(io) => RemoteError::connection_lost(io.to_string()),
                other => RemoteError::auth(credentials.user(), other.to_string()),
            })?;

        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| map_session_error(e, credentials.user()))?;

        info!("connected to FTP server");
        Ok(Self {
            stream,
            include_hidden: options.include_hidden,
            user: credentials.user().to_string(),
        })
    }

    /// Ends the session. Errors are ignored; the run is over either way.
    pub fn quit(mut self) {
        if let Err(e) = self.stream.quit() {
            debug!(error = %e, "QUIT failed");
        }
    }

    fn list_lines(&mut self, path: &RemotePath) -> Result<Vec<String>, RemoteError> {
        let stream = &mut self.stream;
        let user = self.user.as_str();
        list_with_fallback(self.include_hidden, path, |flag| {
            stream.list(flag).map_err(|e| map_listing_error(e, path, user))
        })
    }
}

impl RemoteStore for FtpStore {
    #[instrument(level = "debug", skip(self), fields(path = %path))]
    fn list_directory(&mut self, path: &RemotePath) -> Result<Listing, RemoteError> {
        if let Err(e) = self.stream.cwd(path.as_str()) {
            return Err(map_listing_error(e, path, &self.user));
        }
        let lines = self.list_lines(path)?;
        let entries = entries_from_lines(path, &lines);

        debug!(entries = entries.len(), "listed directory");
        Ok(Listing::from_entries(path.clone(), entries))
    }

    /// Streams the data connection into `<local>.part` and renames it over
    /// `local` once the server confirms the transfer; a failed transfer
    /// leaves `local` untouched.
    #[instrument(level = "debug", skip(self), fields(remote = %remote, local = %local.display()))]
    fn download(&mut self, remote: &RemotePath, local: &Path) -> Result<u64, RemoteError> {
        let partial = partial_path(local);
        let mut data = match self.stream.retr_as_stream(remote.as_str()) {
            Ok(data) => data,
            Err(e) => return Err(map_transfer_error(e, remote, &self.user)),
        };
        let copied = copy_to_file(&mut data, &partial);
        let finalized = self.stream.finalize_retr_stream(data);

        let result = match (copied, finalized) {
            (Err(CopyError::Local(e)), _) => Err(RemoteError::local_io(&partial, e)),
            (Err(CopyError::Remote(e)), _) => Err(RemoteError::connection_lost(e.to_string())),
            (Ok(_), Err(e)) => Err(map_transfer_error(e, remote, &self.user)),
            (Ok(bytes), Ok(())) => fs::rename(&partial, local)
                .map(|()| bytes)
                .map_err(|e| RemoteError::local_io(local, e)),
        };
        if result.is_err() {
            discard_partial(&partial);
        }
        result
    }
}

/// Requests `LIST -a` when hidden entries are wanted and falls back to plain
/// `LIST` when the server rejects the flag. Fatal errors are not retried.
fn list_with_fallback<F>(
    include_hidden: bool,
    path: &RemotePath,
    mut list: F,
) -> Result<Vec<String>, RemoteError>
where
    F: FnMut(Option<&str>) -> Result<Vec<String>, RemoteError>,
{
    if include_hidden {
        match list(Some("-a")) {
            Ok(lines) => return Ok(lines),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!(%path, error = %e, "LIST -a rejected, retrying plain LIST"),
        }
    }
    list(None)
}

/// Turns raw `LIST` lines (UNIX or DOS/IIS format) into children of `parent`.
///
/// `.` and `..` are dropped, unparseable lines (such as `total 12`) are
/// skipped, and symbolic links become files: links are never followed, so a
/// link back to an ancestor cannot loop the walk.
fn entries_from_lines(parent: &RemotePath, lines: &[String]) -> Vec<RemoteEntry> {
    let mut entries = Vec::with_capacity(lines.len());
    for line in lines {
        let Ok(parsed) = line.parse::<ListLine>() else {
            debug!(line = %line, "skipping unparseable listing line");
            continue;
        };
        let name = parsed.name().rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }
        let child = parent.join(name);
        if parsed.is_directory() {
            entries.push(RemoteEntry::directory(child));
        } else {
            entries.push(RemoteEntry::file(child));
        }
    }
    entries
}

#[derive(Debug)]
enum CopyError {
    /// Reading the data connection failed.
    Remote(io::Error),
    /// Creating or writing the local file failed.
    Local(io::Error),
}

fn partial_path(local: &Path) -> PathBuf {
    let mut name = OsString::from(local.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Copies `reader` into a fresh file at `path` in fixed-size chunks.
fn copy_to_file<R: Read>(reader: &mut R, path: &Path) -> Result<u64, CopyError> {
    let mut writer = BufWriter::new(File::create(path).map_err(CopyError::Local)?);
    let mut buffer = vec![0_u8; COPY_BUFFER_SIZE];
    let mut total = 0_u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Remote(e)),
        };
        writer.write_all(&buffer[..read]).map_err(CopyError::Local)?;
        total += read as u64;
    }
    writer.flush().map_err(CopyError::Local)?;
    Ok(total)
}

fn discard_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %partial.display(), error = %e, "could not remove partial download");
    }
}

fn reply_of(err: &FtpError) -> Option<(u32, String)> {
    match err {
        FtpError::UnexpectedResponse(response) => Some((
            response.status.code(),
            String::from_utf8_lossy(&response.body).trim().to_string(),
        )),
        _ => None,
    }
}

fn map_listing_error(err: FtpError, path: &RemotePath, user: &str) -> RemoteError {
    match reply_of(&err) {
        Some((REPLY_FILE_UNAVAILABLE, text)) => RemoteError::access_denied(path.clone(), text),
        Some((code, text)) => map_reply(code, text, path, user),
        None => map_non_reply(err, path),
    }
}

fn map_transfer_error(err: FtpError, path: &RemotePath, user: &str) -> RemoteError {
    match reply_of(&err) {
        Some((code, text)) => map_reply(code, text, path, user),
        None => map_non_reply(err, path),
    }
}

/// Maps an FTP reply code for an operation on `path`.
pub(crate) fn map_reply(code: u32, text: String, path: &RemotePath, user: &str) -> RemoteError {
    match code {
        REPLY_SERVICE_CLOSING => RemoteError::connection_lost(format!("{code} {text}")),
        REPLY_NOT_LOGGED_IN => RemoteError::auth(user, format!("{code} {text}")),
        _ => RemoteError::transfer(path.clone(), Some(code), format!("{code} {text}")),
    }
}

fn map_non_reply(err: FtpError, path: &RemotePath) -> RemoteError {
    match err {
        FtpError::ConnectionError(io) => RemoteError::connection_lost(io.to_string()),
        other => {
            warn!(%path, error = %other, "unexpected FTP failure");
            RemoteError::transfer(path.clone(), None, other.to_string())
        }
    }
}

fn map_session_error(err: FtpError, user: &str) -> RemoteError {
    map_transfer_error(err, &RemotePath::root(), user)
}

//! Constants used throughout the mirror core crate.
//!
//! Environment variable names and their defaults live here so the binaries and the
//! configuration parser agree on them.

/// FTP server hostname.
pub const ENV_HOST: &str = "FTP_MIRROR_HOST";
/// FTP control port.
pub const ENV_PORT: &str = "FTP_MIRROR_PORT";
/// Remote directory to mirror.
pub const ENV_REMOTE_PATH: &str = "FTP_MIRROR_REMOTE_PATH";
/// Local staging directory.
pub const ENV_STAGING_DIR: &str = "FTP_MIRROR_STAGING_DIR";
/// Local replica ("internal network") directory.
pub const ENV_REPLICA_DIR: &str = "FTP_MIRROR_REPLICA_DIR";
/// Daily wall-clock run time, `HH:MM` or `HH:MM:SS`.
pub const ENV_RUN_AT: &str = "FTP_MIRROR_RUN_AT";
/// Seconds between scheduler polls.
pub const ENV_POLL_SECS: &str = "FTP_MIRROR_POLL_SECS";
/// Seconds allowed for the TCP connect.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "FTP_MIRROR_CONNECT_TIMEOUT_SECS";
/// Log file path; an empty value disables the file sink.
pub const ENV_LOG_FILE: &str = "FTP_MIRROR_LOG_FILE";
/// Run once immediately before waiting for the first scheduled time.
pub const ENV_RUN_ON_START: &str = "FTP_MIRROR_RUN_ON_START";

pub const DEFAULT_HOST: &str = "ftp.us.debian.org";
pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_REMOTE_PATH: &str = "debian";
pub const DEFAULT_STAGING_DIR: &str = "ftp_test_storage";
pub const DEFAULT_REPLICA_DIR: &str = "internal_network";
pub const DEFAULT_RUN_AT: &str = "14:00";
pub const DEFAULT_POLL_SECS: u64 = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "ftp_download.log";

/// Username sent for anonymous FTP login.
pub const ANONYMOUS_USER: &str = "anonymous";
/// Password sent for anonymous FTP login (conventionally an email-like token).
pub const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Default `tracing` directives applied on top of `RUST_LOG`.
pub const DEFAULT_LOG_DIRECTIVES: &[&str] = &[
    "mirror_core=info",
    "mirror_files=info",
    "mirror_cli=info",
    "ftp_mirror_run=info",
];

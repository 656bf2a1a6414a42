//! Mirror runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the worker and the
//! trigger. Nothing below the binaries reads process-wide environment variables; parsing goes
//! through a lookup function so tests can supply values without touching the environment.

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_LOG_FILE, DEFAULT_POLL_SECS, DEFAULT_PORT,
    DEFAULT_REMOTE_PATH, DEFAULT_REPLICA_DIR, DEFAULT_RUN_AT, DEFAULT_STAGING_DIR,
    ENV_CONNECT_TIMEOUT_SECS, ENV_HOST, ENV_LOG_FILE, ENV_POLL_SECS, ENV_PORT, ENV_REMOTE_PATH,
    ENV_REPLICA_DIR, ENV_RUN_AT, ENV_RUN_ON_START, ENV_STAGING_DIR,
};
use crate::remote::RemoteEndpoint;
use crate::{MirrorError, MirrorResult};
use chrono::NaiveTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mirror configuration resolved at startup.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MirrorConfig {
    endpoint: RemoteEndpoint,
    staging_dir: PathBuf,
    replica_dir: PathBuf,
    run_at: NaiveTime,
    poll_interval_secs: u64,
    connect_timeout_secs: u64,
    log_file: Option<PathBuf>,
    run_on_start: bool,
}

impl MirrorConfig {
    /// Create a new `MirrorConfig` with default scheduling and logging settings.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidInput` if the staging and replica directories are the same
    /// path (copying a file onto itself would truncate it).
    pub fn new(
        endpoint: RemoteEndpoint,
        staging_dir: PathBuf,
        replica_dir: PathBuf,
    ) -> MirrorResult<Self> {
        if staging_dir.as_os_str().is_empty() || replica_dir.as_os_str().is_empty() {
            return Err(MirrorError::InvalidInput(
                "staging and replica directories cannot be empty".into(),
            ));
        }

        if staging_dir == replica_dir {
            return Err(MirrorError::InvalidInput(format!(
                "staging and replica directories must differ (both are {})",
                staging_dir.display()
            )));
        }

        Ok(Self {
            endpoint,
            staging_dir,
            replica_dir,
            run_at: run_at_from_env_value(None)?,
            poll_interval_secs: DEFAULT_POLL_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            run_on_start: false,
        })
    }

    /// Resolve the full configuration from a variable lookup (normally the process environment).
    ///
    /// Every variable is optional; see [`crate::constants`] for names and defaults.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError` if any present value fails to parse or validate.
    pub fn from_lookup<F>(lookup: F) -> MirrorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_blank(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.into());
        let remote_path = non_blank(ENV_REMOTE_PATH).unwrap_or_else(|| DEFAULT_REMOTE_PATH.into());
        let endpoint =
            RemoteEndpoint::new(host, remote_path)?.with_port(port_from_env_value(lookup(ENV_PORT))?)?;

        let staging_dir = non_blank(ENV_STAGING_DIR).unwrap_or_else(|| DEFAULT_STAGING_DIR.into());
        let replica_dir = non_blank(ENV_REPLICA_DIR).unwrap_or_else(|| DEFAULT_REPLICA_DIR.into());

        let mut cfg = Self::new(endpoint, staging_dir.into(), replica_dir.into())?;
        cfg.run_at = run_at_from_env_value(lookup(ENV_RUN_AT))?;
        cfg.poll_interval_secs =
            secs_from_env_value(ENV_POLL_SECS, lookup(ENV_POLL_SECS), DEFAULT_POLL_SECS)?;
        cfg.connect_timeout_secs = secs_from_env_value(
            ENV_CONNECT_TIMEOUT_SECS,
            lookup(ENV_CONNECT_TIMEOUT_SECS),
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;
        cfg.log_file = log_file_from_env_value(lookup(ENV_LOG_FILE));
        cfg.run_on_start = bool_from_env_value(ENV_RUN_ON_START, lookup(ENV_RUN_ON_START))?;

        Ok(cfg)
    }

    /// Resolve the configuration from the process environment.
    ///
    /// Call this once at startup, after `dotenvy::dotenv()`.
    pub fn from_env() -> MirrorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn replica_dir(&self) -> &Path {
        &self.replica_dir
    }

    pub fn run_at(&self) -> NaiveTime {
        self.run_at
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn run_on_start(&self) -> bool {
        self.run_on_start
    }

    /// Returns a copy with a different endpoint, keeping everything else.
    pub fn with_endpoint(mut self, endpoint: RemoteEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Returns a copy with different local directories.
    ///
    /// # Errors
    ///
    /// Same validation as [`MirrorConfig::new`].
    pub fn with_directories(self, staging_dir: PathBuf, replica_dir: PathBuf) -> MirrorResult<Self> {
        let checked = Self::new(self.endpoint.clone(), staging_dir, replica_dir)?;
        Ok(Self {
            staging_dir: checked.staging_dir,
            replica_dir: checked.replica_dir,
            ..self
        })
    }
}

/// Parse the daily run time from an optional `HH:MM` or `HH:MM:SS` value.
///
/// If `value` is `None` or empty/whitespace, returns the default (`14:00`).
pub fn run_at_from_env_value(value: Option<String>) -> MirrorResult<NaiveTime> {
    let raw = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_RUN_AT.into());

    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(|_| {
            MirrorError::InvalidInput(format!(
                "{} must be HH:MM or HH:MM:SS, got '{}'",
                ENV_RUN_AT, raw
            ))
        })
}

/// Parse the FTP control port from an optional value, defaulting to 21.
pub fn port_from_env_value(value: Option<String>) -> MirrorResult<u16> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_PORT),
        Some(v) => match v.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(MirrorError::InvalidInput(format!(
                "{} must be a port number between 1 and 65535, got '{}'",
                ENV_PORT, v
            ))),
        },
    }
}

/// Parse a positive number of seconds for `name`, falling back to `default`.
pub fn secs_from_env_value(name: &str, value: Option<String>, default: u64) -> MirrorResult<u64> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(MirrorError::InvalidInput(format!(
                "{} must be a positive number of seconds, got '{}'",
                name, v
            ))),
        },
    }
}

/// Resolve the log file path. Unset means the default file; set-but-empty disables it.
pub fn log_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    match value {
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(PathBuf::from(v.trim())),
    }
}

/// Parse a boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`), defaulting to `false`.
pub fn bool_from_env_value(name: &str, value: Option<String>) -> MirrorResult<bool> {
    let Some(raw) = value.map(|v| v.trim().to_ascii_lowercase()) else {
        return Ok(false);
    };

    match raw.as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        _ => Err(MirrorError::InvalidInput(format!(
            "{} must be true or false, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_original_deployment() {
        let cfg = MirrorConfig::from_lookup(|_| None).unwrap();

        assert_eq!(cfg.endpoint().host(), "ftp.us.debian.org");
        assert_eq!(cfg.endpoint().port(), 21);
        assert_eq!(cfg.endpoint().remote_path(), "debian");
        assert_eq!(cfg.staging_dir(), Path::new("ftp_test_storage"));
        assert_eq!(cfg.replica_dir(), Path::new("internal_network"));
        assert_eq!(cfg.run_at(), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.log_file(), Some(Path::new("ftp_download.log")));
        assert!(!cfg.run_on_start());
    }

    #[test]
    fn test_lookup_overrides() {
        let cfg = MirrorConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "mirror.local"),
            (ENV_PORT, "2121"),
            (ENV_REMOTE_PATH, "/pub/releases"),
            (ENV_STAGING_DIR, "/var/spool/mirror"),
            (ENV_REPLICA_DIR, "/mnt/internal"),
            (ENV_RUN_AT, "02:30:15"),
            (ENV_POLL_SECS, "5"),
            (ENV_CONNECT_TIMEOUT_SECS, "10"),
            (ENV_LOG_FILE, ""),
            (ENV_RUN_ON_START, "yes"),
        ]))
        .unwrap();

        assert_eq!(cfg.endpoint().to_string(), "ftp://mirror.local:2121//pub/releases");
        assert_eq!(cfg.staging_dir(), Path::new("/var/spool/mirror"));
        assert_eq!(cfg.replica_dir(), Path::new("/mnt/internal"));
        assert_eq!(cfg.run_at(), NaiveTime::from_hms_opt(2, 30, 15).unwrap());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.log_file(), None);
        assert!(cfg.run_on_start());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = MirrorConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "  "),
            (ENV_PORT, ""),
            (ENV_RUN_AT, " "),
        ]))
        .unwrap();

        assert_eq!(cfg.endpoint().host(), DEFAULT_HOST);
        assert_eq!(cfg.endpoint().port(), DEFAULT_PORT);
        assert_eq!(cfg.run_at(), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn test_same_staging_and_replica_rejected() {
        let result = MirrorConfig::from_lookup(lookup_from(&[
            (ENV_STAGING_DIR, "shared"),
            (ENV_REPLICA_DIR, "shared"),
        ]));

        assert!(matches!(result, Err(MirrorError::InvalidInput(_))));
    }

    #[test]
    fn test_run_at_parsing() {
        assert_eq!(
            run_at_from_env_value(Some("9:05".into())).unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap()
        );
        assert!(run_at_from_env_value(Some("25:00".into())).is_err());
        assert!(run_at_from_env_value(Some("2pm".into())).is_err());
    }

    #[test]
    fn test_port_parsing() {
        assert_eq!(port_from_env_value(None).unwrap(), 21);
        assert_eq!(port_from_env_value(Some(" 990 ".into())).unwrap(), 990);
        assert!(port_from_env_value(Some("0".into())).is_err());
        assert!(port_from_env_value(Some("70000".into())).is_err());
        assert!(port_from_env_value(Some("ftp".into())).is_err());
    }

    #[test]
    fn test_secs_parsing() {
        assert_eq!(secs_from_env_value("X", None, 7).unwrap(), 7);
        assert_eq!(secs_from_env_value("X", Some("3".into()), 7).unwrap(), 3);
        assert!(secs_from_env_value("X", Some("0".into()), 7).is_err());
        assert!(secs_from_env_value("X", Some("-1".into()), 7).is_err());
    }

    #[test]
    fn test_bool_parsing() {
        assert!(!bool_from_env_value("X", None).unwrap());
        assert!(bool_from_env_value("X", Some("TRUE".into())).unwrap());
        assert!(!bool_from_env_value("X", Some("0".into())).unwrap());
        assert!(bool_from_env_value("X", Some("maybe".into())).is_err());
    }

    #[test]
    fn test_with_directories_revalidates() {
        let cfg = MirrorConfig::from_lookup(|_| None).unwrap();

        let moved = cfg
            .clone()
            .with_directories("a".into(), "b".into())
            .unwrap();
        assert_eq!(moved.staging_dir(), Path::new("a"));
        assert_eq!(moved.run_at(), cfg.run_at());

        assert!(cfg.with_directories("same".into(), "same".into()).is_err());
    }

    #[test]
    fn test_config_serialises_to_yaml() {
        let cfg = MirrorConfig::from_lookup(|_| None).unwrap();
        let yaml = serde_yaml::to_string(&cfg).unwrap();

        assert!(yaml.contains("host: ftp.us.debian.org"));
        assert!(yaml.contains("run_at: 14:00:00") || yaml.contains("run_at: '14:00:00'"));
        assert!(yaml.contains("staging_dir: ftp_test_storage"));
    }
}

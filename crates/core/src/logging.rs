//! Process-wide `tracing` setup for the mirror binaries.
//!
//! Events go to stdout and, optionally, to an append-mode log file without ANSI colours.
//! Library code only emits events; installing the subscriber is left to `main`.

use crate::constants::DEFAULT_LOG_DIRECTIVES;
use crate::{MirrorError, MirrorResult};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` first, then the workspace crates at `info`.
pub fn env_filter() -> MirrorResult<EnvFilter> {
    DEFAULT_LOG_DIRECTIVES
        .iter()
        .try_fold(EnvFilter::from_default_env(), |filter, directive| -> MirrorResult<EnvFilter> {
            let parsed = directive
                .parse::<Directive>()
                .map_err(|e| MirrorError::LogSetup(format!("bad directive {directive}: {e}")))?;
            Ok(filter.add_directive(parsed))
        })
}

/// Install the global subscriber.
///
/// # Arguments
///
/// * `log_file` - Optional file to append log lines to, alongside the console output
///
/// # Errors
///
/// Returns `MirrorError` if the log file cannot be opened or a subscriber is already installed.
pub fn init_tracing(log_file: Option<&Path>) -> MirrorResult<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| MirrorError::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| MirrorError::LogSetup(e.to_string()))
}

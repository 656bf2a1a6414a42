//! # Mirror Core
//!
//! Core logic for the scheduled FTP mirror.
//!
//! This crate contains the download-then-replicate workflow and everything it needs:
//! - Startup configuration ([`config`]) resolved once from the environment
//! - The remote collaborator ([`remote`]): anonymous FTP via `suppaftp`, behind a trait
//! - The worker ([`worker`]) that lists, downloads into staging and copies into the replica
//! - The daily trigger ([`schedule`])
//! - `tracing` subscriber setup for the binaries ([`logging`])
//!
//! **No CLI concerns**: argument parsing and process wiring belong in `mirror-cli` and the
//! `ftp-mirror-run` binary.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod remote;
pub mod schedule;
pub mod worker;

pub use config::MirrorConfig;
pub use error::{MirrorError, MirrorResult};
pub use remote::{Connector, FtpConnector, RemoteEndpoint, RemoteSession};
pub use schedule::{DailySchedule, Scheduler};
pub use worker::{RunReport, RunSummary};

use std::sync::Arc;

/// Runs mirror passes for one resolved configuration.
#[derive(Clone, Debug)]
pub struct MirrorService<C = FtpConnector> {
    cfg: Arc<MirrorConfig>,
    connector: C,
}

impl MirrorService {
    /// Creates a service that talks to a real FTP server using the configured connect timeout.
    pub fn new(cfg: Arc<MirrorConfig>) -> Self {
        let connector = FtpConnector::new(cfg.connect_timeout());
        Self { cfg, connector }
    }
}

impl<C: Connector> MirrorService<C> {
    /// Creates a service with a custom connector.
    pub fn with_connector(cfg: Arc<MirrorConfig>, connector: C) -> Self {
        Self { cfg, connector }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.cfg
    }

    /// Performs one full download-and-replicate pass and logs its summary.
    ///
    /// # Returns
    ///
    /// The [`RunReport`] for the pass. This never fails; errors are inside the report.
    pub fn run_once(&self) -> RunReport {
        tracing::info!("starting mirror run from {}", self.cfg.endpoint());
        let report = worker::run(
            &self.connector,
            self.cfg.endpoint(),
            self.cfg.staging_dir(),
            self.cfg.replica_dir(),
        );
        tracing::info!("mirror run finished: {}", report.summary());
        report
    }

    /// The daily trigger for this configuration, on the system clock.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::system(
            DailySchedule::new(self.cfg.run_at()),
            self.cfg.poll_interval(),
        )
    }
}

//! Transfer-and-replicate worker.
//!
//! One call to [`run`] performs a complete mirror pass:
//!
//! 1. connect, log in and change into the remote directory (abort the run on failure)
//! 2. list the remote directory
//! 3. make sure the staging directory exists
//! 4. download every listed name into staging, one file at a time
//! 5. close the connection
//! 6. make sure the replica directory exists
//! 7. copy every listed name from staging into the replica directory
//!
//! Per-file failures in steps 4 and 7 are logged and skipped. Nothing is retried, and nothing
//! is returned as an error: the outcome is described by the [`RunReport`].
//!
//! Downloads go through a randomly named part file that is renamed into place only when the
//! transfer completes. A failed transfer leaves its truncated part file in staging, while the staged
//! name keeps whatever the previous run left there (or stays absent), so the copy phase never
//! publishes a truncated file.

use crate::remote::{Connector, RemoteEndpoint, RemoteSession};
use crate::{MirrorError, MirrorResult};
use mirror_files::{DirStatus, FileName, LocalDirectory};
use std::fmt;
use std::path::Path;

/// Outcome of one file in the download or copy phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    /// Bytes written on success, error text on failure.
    pub result: Result<u64, String>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything that happened during one [`run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub listing: Vec<String>,
    pub staging: Option<DirStatus>,
    pub replica: Option<DirStatus>,
    pub downloads: Vec<FileOutcome>,
    pub copies: Vec<FileOutcome>,
    /// Set when a setup error ended the run (or its replicate phase) early.
    pub aborted: Option<String>,
}

/// Counts derived from a [`RunReport`], suitable for a single log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub downloaded: usize,
    pub download_failures: usize,
    pub copied: usize,
    pub copy_failures: usize,
    pub aborted: bool,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let ok = |outcomes: &[FileOutcome]| outcomes.iter().filter(|o| o.is_ok()).count();
        let downloaded = ok(&self.downloads);
        let copied = ok(&self.copies);

        RunSummary {
            listed: self.listing.len(),
            downloaded,
            download_failures: self.downloads.len() - downloaded,
            copied,
            copy_failures: self.copies.len() - copied,
            aborted: self.aborted.is_some(),
        }
    }

    /// Names whose download failed, in listing order.
    pub fn failed_downloads(&self) -> Vec<&str> {
        failed_names(&self.downloads)
    }

    /// Names whose copy into the replica directory failed, in listing order.
    pub fn failed_copies(&self) -> Vec<&str> {
        failed_names(&self.copies)
    }
}

fn failed_names(outcomes: &[FileOutcome]) -> Vec<&str> {
    outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.name.as_str())
        .collect()
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.aborted {
            write!(f, "aborted; ")?;
        }
        write!(
            f,
            "{} listed, {} downloaded ({} failed), {} copied ({} failed)",
            self.listed, self.downloaded, self.download_failures, self.copied, self.copy_failures
        )
    }
}

/// Run one full mirror pass.
///
/// # Arguments
///
/// * `connector` - Opens the remote session (FTP in production)
/// * `endpoint` - Remote host, port and directory
/// * `staging_dir` - Where downloads land; created if missing
/// * `replica_dir` - Where staged files are copied; created if missing
///
/// # Returns
///
/// A [`RunReport`]. Errors are logged and recorded in the report, never returned.
pub fn run<C: Connector>(
    connector: &C,
    endpoint: &RemoteEndpoint,
    staging_dir: &Path,
    replica_dir: &Path,
) -> RunReport {
    let mut report = RunReport::default();

    let staging = match download_phase(connector, endpoint, staging_dir, &mut report) {
        Ok(staging) => staging,
        Err(e) => {
            tracing::error!("FTP connection error: {}", e);
            report.aborted = Some(e.to_string());
            return report;
        }
    };

    if let Err(e) = replicate_phase(&staging, replica_dir, &mut report) {
        tracing::error!("Error copying files to internal network: {}", e);
        report.aborted = Some(e.to_string());
    }

    report
}

fn download_phase<C: Connector>(
    connector: &C,
    endpoint: &RemoteEndpoint,
    staging_dir: &Path,
    report: &mut RunReport,
) -> MirrorResult<LocalDirectory> {
    let mut session = connector.connect(endpoint)?;

    let listing = match session.list() {
        Ok(listing) => listing,
        Err(e) => {
            close_session(session);
            return Err(e);
        }
    };
    report.listing = listing;

    let staging = match LocalDirectory::ensure(staging_dir) {
        Ok((staging, status)) => {
            match status {
                DirStatus::Created => tracing::info!("Creating local directory"),
                DirStatus::AlreadyExisted => tracing::info!("Local directory already exists"),
            }
            report.staging = Some(status);
            staging
        }
        Err(e) => {
            close_session(session);
            return Err(MirrorError::StagingDir(e));
        }
    };

    if report.listing.is_empty() {
        tracing::info!("File list is empty");
    } else {
        tracing::info!("Files to be downloaded are {:?}", report.listing);
        for name in &report.listing {
            tracing::info!("Downloading {}", name);
            let result = download_one(&mut session, &staging, name);
            match &result {
                Ok(bytes) => {
                    tracing::info!("File '{}' downloaded successfully. ({} bytes)", name, bytes)
                }
                Err(e) => tracing::error!("Error downloading '{}': {}", name, e),
            }
            report.downloads.push(FileOutcome {
                name: name.clone(),
                result: result.map_err(|e| e.to_string()),
            });
        }
    }

    close_session(session);
    Ok(staging)
}

fn download_one<S: RemoteSession>(
    session: &mut S,
    staging: &LocalDirectory,
    name: &str,
) -> MirrorResult<u64> {
    let file_name = FileName::new(name)?;
    let mut staged = staging.begin_write(&file_name)?;
    session.retrieve(name, &mut staged)?;
    Ok(staged.commit()?)
}

fn close_session<S: RemoteSession>(session: S) {
    if let Err(e) = session.quit() {
        tracing::warn!("{}", e);
    }
}

fn replicate_phase(
    staging: &LocalDirectory,
    replica_dir: &Path,
    report: &mut RunReport,
) -> MirrorResult<()> {
    let (replica, status) = LocalDirectory::ensure(replica_dir).map_err(MirrorError::ReplicaDir)?;
    match status {
        DirStatus::Created => tracing::info!("Creating network directory"),
        DirStatus::AlreadyExisted => tracing::info!("Network directory already exists"),
    }
    report.replica = Some(status);

    for name in &report.listing {
        let result = copy_one(staging, &replica, name);
        match &result {
            Ok(_) => tracing::info!("File '{}' copied to internal network successfully.", name),
            Err(e) => tracing::error!("Error copying '{}': {}", name, e),
        }
        report.copies.push(FileOutcome {
            name: name.clone(),
            result: result.map_err(|e| e.to_string()),
        });
    }

    Ok(())
}

fn copy_one(staging: &LocalDirectory, replica: &LocalDirectory, name: &str) -> MirrorResult<u64> {
    let file_name = FileName::new(name)?;
    Ok(staging.copy_to(&file_name, replica)?)
}

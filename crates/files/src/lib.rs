//! Mirror File Storage
//!
//! This crate manages the two local locations the mirror writes to:
//!
//! - the **staging** directory, where remote files are streamed as they download
//! - the **replica** directory, which stands in for a location on an internal network
//!
//! ## Design Principles
//!
//! - Directories are created on demand and never cleaned up
//! - Every write stays inside its directory: names are [`FileName`] values, never paths
//! - Existing files are overwritten, so repeated runs converge on the same content
//! - Nothing is locked; the filesystem owns the directories, not this crate
//!
//! ```text
//! <staging>/            <replica>/
//! ├── README      ──►   ├── README
//! └── ls-lR.gz    ──►   └── ls-lR.gz
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use mirror_files::{DirStatus, FileName, LocalDirectory};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (staging, status) = LocalDirectory::ensure(Path::new("ftp_test_storage"))?;
//! if status == DirStatus::Created {
//!     println!("created {}", staging.path().display());
//! }
//!
//! let (replica, _) = LocalDirectory::ensure(Path::new("internal_network"))?;
//! staging.copy_to(&FileName::new("README")?, &replica)?;
//! # Ok(())
//! # }
//! ```

mod files;

pub use files::{DirStatus, LocalDirectory, StagedWrite};
pub use mirror_types::FileName;

/// Errors that can occur during local file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Path exists but cannot be used as a directory
    #[error("Invalid directory: {0}")]
    InvalidDirectory(String),

    /// Directory could not be created
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is missing from the directory
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

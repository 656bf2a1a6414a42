//! Local directory service implementation
//!
//! This module provides [`LocalDirectory`], a handle on one existing directory that the mirror
//! writes files into. The staging and replica directories are both represented by it; the only
//! difference between them is which role the caller gives them.
//!
//! # Security Model
//!
//! - Files are addressed by [`FileName`], which cannot contain separators or `..`
//! - A handle can only be constructed for a path that is (or has just been made) a directory
//! - Copies go from one handle to another, never to arbitrary paths
//!
//! # Implementation Notes
//!
//! - Handles are cheap and hold only the path
//! - No I/O is cached; every call goes to the filesystem
//! - `LocalDirectory` implements `Debug` and `Clone`

use crate::{FileName, FilesError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-progress downloads, which are also prefixed with `.`.
const PART_SUFFIX: &str = ".part";

/// Whether [`LocalDirectory::ensure`] had to create the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirStatus {
    /// The directory was missing and has been created (including parents).
    Created,
    /// The directory was already present.
    AlreadyExisted,
}

/// Handle on an existing local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDirectory {
    path: PathBuf,
}

impl LocalDirectory {
    /// Opens a handle on a directory that must already exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory to wrap
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidDirectory` if the path does not exist or is not a directory.
    pub fn open(path: &Path) -> Result<Self, FilesError> {
        if !path.exists() {
            return Err(FilesError::InvalidDirectory(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(FilesError::InvalidDirectory(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Opens a handle on `path`, creating it (and any missing parents) first if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory to open or create
    ///
    /// # Returns
    ///
    /// The handle together with a [`DirStatus`] saying whether the directory pre-existed.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path exists but is not a directory (`InvalidDirectory`)
    /// - recursive creation fails (`DirectoryCreation`)
    pub fn ensure(path: &Path) -> Result<(Self, DirStatus), FilesError> {
        if path.exists() {
            return Ok((Self::open(path)?, DirStatus::AlreadyExisted));
        }

        fs::create_dir_all(path).map_err(|source| FilesError::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("created directory {}", path.display());

        Ok((
            Self {
                path: path.to_path_buf(),
            },
            DirStatus::Created,
        ))
    }

    /// Returns the directory path as given at construction.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the full path `name` has inside this directory.
    #[must_use]
    pub fn path_for(&self, name: &FileName) -> PathBuf {
        self.path.join(name)
    }

    /// Starts writing `name` through a part file in this directory.
    ///
    /// The part file gets a fresh random name (`.<random>.part`) created exclusively, so it can
    /// never clobber another file already staged here, whatever the remote names look like.
    /// Bytes only appear under `name` once [`StagedWrite::commit`] renames the part file into
    /// place. A write that is abandoned (dropped without commit) leaves the possibly truncated
    /// part file on disk and any previous `name` untouched.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the part file cannot be created.
    pub fn begin_write(&self, name: &FileName) -> Result<StagedWrite, FilesError> {
        let part_error = |e: io::Error| {
            FilesError::Io(io::Error::new(
                e.kind(),
                format!(
                    "Failed to create part file for {} in {}: {}",
                    name,
                    self.path.display(),
                    e
                ),
            ))
        };

        let (file, part_path) = tempfile::Builder::new()
            .prefix(".")
            .suffix(PART_SUFFIX)
            .tempfile_in(&self.path)
            .map_err(part_error)?
            .keep()
            .map_err(|e| part_error(e.error))?;

        Ok(StagedWrite {
            file,
            part_path,
            final_path: self.path_for(name),
            written: 0,
        })
    }

    /// Reads the full content of `name`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::FileNotFound` if the file is absent, or `FilesError::Io` if it
    /// cannot be read.
    pub fn read(&self, name: &FileName) -> Result<Vec<u8>, FilesError> {
        let target = self.path_for(name);
        if !target.is_file() {
            return Err(FilesError::FileNotFound(target.display().to_string()));
        }

        fs::read(&target).map_err(|e| {
            FilesError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read file {}: {}", target.display(), e),
            ))
        })
    }

    /// Copies `name` from this directory into `destination`, overwriting any existing copy.
    ///
    /// # Returns
    ///
    /// The number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the source file does not exist here (`FileNotFound`)
    /// - the copy itself fails (`Io`)
    pub fn copy_to(&self, name: &FileName, destination: &LocalDirectory) -> Result<u64, FilesError> {
        let source = self.path_for(name);
        if !source.is_file() {
            return Err(FilesError::FileNotFound(source.display().to_string()));
        }

        let target = destination.path_for(name);
        fs::copy(&source, &target).map_err(|e| {
            FilesError::Io(io::Error::new(
                e.kind(),
                format!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    target.display(),
                    e
                ),
            ))
        })
    }
}

/// An in-progress write started by [`LocalDirectory::begin_write`].
#[derive(Debug)]
pub struct StagedWrite {
    file: fs::File,
    part_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl StagedWrite {
    /// Path of the part file currently being written.
    #[must_use]
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// Flushes the part file and renames it over the final name.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the flush or the rename fails; the part file is left behind.
    pub fn commit(self) -> Result<u64, FilesError> {
        let Self {
            mut file,
            part_path,
            final_path,
            written,
        } = self;
        file.flush()?;
        drop(file);

        fs::rename(&part_path, &final_path).map_err(|e| {
            FilesError::Io(io::Error::new(
                e.kind(),
                format!(
                    "Failed to move {} to {}: {}",
                    part_path.display(),
                    final_path.display(),
                    e
                ),
            ))
        })?;
        Ok(written)
    }
}

impl Write for StagedWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

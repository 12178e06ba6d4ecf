//! Source directory scanning.
//!
//! Symbolic links are followed for discovery: a link to a regular file is
//! reported as a file, a link to a directory is descended into during
//! recursive scans, and broken links or link cycles are skipped with a
//! warning. A reported link is still moved as a link, never its target, so a
//! relative link may dangle once it sits in its new folder.

use crate::config::CompiledFilters;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised before any file is discovered.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source directory is missing or is not a directory.
    #[error("Source directory not found: {} ({reason})", path.display())]
    NotFound {
        path: PathBuf,
        reason: &'static str,
    },
}

/// A discovered regular file, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The basename of the file, lossily converted for display.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

impl From<PathBuf> for FileEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for FileEntry {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Lists the regular files under `root`.
///
/// Without `recursive` only direct children are returned. With it, every
/// regular file at any depth is returned in traversal order (unsorted).
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] if `root` does not exist or is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tidyup::scanner::scan;
///
/// let files = scan(Path::new("/home/user/Downloads"), false)?;
/// println!("Found {} files", files.len());
/// # Ok::<(), tidyup::scanner::ScanError>(())
/// ```
pub fn scan(root: &Path, recursive: bool) -> Result<Vec<FileEntry>, ScanError> {
    scan_filtered(root, recursive, &CompiledFilters::pass_through())
}

/// Like [`scan`], keeping only files accepted by `filters`.
///
/// Filters see each file's path relative to `root`.
pub fn scan_filtered(
    root: &Path,
    recursive: bool,
    filters: &CompiledFilters,
) -> Result<Vec<FileEntry>, ScanError> {
    let root = validate_root(root)?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let files = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            filters.should_include(relative)
        })
        .map(|entry| FileEntry::new(entry.into_path()))
        .collect::<Vec<_>>();

    tracing::debug!(root = %root.display(), recursive, count = files.len(), "Scan finished");
    Ok(files)
}

fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let not_found = |reason| ScanError::NotFound {
        path: root.to_path_buf(),
        reason,
    };

    if root.as_os_str().is_empty() {
        return Err(not_found("no directory given"));
    }
    if !root.exists() {
        return Err(not_found("path does not exist"));
    }
    if !root.is_dir() {
        return Err(not_found("path is not a directory"));
    }

    std::path::absolute(root).map_err(|_| not_found("path cannot be made absolute"))
}

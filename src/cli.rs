//! Command-line front-end for tidyup.
//!
//! This module wires the engine together the way a host application would:
//! - Validating the source/destination selection
//! - Scanning with the requested filters
//! - Previewing what was found
//! - Running the batch on a worker thread and rendering its progress here

use crate::config::{ConfigError, FilterConfig};
use crate::file_category::ExtensionRules;
use crate::output::{OutputFormatter, TerminalReporter};
use crate::progress::NoopReporter;
use crate::scanner::{FileEntry, ScanError, scan_filtered};
use crate::scheduler::{
    BatchJob, BatchOptions, BatchReport, BatchScheduler, ThreadSleep, ValidationError,
    WorkerPanicked, spawn_batch,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Anything that stops a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Worker(#[from] WorkerPanicked),
    #[error("Could not start batch worker: {0}")]
    Thread(#[from] std::io::Error),
    #[error("Could not encode report: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// True when the command simply had nothing to do.
    pub fn is_informational(&self) -> bool {
        matches!(self, CliError::Validation(e) if e.is_informational())
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// List the files that would be organized and their categories.
    Preview,
    /// Move (or simulate moving) the files into the destination.
    Organize,
}

/// Everything a command needs, already parsed.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub recursive: bool,
    pub filters: FilterConfig,
    pub batch: BatchOptions,
    /// Print machine-readable JSON instead of the progress bar and tables.
    pub json: bool,
    /// Print one line per processed file.
    pub list_files: bool,
}

#[derive(Serialize)]
struct PreviewEntry<'a> {
    path: &'a Path,
    category: &'static str,
}

/// Runs the given command.
///
/// Returns the batch report for [`OrganizeCommand::Organize`] and `None` for
/// a preview.
///
/// # Examples
///
/// ```no_run
/// use tidyup::cli::{CliOptions, OrganizeCommand, run_cli};
///
/// let options = CliOptions {
///     source: "/home/user/Downloads".into(),
///     destination: Some("/home/user/Sorted".into()),
///     ..Default::default()
/// };
/// match run_cli(OrganizeCommand::Organize, &options) {
///     Ok(_) => println!("Done"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    command: OrganizeCommand,
    options: &CliOptions,
) -> Result<Option<BatchReport>, CliError> {
    match command {
        OrganizeCommand::Preview => preview(options).map(|_| None),
        OrganizeCommand::Organize => organize(options).map(Some),
    }
}

fn collect_files(options: &CliOptions) -> Result<Vec<FileEntry>, CliError> {
    if options.source.as_os_str().is_empty() {
        return Err(ValidationError::MissingSource.into());
    }
    let filters = options.filters.clone().compile()?;
    Ok(scan_filtered(&options.source, options.recursive, &filters)?)
}

/// Lists discovered files with the category each would go to.
fn preview(options: &CliOptions) -> Result<(), CliError> {
    let files = collect_files(options)?;
    let rules = ExtensionRules::default();

    if options.json {
        let entries: Vec<_> = files
            .iter()
            .map(|f| PreviewEntry {
                path: f.path(),
                category: rules.classify(f.path()).dir_name(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    OutputFormatter::header(&format!("Files found in {}:", options.source.display()));
    for file in &files {
        OutputFormatter::plain(&format!(
            " - {}  → {}/",
            file.file_name(),
            rules.classify(file.path()).dir_name()
        ));
    }
    OutputFormatter::info(&format!("Found {} files.", files.len()));
    Ok(())
}

/// Scans the source and runs the batch into the destination.
fn organize(options: &CliOptions) -> Result<BatchReport, CliError> {
    let destination = options
        .destination
        .clone()
        .filter(|d| !d.as_os_str().is_empty())
        .ok_or(ValidationError::MissingDestination)?;
    if options.source.as_os_str().is_empty() {
        return Err(ValidationError::MissingSource.into());
    }

    let files = collect_files(options)?;
    let job = BatchJob::new(files, &destination, options.batch)?;

    if options.json {
        let report = BatchScheduler::new(job).run(&mut NoopReporter, &mut ThreadSleep);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    if options.batch.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Simulating {} files from {} into {}",
            job.len(),
            options.source.display(),
            destination.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} files from {} into {}",
            job.len(),
            options.source.display(),
            destination.display()
        ));
    }

    let mut reporter =
        TerminalReporter::new(job.len(), options.list_files || options.batch.dry_run);
    let report = spawn_batch(job, ExtensionRules::default())?.drive(&mut reporter)?;

    OutputFormatter::batch_summary(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Pacing;
    use std::fs;
    use tempfile::TempDir;

    fn options(source: &Path, destination: Option<&Path>) -> CliOptions {
        CliOptions {
            source: source.to_path_buf(),
            destination: destination.map(Path::to_path_buf),
            batch: BatchOptions {
                pacing: Pacing::none(),
                ..Default::default()
            },
            json: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_organize_requires_destination() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_cli(OrganizeCommand::Organize, &options(temp_dir.path(), None));

        assert!(matches!(
            result,
            Err(CliError::Validation(ValidationError::MissingDestination))
        ));
    }

    #[test]
    fn test_organize_requires_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_cli(
            OrganizeCommand::Organize,
            &options(Path::new(""), Some(temp_dir.path())),
        );

        assert!(matches!(
            result,
            Err(CliError::Validation(ValidationError::MissingSource))
        ));
    }

    #[test]
    fn test_empty_source_is_informational() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir(&source).unwrap();

        let err = run_cli(
            OrganizeCommand::Organize,
            &options(&source, Some(&temp_dir.path().join("out"))),
        )
        .unwrap_err();

        assert!(err.is_informational());
        assert_eq!(err.to_string(), "Nothing to organize: no files were found");
    }

    #[test]
    fn test_missing_source_surfaces_scan_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_cli(
            OrganizeCommand::Preview,
            &options(&temp_dir.path().join("nope"), None),
        );

        assert!(matches!(result, Err(CliError::Scan(ScanError::NotFound { .. }))));
    }

    #[test]
    fn test_preview_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photo.jpg"), "p").unwrap();

        let result = run_cli(OrganizeCommand::Preview, &options(temp_dir.path(), None)).unwrap();

        assert!(result.is_none());
        assert!(temp_dir.path().join("photo.jpg").exists());
    }
}

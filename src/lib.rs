//! tidyup - sort a directory's files into category folders
//!
//! This library scans a source directory, classifies files by extension, and
//! moves them into category subfolders of a destination directory. Batches
//! can be simulated (dry run), report progress after every file, and run
//! either on the calling thread or on a background worker.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod scheduler;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use file_category::{Category, ExtensionRules, classify};
pub use file_organizer::{FileOrganizer, MoveOutcome, MoveResult, OrganizeError, Placement};
pub use progress::{ProgressReporter, ProgressState};
pub use scanner::{FileEntry, ScanError, scan};
pub use scheduler::{
    BatchHandle, BatchJob, BatchOptions, BatchReport, BatchScheduler, BatchState, CancelToken,
    Layout, Pacing, ValidationError, spawn_batch, start_batch,
};

pub use cli::{CliOptions, OrganizeCommand, run_cli};

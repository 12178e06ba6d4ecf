//! Batch execution.
//!
//! A [`BatchJob`] is validated once, then a [`BatchScheduler`] walks its files
//! in scan order: classify, move, notify, pause. The scheduler is consumed by
//! [`BatchScheduler::run`], so a job cannot be executed twice.
//!
//! Two ways to drive a batch:
//! - [`start_batch`] runs the loop on the calling thread, blocking between
//!   steps through the injected [`Pacer`].
//! - [`spawn_batch`] runs it on a worker thread and hands back a
//!   [`BatchHandle`] whose events are replayed on the host's thread.

use crate::file_category::{Category, ExtensionRules};
use crate::file_organizer::{FileOrganizer, MoveOutcome, MoveResult, Placement};
use crate::progress::{BatchEvent, ChannelReporter, ProgressReporter, ProgressState};
use crate::scanner::FileEntry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Reasons a batch refuses to start. Nothing has been touched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select a source directory first")]
    MissingSource,
    #[error("Select a destination directory first")]
    MissingDestination,
    #[error("Nothing to organize: no files were found")]
    NothingToOrganize,
}

impl ValidationError {
    /// True for outcomes that are a no-op rather than a mistake.
    pub fn is_informational(&self) -> bool {
        matches!(self, ValidationError::NothingToOrganize)
    }
}

/// The background worker died before reporting.
#[derive(Debug, Error)]
#[error("Batch worker thread panicked")]
pub struct WorkerPanicked;

/// How destinations are laid out under the destination root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One subfolder per category.
    #[default]
    Categorized,
    /// Everything directly in the destination root.
    Flat,
}

/// Artificial delay between steps, so progress stays visible on small batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Upper bound for the whole batch.
    pub max_total: Duration,
    /// Upper bound for a single step.
    pub max_step: Duration,
}

impl Pacing {
    pub const DEFAULT_MAX_TOTAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(300);

    /// No delay at all.
    pub fn none() -> Self {
        Self {
            max_total: Duration::ZERO,
            max_step: Duration::ZERO,
        }
    }

    /// `min(max_total / total, max_step)`
    ///
    /// ```
    /// use std::time::Duration;
    /// use tidyup::scheduler::Pacing;
    ///
    /// let pacing = Pacing::default();
    /// assert_eq!(pacing.step_delay(5), Duration::from_millis(300));
    /// assert_eq!(pacing.step_delay(100), Duration::from_millis(50));
    /// ```
    pub fn step_delay(&self, total: usize) -> Duration {
        if total == 0 {
            return Duration::ZERO;
        }
        let per_file = self.max_total / u32::try_from(total).unwrap_or(u32::MAX);
        per_file.min(self.max_step)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            max_total: Self::DEFAULT_MAX_TOTAL,
            max_step: Self::DEFAULT_MAX_STEP,
        }
    }
}

/// Waits between steps.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Blocks the current thread for the delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Cooperative cancellation flag, checked before each file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-batch settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Compute and report every move without touching the filesystem.
    pub dry_run: bool,
    pub layout: Layout,
    pub pacing: Pacing,
}

/// A validated, immutable set of files headed for one destination.
#[derive(Debug, Clone)]
pub struct BatchJob {
    files: Vec<FileEntry>,
    destination: PathBuf,
    options: BatchOptions,
}

impl BatchJob {
    /// # Errors
    ///
    /// [`ValidationError::MissingDestination`] for an empty destination and
    /// [`ValidationError::NothingToOrganize`] for an empty file list.
    pub fn new(
        files: Vec<FileEntry>,
        destination: impl Into<PathBuf>,
        options: BatchOptions,
    ) -> Result<Self, ValidationError> {
        let destination = destination.into();
        if destination.as_os_str().is_empty() {
            return Err(ValidationError::MissingDestination);
        }
        if files.is_empty() {
            return Err(ValidationError::NothingToOrganize);
        }
        Ok(Self {
            files,
            destination,
            options,
        })
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a constructed job.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Lifecycle of a batch. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Everything that happened during one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// RFC 3339 timestamp of when the batch started.
    pub started_at: String,
    pub state: BatchState,
    pub dry_run: bool,
    pub total: usize,
    /// Progress as it stood when the batch ended.
    pub progress: ProgressState,
    pub results: Vec<MoveResult>,
}

impl BatchReport {
    /// A report with no results yet.
    pub fn empty(state: BatchState, total: usize) -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            state,
            dry_run: false,
            total,
            progress: ProgressState::new(total),
            results: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Moved))
    }

    pub fn simulated(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Simulated))
    }

    pub fn already_in_place(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::AlreadyInPlace))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &MoveResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    /// Successful files per destination folder name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for result in self.results.iter().filter(|r| r.succeeded()) {
            let key = result
                .category
                .map(|c: Category| c.dir_name().to_string())
                .unwrap_or_else(|| ".".to_string());
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    fn count(&self, predicate: impl Fn(&MoveOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Runs one [`BatchJob`] from `Idle` to `Completed` (or `Cancelled`).
pub struct BatchScheduler {
    job: BatchJob,
    rules: ExtensionRules,
    cancel: Option<CancelToken>,
    organizer: FileOrganizer,
    progress: ProgressState,
    state: BatchState,
}

impl BatchScheduler {
    pub fn new(job: BatchJob) -> Self {
        let total = job.len();
        Self {
            job,
            rules: ExtensionRules::default(),
            cancel: None,
            organizer: FileOrganizer::new(),
            progress: ProgressState::new(total),
            state: BatchState::Idle,
        }
    }

    pub fn with_rules(mut self, rules: ExtensionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Processes every file in order and returns the final report.
    ///
    /// `reporter.on_file` and `reporter.on_progress` are called after each
    /// file; `reporter.on_complete` is called exactly once at the end, also
    /// after a cancellation.
    pub fn run(
        mut self,
        reporter: &mut dyn ProgressReporter,
        pacer: &mut dyn Pacer,
    ) -> BatchReport {
        let options = *self.job.options();
        let total = self.job.len();
        let delay = options.pacing.step_delay(total);
        let mut report = BatchReport::empty(BatchState::Running, total);
        report.dry_run = options.dry_run;

        self.state = BatchState::Running;
        tracing::debug!(total, ?delay, dry_run = options.dry_run, "Batch started");

        for (index, entry) in self.job.files.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                tracing::info!(processed = index, total, "Batch cancelled");
                self.state = BatchState::Cancelled;
                break;
            }

            let placement = match options.layout {
                Layout::Categorized => Placement::Category(self.rules.classify(entry.path())),
                Layout::Flat => Placement::Flat,
            };
            let result = self.organizer.move_file(
                entry,
                &self.job.destination,
                placement,
                options.dry_run,
            );

            self.progress.processed = index + 1;
            self.progress.last_file = Some(entry.file_name().into_owned());
            reporter.on_file(&result);
            reporter.on_progress(&self.progress);
            report.results.push(result);

            if index + 1 < total {
                pacer.pause(delay);
            }
        }

        if self.state == BatchState::Running {
            self.state = BatchState::Completed;
            self.progress.completed = true;
        }
        report.state = self.state;
        report.progress = self.progress;

        tracing::debug!(state = ?self.state, processed = report.processed(), "Batch finished");
        reporter.on_complete(&report);
        report
    }
}

/// Validates and runs a batch on the calling thread with the standard rules.
///
/// # Errors
///
/// Returns a [`ValidationError`] before anything is moved if the destination
/// is empty or there are no files.
pub fn start_batch(
    files: Vec<FileEntry>,
    destination: impl Into<PathBuf>,
    options: BatchOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<BatchReport, ValidationError> {
    let job = BatchJob::new(files, destination, options)?;
    Ok(BatchScheduler::new(job).run(reporter, &mut ThreadSleep))
}

/// A batch running on a worker thread.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    worker: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Asks the worker to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Replays the events that arrived so far without blocking.
    ///
    /// For hosts that poll from their own event loop. Returns true once the
    /// completion event has been delivered.
    pub fn pump(&self, reporter: &mut dyn ProgressReporter) -> bool {
        let mut finished = false;
        for event in self.events.try_iter() {
            finished |= matches!(event, BatchEvent::Completed(_));
            event.dispatch(reporter);
        }
        finished
    }

    /// Replays every event on the calling thread until the batch ends.
    pub fn drive(self, reporter: &mut dyn ProgressReporter) -> Result<BatchReport, WorkerPanicked> {
        for event in self.events.iter() {
            event.dispatch(reporter);
        }
        self.join()
    }

    /// Waits for the worker, discarding any events not yet replayed.
    pub fn join(self) -> Result<BatchReport, WorkerPanicked> {
        self.worker.join().map_err(|_| WorkerPanicked)
    }
}

/// Runs `job` on a dedicated thread.
///
/// No reporter is touched from the worker: notifications are queued on a
/// channel and delivered by [`BatchHandle::pump`] or [`BatchHandle::drive`].
///
/// # Errors
///
/// Fails only if the operating system refuses to create the thread.
pub fn spawn_batch(job: BatchJob, rules: ExtensionRules) -> std::io::Result<BatchHandle> {
    let (sender, events) = mpsc::channel();
    let cancel = CancelToken::new();
    let scheduler = BatchScheduler::new(job)
        .with_rules(rules)
        .with_cancel_token(cancel.clone());

    let worker = thread::Builder::new()
        .name("tidyup-batch".to_string())
        .spawn(move || {
            let mut forwarder = ChannelReporter::new(sender);
            scheduler.run(&mut forwarder, &mut ThreadSleep)
        })?;

    Ok(BatchHandle {
        events,
        cancel,
        worker,
    })
}

//! Progress notifications for a running batch.
//!
//! The scheduler is the only writer of [`ProgressState`]; hosts observe it
//! through a [`ProgressReporter`]. When the batch runs on a worker thread the
//! notifications travel as [`BatchEvent`]s over a channel and are replayed on
//! the reporter's own thread.

use crate::file_organizer::MoveResult;
use crate::scheduler::BatchReport;
use serde::Serialize;
use std::sync::mpsc::Sender;

/// Snapshot of how far a batch has progressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    /// Files processed so far; never decreases and never exceeds `total`.
    pub processed: usize,
    /// Fixed for the lifetime of the batch.
    pub total: usize,
    /// Basename of the most recently processed file.
    pub last_file: Option<String>,
    pub completed: bool,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// `floor(processed * 100 / total)`, or 100 once completed.
    pub fn percent(&self) -> u8 {
        if self.completed || self.total == 0 {
            return 100;
        }
        (self.processed.min(self.total) * 100 / self.total) as u8
    }

    /// Human-readable status line.
    ///
    /// ```
    /// use tidyup::progress::ProgressState;
    ///
    /// let mut state = ProgressState::new(3);
    /// state.processed = 2;
    /// state.last_file = Some("notes.txt".to_string());
    /// assert_eq!(state.status(), "Processing: notes.txt (2/3)");
    /// ```
    pub fn status(&self) -> String {
        if self.completed {
            return "Organization finished!".to_string();
        }
        match &self.last_file {
            Some(name) => format!("Processing: {} ({}/{})", name, self.processed, self.total),
            None => "Starting organization...".to_string(),
        }
    }
}

/// Receives batch notifications.
///
/// Calls are made synchronously from the batch loop, so implementations
/// should return quickly.
pub trait ProgressReporter {
    /// Called after each file with the updated state.
    fn on_progress(&mut self, state: &ProgressState);

    /// Called once per file with what happened to it, before `on_progress`.
    fn on_file(&mut self, _result: &MoveResult) {}

    /// Called exactly once when the batch ends.
    fn on_complete(&mut self, report: &BatchReport);
}

/// A reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_progress(&mut self, _state: &ProgressState) {}

    fn on_complete(&mut self, _report: &BatchReport) {}
}

/// A notification emitted by a batch running on another thread.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    File(MoveResult),
    Progress(ProgressState),
    Completed(BatchReport),
}

impl BatchEvent {
    /// Replays this event onto `reporter`.
    pub fn dispatch(&self, reporter: &mut dyn ProgressReporter) {
        match self {
            BatchEvent::File(result) => reporter.on_file(result),
            BatchEvent::Progress(state) => reporter.on_progress(state),
            BatchEvent::Completed(report) => reporter.on_complete(report),
        }
    }
}

/// Forwards notifications into a channel.
///
/// Used on the worker side of a background batch. A closed channel means
/// the host stopped listening; events are then dropped.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<BatchEvent>,
}

impl ChannelReporter {
    pub fn new(sender: Sender<BatchEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: BatchEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Progress receiver dropped");
        }
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_progress(&mut self, state: &ProgressState) {
        self.send(BatchEvent::Progress(state.clone()));
    }

    fn on_file(&mut self, result: &MoveResult) {
        self.send(BatchEvent::File(result.clone()));
    }

    fn on_complete(&mut self, report: &BatchReport) {
        self.send(BatchEvent::Completed(report.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::BatchState;
    use std::sync::mpsc;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<ProgressState>,
        files: usize,
        completions: usize,
    }

    impl ProgressReporter for Recorder {
        fn on_progress(&mut self, state: &ProgressState) {
            self.progress.push(state.clone());
        }

        fn on_file(&mut self, _result: &MoveResult) {
            self.files += 1;
        }

        fn on_complete(&mut self, _report: &BatchReport) {
            self.completions += 1;
        }
    }

    #[test]
    fn test_percent_is_floored() {
        let mut state = ProgressState::new(3);
        assert_eq!(state.percent(), 0);
        state.processed = 1;
        assert_eq!(state.percent(), 33);
        state.processed = 2;
        assert_eq!(state.percent(), 66);
        state.processed = 3;
        assert_eq!(state.percent(), 100);
    }

    #[test]
    fn test_completed_is_always_full() {
        let mut state = ProgressState::new(4);
        state.processed = 1;
        state.completed = true;
        assert_eq!(state.percent(), 100);
        assert_eq!(state.status(), "Organization finished!");
    }

    #[test]
    fn test_status_before_first_file() {
        assert_eq!(ProgressState::new(2).status(), "Starting organization...");
    }

    #[test]
    fn test_channel_reporter_round_trip() {
        let (sender, receiver) = mpsc::channel();
        let mut forwarder = ChannelReporter::new(sender);

        let mut state = ProgressState::new(1);
        state.processed = 1;
        forwarder.on_progress(&state);
        forwarder.on_complete(&BatchReport::empty(BatchState::Completed, 1));
        drop(forwarder);

        let mut recorder = Recorder::default();
        for event in receiver {
            event.dispatch(&mut recorder);
        }

        assert_eq!(recorder.progress, vec![state]);
        assert_eq!(recorder.files, 0);
        assert_eq!(recorder.completions, 1);
    }

    #[test]
    fn test_channel_reporter_survives_closed_receiver() {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);

        let mut forwarder = ChannelReporter::new(sender);
        forwarder.on_progress(&ProgressState::new(1));
    }
}

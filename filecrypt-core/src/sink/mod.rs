use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::domain::{BatchEvent, JobOutcome, ProgressEvent};

pub mod board;

pub use board::{JobState, JobStatus, ProgressBoard};

/// Receives events from every running job; implementations must tolerate
/// concurrent calls from several worker threads.
pub trait EventSink: Send + Sync {
    fn progress(&self, event: ProgressEvent);
    fn finished(&self, outcome: JobOutcome);
}

/// Forwards events into a channel. A dropped receiver is not an error for
/// the jobs: they keep running and their events are discarded.
pub struct ChannelSink {
    tx: Sender<BatchEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn progress(&self, event: ProgressEvent) {
        let _ = self.tx.send(BatchEvent::Progress(event));
    }

    fn finished(&self, outcome: JobOutcome) {
        let _ = self.tx.send(BatchEvent::Finished(outcome));
    }
}

/// Records into a board, then hands the event on.
pub struct Tee<S: EventSink> {
    board: Arc<ProgressBoard>,
    next: S,
}

impl<S: EventSink> Tee<S> {
    pub fn new(board: Arc<ProgressBoard>, next: S) -> Self {
        Self { board, next }
    }
}

impl<S: EventSink> EventSink for Tee<S> {
    fn progress(&self, event: ProgressEvent) {
        self.board.record_progress(&event);
        self.next.progress(event);
    }

    fn finished(&self, outcome: JobOutcome) {
        self.board.record_outcome(&outcome);
        self.next.finished(outcome);
    }
}

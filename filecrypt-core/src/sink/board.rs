use std::path::PathBuf;

use dashmap::DashMap;

use crate::domain::{FileJob, JobId, JobOutcome, ProgressEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobStatus {
    pub id: JobId,
    pub source: PathBuf,
    pub percent: u8,
    pub state: JobState,
}

/// Most recent event per job, safe to update from any worker and to read
/// from a renderer at the same time.
#[derive(Debug, Default)]
pub struct ProgressBoard {
    rows: DashMap<JobId, JobStatus>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, job: &FileJob) {
        self.rows.insert(
            job.id,
            JobStatus {
                id: job.id,
                source: job.source.clone(),
                percent: 0,
                state: JobState::Queued,
            },
        );
    }

    pub fn record_progress(&self, ev: &ProgressEvent) {
        let mut row = self.rows.entry(ev.id).or_insert_with(|| JobStatus {
            id: ev.id,
            source: ev.source.clone(),
            percent: 0,
            state: JobState::Running,
        });
        row.percent = row.percent.max(ev.percent);
        if !row.state.is_terminal() {
            row.state = JobState::Running;
        }
    }

    pub fn record_outcome(&self, outcome: &JobOutcome) {
        let mut row = self.rows.entry(outcome.id).or_insert_with(|| JobStatus {
            id: outcome.id,
            source: outcome.source.clone(),
            percent: 0,
            state: JobState::Running,
        });
        if outcome.success() {
            row.percent = 100;
            row.state = JobState::Succeeded;
        } else {
            row.state = JobState::Failed;
        }
    }

    pub fn get(&self, id: JobId) -> Option<JobStatus> {
        self.rows.get(&id).map(|r| r.value().clone())
    }

    /// Rows ordered by job id.
    pub fn snapshot(&self) -> Vec<JobStatus> {
        let mut rows: Vec<JobStatus> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    /// Single-bar view: finished jobs count as complete whatever their result.
    pub fn overall_percent(&self) -> u8 {
        let n = self.rows.len();
        if n == 0 {
            return 0;
        }
        let sum: usize = self
            .rows
            .iter()
            .map(|r| {
                if r.state.is_terminal() {
                    100
                } else {
                    r.percent as usize
                }
            })
            .sum();
        (sum / n) as u8
    }

    pub fn all_terminal(&self) -> bool {
        self.rows.iter().all(|r| r.state.is_terminal())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobMode;
    use crate::error::JobError;

    fn outcome(id: JobId, ok: bool) -> JobOutcome {
        JobOutcome {
            id,
            source: PathBuf::from(format!("f{id}")),
            mode: JobMode::Encrypt,
            destination: None,
            bytes_processed: 0,
            chunks_written: 0,
            error: if ok { None } else { Some(JobError::Cancelled) },
        }
    }

    #[test]
    fn keeps_one_row_per_job() {
        let board = ProgressBoard::new();
        board.register(&FileJob::new(0, "a"));
        board.register(&FileJob::new(1, "b"));

        board.record_progress(&ProgressEvent {
            id: 1,
            source: "b".into(),
            percent: 40,
        });
        board.record_progress(&ProgressEvent {
            id: 0,
            source: "a".into(),
            percent: 90,
        });

        let snap = board.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!((snap[0].id, snap[0].percent), (0, 90));
        assert_eq!((snap[1].id, snap[1].percent), (1, 40));
        assert_eq!(snap[1].state, JobState::Running);
        assert_eq!(board.overall_percent(), 65);
        assert!(!board.all_terminal());
    }

    #[test]
    fn outcomes_are_terminal() {
        let board = ProgressBoard::new();
        board.register(&FileJob::new(0, "f0"));
        board.register(&FileJob::new(1, "f1"));
        board.record_outcome(&outcome(0, true));
        board.record_outcome(&outcome(1, false));

        assert_eq!(board.get(0).unwrap().state, JobState::Succeeded);
        assert_eq!(board.get(0).unwrap().percent, 100);
        assert_eq!(board.get(1).unwrap().state, JobState::Failed);
        assert!(board.all_terminal());
        assert_eq!(board.overall_percent(), 100);
    }

    #[test]
    fn concurrent_updates_do_not_interfere() {
        let board = std::sync::Arc::new(ProgressBoard::new());
        let handles: Vec<_> = (0..8)
            .map(|id| {
                let board = board.clone();
                std::thread::spawn(move || {
                    for pct in 0..=100u8 {
                        board.record_progress(&ProgressEvent {
                            id,
                            source: PathBuf::from(format!("f{id}")),
                            percent: pct,
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(board.snapshot().iter().all(|r| r.percent == 100));
    }
}

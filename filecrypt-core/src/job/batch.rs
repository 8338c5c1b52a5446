use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{info, warn};

use crate::crypto::key::EncryptionKey;
use crate::crypto::tdes::{CipherCodec, TdesEcb};
use crate::domain::{BatchEvent, FileJob, JobOutcome};
use crate::error::{JobError, KeyStoreError, SubmitError};
use crate::job::runner::{CancelToken, JobRunner};
use crate::keystore::KeyStore;
use crate::naming::{Clock, SystemClock};
use crate::policy::{BatchOptions, REQUIRED_KEY_LENGTH, Scheduling, is_valid_key};
use crate::sink::{ChannelSink, EventSink, ProgressBoard, Tee};
use crate::stats::BatchStats;

/// Accepts a list of files and one key, and runs one job per file.
pub struct BatchScheduler {
    key_store: Arc<dyn KeyStore>,
    codec: Arc<dyn CipherCodec>,
    clock: Arc<dyn Clock>,
    options: BatchOptions,
}

impl BatchScheduler {
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            key_store,
            codec: Arc::new(TdesEcb),
            clock: Arc::new(SystemClock),
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn CipherCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Validate once, persist the key, then launch every job.
    ///
    /// A bad key or an empty list rejects the whole batch before anything
    /// touches the filesystem or the key store. After that, per-file failures
    /// only show up in that file's outcome.
    pub fn submit<P: AsRef<Path>>(
        &self,
        files: &[P],
        key: &[u8],
    ) -> Result<BatchHandle, SubmitError> {
        if !is_valid_key(key) {
            warn!(len = key.len(), "batch rejected: bad key length");
            return Err(SubmitError::BatchRejected {
                expected: REQUIRED_KEY_LENGTH,
                actual: key.len(),
            });
        }
        if files.is_empty() {
            return Err(SubmitError::NoFiles);
        }
        let key = EncryptionKey::new(key).map_err(|_| SubmitError::BatchRejected {
            expected: REQUIRED_KEY_LENGTH,
            actual: key.len(),
        })?;

        let pool = match self.options.scheduling {
            Scheduling::Pool { workers } => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers.max(1))
                    .thread_name(|i| format!("filecrypt-worker-{i}"))
                    .build()
                    .map_err(|e| SubmitError::Pool(e.to_string()))?,
            ),
            Scheduling::Unbounded => None,
        };

        let key_persisted = self.key_store.save(key.as_bytes());
        if let Err(e) = &key_persisted {
            warn!(error = %e, "could not persist key; continuing");
        }

        let jobs: Vec<FileJob> = files
            .iter()
            .enumerate()
            .map(|(id, p)| FileJob::new(id, p.as_ref()))
            .collect();

        let board = Arc::new(ProgressBoard::new());
        for job in &jobs {
            board.register(job);
        }

        let (tx, rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(Tee::new(board.clone(), ChannelSink::new(tx)));
        let cancel = CancelToken::new();
        let runner = JobRunner::new(
            Arc::new(key),
            self.codec.clone(),
            self.clock.clone(),
            sink,
            self.options.effective_chunk_size(),
            cancel.clone(),
        );

        info!(
            files = jobs.len(),
            scheduling = ?self.options.scheduling,
            "batch accepted"
        );

        let total = jobs.len();
        match &pool {
            Some(pool) => {
                for job in jobs {
                    let r = runner.clone();
                    pool.spawn(move || r.run(job));
                }
            }
            None => {
                for job in jobs {
                    let r = runner.clone();
                    let queued = job.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("filecrypt-job-{}", job.id))
                        .spawn(move || r.run(queued));
                    if let Err(e) = spawned {
                        let source = job.source.clone();
                        runner.fail(&job, JobError::io(source, e));
                    }
                }
            }
        }

        Ok(BatchHandle {
            rx,
            board,
            cancel,
            key_persisted,
            total,
            finished: 0,
            _pool: pool,
        })
    }
}

/// Caller's view of a running batch.
///
/// Events arrive in whatever order jobs produce them; per job they are in
/// emission order. The batch is done once every job delivered its outcome.
/// Dropping the handle early cancels nothing already running, but jobs still
/// queued on the pool may never start.
pub struct BatchHandle {
    rx: Receiver<BatchEvent>,
    board: Arc<ProgressBoard>,
    cancel: CancelToken,
    key_persisted: Result<(), KeyStoreError>,
    total: usize,
    finished: usize,
    _pool: Option<rayon::ThreadPool>,
}

impl BatchHandle {
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn board(&self) -> Arc<ProgressBoard> {
        self.board.clone()
    }

    /// Outcome of saving the key, separate from any job result.
    pub fn key_persisted(&self) -> Result<(), &KeyStoreError> {
        self.key_persisted.as_ref().map(|_| ())
    }

    /// Ask running jobs to stop at their next chunk boundary; queued jobs
    /// end as cancelled without reading their source.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.finished >= self.total
    }

    /// Blocks for the next event; `None` once every job has finished.
    pub fn next_event(&mut self) -> Option<BatchEvent> {
        if self.is_done() {
            return None;
        }
        let ev = self.rx.recv().ok()?;
        if matches!(ev, BatchEvent::Finished(_)) {
            self.finished += 1;
        }
        Some(ev)
    }

    pub fn events(&mut self) -> impl Iterator<Item = BatchEvent> + '_ {
        std::iter::from_fn(move || self.next_event())
    }

    /// Drain to completion and return outcomes ordered by job id.
    pub fn wait(mut self) -> Vec<JobOutcome> {
        let mut outcomes: Vec<JobOutcome> = self
            .events()
            .filter_map(|ev| match ev {
                BatchEvent::Finished(o) => Some(o),
                BatchEvent::Progress(_) => None,
            })
            .collect();
        outcomes.sort_by_key(|o| o.id);
        let stats = BatchStats::from_outcomes(&outcomes);
        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            bytes = stats.bytes_processed,
            "batch finished"
        );
        outcomes
    }
}

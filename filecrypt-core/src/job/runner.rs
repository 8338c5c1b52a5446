use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::crypto::key::EncryptionKey;
use crate::crypto::tdes::CipherCodec;
use crate::domain::{FileJob, JobMode, JobOutcome, ProgressEvent};
use crate::error::JobError;
use crate::naming::{Clock, destination_for};
use crate::sink::EventSink;
use crate::util::counting::{CountingForward, percent_of};

/// Shared stop flag, checked before a job reads its source and between chunks.
#[derive(Clone, Debug, Default)]
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

/// Runs one file to completion. Cheap to clone: every worker gets its own copy
/// sharing the key, codec, clock and sink.
#[derive(Clone)]
pub struct JobRunner {
    key: Arc<EncryptionKey>,
    codec: Arc<dyn CipherCodec>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    chunk_size: usize,
    cancel: CancelToken,
}

impl JobRunner {
    pub fn new(
        key: Arc<EncryptionKey>,
        codec: Arc<dyn CipherCodec>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
        chunk_size: usize,
        cancel: CancelToken,
    ) -> Self {
        Self {
            key,
            codec,
            clock,
            sink,
            chunk_size: chunk_size.max(1),
            cancel,
        }
    }

    /// Execute and deliver the terminal outcome to the sink.
    pub fn run(&self, job: FileJob) {
        let outcome = self.execute(&job);
        self.sink.finished(outcome);
    }

    /// Execute and hand the outcome back. Progress still goes to the sink.
    /// Never panics on a bad file: every failure lands in `outcome.error`.
    pub fn execute(&self, job: &FileJob) -> JobOutcome {
        debug!(job = job.id, path = %job.source.display(), mode = job.mode.verb(), "job started");
        let mut outcome = JobOutcome {
            id: job.id,
            source: job.source.clone(),
            mode: job.mode,
            destination: None,
            bytes_processed: 0,
            chunks_written: 0,
            error: None,
        };
        if let Err(e) = self.transform_and_write(job, &mut outcome) {
            warn!(job = job.id, path = %job.source.display(), error = %e, "job failed");
            outcome.error = Some(e);
        } else {
            debug!(
                job = job.id,
                bytes = outcome.bytes_processed,
                chunks = outcome.chunks_written,
                "job finished"
            );
        }
        outcome
    }

    /// Report a job that never got to run (e.g. its thread could not start).
    pub fn fail(&self, job: &FileJob, error: JobError) {
        warn!(job = job.id, path = %job.source.display(), error = %error, "job not started");
        self.sink.finished(JobOutcome {
            id: job.id,
            source: job.source.clone(),
            mode: job.mode,
            destination: None,
            bytes_processed: 0,
            chunks_written: 0,
            error: Some(error),
        });
    }

    fn transform_and_write(&self, job: &FileJob, outcome: &mut JobOutcome) -> Result<(), JobError> {
        self.check_cancel()?;
        let input = fs::read(&job.source).map_err(|e| JobError::io(&job.source, e))?;

        let output = match job.mode {
            JobMode::Encrypt => self.codec.encrypt(&input, self.key.as_bytes())?,
            JobMode::Decrypt => self.codec.decrypt(&input, self.key.as_bytes())?,
        };
        drop(input);

        let dest = destination_for(&job.source, job.mode, self.clock.as_ref())?;
        debug!(job = job.id, dest = %dest.display(), "writing");
        outcome.destination = Some(dest.clone());

        let file = File::create(&dest).map_err(|e| JobError::io(&dest, e))?;
        let mut w = CountingForward::new(file);
        let total = output.len() as u64;

        // decrypting an encrypted empty file yields nothing to write
        if output.is_empty() {
            self.emit(job, 100);
        }
        for chunk in output.chunks(self.chunk_size) {
            self.check_cancel()?;
            w.write_all(chunk).map_err(|e| JobError::io(&dest, e))?;
            outcome.chunks_written += 1;
            outcome.bytes_processed = w.counted;
            self.emit(job, percent_of(w.counted, total));
        }
        w.flush().map_err(|e| JobError::io(&dest, e))?;
        Ok(())
    }

    fn emit(&self, job: &FileJob, percent: u8) {
        self.sink.progress(ProgressEvent {
            id: job.id,
            source: job.source.clone(),
            percent,
        });
    }

    fn check_cancel(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}

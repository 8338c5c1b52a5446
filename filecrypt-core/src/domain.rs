// filecrypt_core/src/domain.rs
use std::path::{Path, PathBuf};

use crate::error::JobError;
use crate::policy::MARKER_SUFFIX;

/// Position of the file in the submitted list.
pub type JobId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobMode {
    Encrypt,
    Decrypt,
}

impl JobMode {
    /// Names ending in the marker are decrypted, everything else encrypted.
    pub fn for_path(path: &Path) -> Self {
        let marked = path
            .file_name()
            .is_some_and(|n| n.as_encoded_bytes().ends_with(MARKER_SUFFIX.as_bytes()));
        if marked {
            JobMode::Decrypt
        } else {
            JobMode::Encrypt
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            JobMode::Encrypt => "encrypt",
            JobMode::Decrypt => "decrypt",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileJob {
    pub id: JobId,
    pub source: PathBuf,
    pub mode: JobMode,
}

impl FileJob {
    pub fn new(id: JobId, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let mode = JobMode::for_path(&source);
        Self { id, source, mode }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    pub id: JobId,
    pub source: PathBuf,
    /// 0..=100
    pub percent: u8,
}

/// Terminal report for one job; exactly one per job.
#[derive(Debug)]
pub struct JobOutcome {
    pub id: JobId,
    pub source: PathBuf,
    pub mode: JobMode,
    /// None when the job failed before a destination was chosen.
    pub destination: Option<PathBuf>,
    pub bytes_processed: u64,
    pub chunks_written: u64,
    pub error: Option<JobError>,
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub enum BatchEvent {
    Progress(ProgressEvent),
    Finished(JobOutcome),
}

impl BatchEvent {
    pub fn id(&self) -> JobId {
        match self {
            BatchEvent::Progress(p) => p.id,
            BatchEvent::Finished(o) => o.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_marker_suffix() {
        assert_eq!(JobMode::for_path(Path::new("a.txt")), JobMode::Encrypt);
        assert_eq!(JobMode::for_path(Path::new("a.txt.enc")), JobMode::Decrypt);
        assert_eq!(JobMode::for_path(Path::new("/x/y/z.enc")), JobMode::Decrypt);
        assert_eq!(JobMode::for_path(Path::new("a.encx")), JobMode::Encrypt);
        // marker on a directory component does not count
        assert_eq!(JobMode::for_path(Path::new("d.enc/a.txt")), JobMode::Encrypt);
    }

    #[test]
    fn file_job_derives_mode() {
        let j = FileJob::new(3, "notes.md.enc");
        assert_eq!(j.id, 3);
        assert_eq!(j.mode, JobMode::Decrypt);
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileCryptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error("Format error: {0}")]
    Format(String),

    #[error("{failed} of {total} files failed")]
    JobsFailed { failed: u64, total: u64 },
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, FileCryptError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("key must be {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("ciphertext length {len} is not a positive multiple of the block size")]
    Misaligned { len: usize },

    #[error("malformed padding after decryption (wrong key or corrupted file)")]
    Padding,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("cannot decrypt {0}: name lacks the encrypted-file marker")]
    MissingMarker(PathBuf),

    #[error("cannot decrypt {0}: nothing left of the name once the marker is removed")]
    EmptyStem(PathBuf),

    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// Failure scoped to a single file; reported in that file's outcome only.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("cancelled")]
    Cancelled,
}

impl JobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Refusal of a whole batch before any job started.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("batch rejected: key must be {expected} bytes, got {actual}")]
    BatchRejected { expected: usize, actual: usize },

    #[error("batch rejected: no files selected")]
    NoFiles,

    #[error("could not start worker pool: {0}")]
    Pool(String),
}

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("key store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key store format error: {0}")]
    Format(String),

    #[error("key store lock poisoned")]
    Poisoned,
}

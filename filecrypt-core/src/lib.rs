#![forbid(unsafe_code)]

pub mod error;
pub mod policy;

pub mod util {
    pub mod counting;
}

pub mod crypto {
    pub mod hex;
    pub mod key;
    pub mod tdes;
}

pub mod domain;
pub mod naming;
pub mod sink;

pub mod job {
    pub mod batch;
    pub mod runner;
}

pub mod keystore;
pub mod keystore_fs;
pub mod stats;

// Re-exports: stable API surface
pub use crypto::key::EncryptionKey;
pub use crypto::tdes::{BLOCK_SIZE, CipherCodec, TdesEcb};
pub use domain::{BatchEvent, FileJob, JobId, JobMode, JobOutcome, ProgressEvent};
pub use job::batch::{BatchHandle, BatchScheduler};
pub use job::runner::{CancelToken, JobRunner};
pub use keystore::{KeyStore, MemoryKeyStore};
pub use keystore_fs::FileKeyStore;
pub use naming::destination_for;
pub use policy::{
    BatchOptions, DEFAULT_CHUNK_SIZE, MARKER_SUFFIX, REQUIRED_KEY_LENGTH, Scheduling, is_valid_key,
};
pub use stats::BatchStats;

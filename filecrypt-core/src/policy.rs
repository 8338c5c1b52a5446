use serde::{Deserialize, Serialize};

/// Triple-DES (EDE3) takes exactly 24 bytes of raw key material.
pub const REQUIRED_KEY_LENGTH: usize = 24;

/// Appended on encrypt; its presence selects decrypt.
pub const MARKER_SUFFIX: &str = ".enc";

/// Output is written and reported in slices of this size.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024;

/// Key gate for a whole batch. Length is the only rule: any byte value is
/// allowed, DES weak keys included.
pub fn is_valid_key(key: &[u8]) -> bool {
    key.len() == REQUIRED_KEY_LENGTH
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduling {
    /// Jobs queue on a fixed-size pool.
    Pool { workers: usize },
    /// One OS thread per file, no bound.
    #[default]
    Unbounded,
}

impl Scheduling {
    pub fn available_parallelism() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Scheduling::Pool { workers }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Bytes per write (and per progress event). 0 falls back to the default.
    pub chunk_size: usize,
    pub scheduling: Scheduling,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            scheduling: Scheduling::default(),
        }
    }
}

impl BatchOptions {
    pub(crate) fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_gate_is_length_only() {
        assert!(is_valid_key(b"abcdefghijklmnopqrstuvwx"));
        assert!(is_valid_key(&[0u8; REQUIRED_KEY_LENGTH]));
        assert!(is_valid_key(&[0xffu8; REQUIRED_KEY_LENGTH]));
        assert!(!is_valid_key(b""));
        assert!(!is_valid_key(b"abcdefghijklmnopqrstuvw"));
        assert!(!is_valid_key(b"abcdefghijklmnopqrstuvwxy"));
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        let opts = BatchOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(opts.effective_chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn one_thread_per_file_unless_asked() {
        assert_eq!(Scheduling::default(), Scheduling::Unbounded);
        assert_eq!(BatchOptions::default().scheduling, Scheduling::Unbounded);
        match Scheduling::available_parallelism() {
            Scheduling::Pool { workers } => assert!(workers >= 1),
            Scheduling::Unbounded => panic!("expected a pool"),
        }
    }
}

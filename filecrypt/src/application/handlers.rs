use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use filecrypt_core::crypto::hex::parse_hex_array;
use filecrypt_core::error::{FileCryptError, Result, SubmitError};
use filecrypt_core::sink::ProgressBoard;
use filecrypt_core::{
    BatchEvent, BatchOptions, BatchScheduler, BatchStats, FileKeyStore, JobOutcome, KeyStore,
    REQUIRED_KEY_LENGTH, Scheduling, is_valid_key,
};

fn resolve_key(
    key: Option<String>,
    key_hex: Option<String>,
    store: &dyn KeyStore,
) -> Result<Vec<u8>> {
    if let Some(text) = key {
        return Ok(text.trim().as_bytes().to_vec());
    }
    if let Some(hex) = key_hex {
        return Ok(parse_hex_array::<REQUIRED_KEY_LENGTH>(&hex)?.to_vec());
    }
    store.load()?.ok_or_else(|| {
        FileCryptError::Format("no key given (--key / --key-hex) and none stored".into())
    })
}

fn scheduling_from(workers: Option<usize>, pool: bool) -> Scheduling {
    match (workers, pool) {
        (Some(n), _) => Scheduling::Pool { workers: n },
        (None, true) => Scheduling::available_parallelism(),
        (None, false) => Scheduling::Unbounded,
    }
}

fn outcome_line(o: &JobOutcome) -> String {
    match (&o.error, &o.destination) {
        (None, Some(dest)) => format!(
            "{}ed: {} -> {} ({} bytes)",
            o.mode.verb(),
            o.source.display(),
            dest.display(),
            o.bytes_processed
        ),
        (None, None) => format!("{}ed: {}", o.mode.verb(), o.source.display()),
        (Some(e), _) => format!("failed: {}: {}", o.source.display(), e),
    }
}

fn progress_line(board: &ProgressBoard) -> String {
    let rows = board.snapshot();
    let done = rows.iter().filter(|r| r.state.is_terminal()).count();
    format!(
        "[{done}/{}] {:>3}%",
        rows.len(),
        board.overall_percent()
    )
}

#[allow(clippy::too_many_arguments)]
pub fn handle_run(
    files: Vec<PathBuf>,
    key: Option<String>,
    key_hex: Option<String>,
    config: PathBuf,
    workers: Option<usize>,
    pool: bool,
    chunk_size: usize,
    quiet: bool,
) -> Result<()> {
    let store = Arc::new(FileKeyStore::new(&config));
    let key = resolve_key(key, key_hex, store.as_ref())?;

    let opts = BatchOptions {
        chunk_size,
        scheduling: scheduling_from(workers, pool),
    };
    let scheduler = BatchScheduler::new(store).with_options(opts);
    let mut handle = scheduler.submit(&files, &key)?;

    match handle.key_persisted() {
        Ok(()) => eprintln!("key: saved to {}", config.display()),
        Err(e) => eprintln!("key: not saved ({e})"),
    }

    let board = handle.board();
    let mut outcomes = Vec::with_capacity(handle.len());
    let mut err = std::io::stderr();
    for ev in handle.events() {
        match ev {
            BatchEvent::Progress(_) => {
                if !quiet {
                    let _ = write!(err, "\r{}", progress_line(&board));
                }
            }
            BatchEvent::Finished(o) => {
                if !quiet {
                    let _ = write!(err, "\r");
                }
                println!("{}", outcome_line(&o));
                outcomes.push(o);
            }
        }
    }
    if !quiet {
        let _ = writeln!(err, "\r{}", progress_line(&board));
    }

    let stats = BatchStats::from_outcomes(&outcomes);
    println!(
        "done: {} encrypted, {} decrypted, {} failed",
        stats.encrypted, stats.decrypted, stats.failed
    );
    if stats.failed > 0 {
        return Err(FileCryptError::JobsFailed {
            failed: stats.failed,
            total: stats.files,
        });
    }
    Ok(())
}

pub fn handle_key_show(config: PathBuf) -> Result<()> {
    match FileKeyStore::new(&config).load()? {
        Some(key) => match std::str::from_utf8(&key) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("hex:{}", hex::encode(&key)),
        },
        None => eprintln!("key: none stored in {}", config.display()),
    }
    Ok(())
}

pub fn handle_key_set(key: String, config: PathBuf) -> Result<()> {
    handle_key_check(key.clone())?;
    FileKeyStore::new(&config).save(key.trim().as_bytes())?;
    eprintln!("key: saved to {}", config.display());
    Ok(())
}

pub fn handle_key_check(key: String) -> Result<()> {
    let bytes = key.trim().as_bytes();
    if !is_valid_key(bytes) {
        return Err(SubmitError::BatchRejected {
            expected: REQUIRED_KEY_LENGTH,
            actual: bytes.len(),
        }
        .into());
    }
    println!("key: ok ({REQUIRED_KEY_LENGTH} bytes)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecrypt_core::error::JobError;
    use filecrypt_core::{JobMode, MemoryKeyStore};

    #[test]
    fn explicit_key_wins_over_store() {
        let store = MemoryKeyStore::default();
        store.save(b"stored-stored-stored-key").unwrap();
        let k = resolve_key(Some("abcdefghijklmnopqrstuvwx".into()), None, &store).unwrap();
        assert_eq!(k, b"abcdefghijklmnopqrstuvwx");
        let k = resolve_key(None, None, &store).unwrap();
        assert_eq!(k, b"stored-stored-stored-key");
    }

    #[test]
    fn hex_key_must_be_full_width() {
        let store = MemoryKeyStore::default();
        let k = resolve_key(None, Some("00".repeat(24)), &store).unwrap();
        assert_eq!(k, vec![0u8; 24]);
        assert!(resolve_key(None, Some("00".repeat(8)), &store).is_err());
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(resolve_key(None, None, &MemoryKeyStore::default()).is_err());
    }

    #[test]
    fn scheduling_flags() {
        assert_eq!(scheduling_from(None, false), Scheduling::Unbounded);
        assert_eq!(scheduling_from(Some(3), false), Scheduling::Pool { workers: 3 });
        assert_eq!(scheduling_from(Some(3), true), Scheduling::Pool { workers: 3 });
        assert!(matches!(scheduling_from(None, true), Scheduling::Pool { .. }));
    }

    #[test]
    fn outcome_lines() {
        let ok = JobOutcome {
            id: 0,
            source: "a.txt".into(),
            mode: JobMode::Encrypt,
            destination: Some("a.txt.enc".into()),
            bytes_processed: 16,
            chunks_written: 1,
            error: None,
        };
        assert_eq!(outcome_line(&ok), "encrypted: a.txt -> a.txt.enc (16 bytes)");

        let bad = JobOutcome {
            id: 1,
            source: "b.enc".into(),
            mode: JobMode::Decrypt,
            destination: None,
            bytes_processed: 0,
            chunks_written: 0,
            error: Some(JobError::Cancelled),
        };
        assert_eq!(outcome_line(&bad), "failed: b.enc: cancelled");
    }

    #[test]
    fn run_encrypts_and_stores_key() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("doc.txt");
        std::fs::write(&src, b"hello").unwrap();
        let config = tmp.path().join("config.properties");

        handle_run(
            vec![src],
            Some("abcdefghijklmnopqrstuvwx".into()),
            None,
            config.clone(),
            Some(1),
            false,
            1024,
            true,
        )
        .unwrap();

        assert_eq!(std::fs::read(tmp.path().join("doc.txt.enc")).unwrap().len(), 8);
        let stored = FileKeyStore::new(&config).load().unwrap().unwrap();
        assert_eq!(stored, b"abcdefghijklmnopqrstuvwx");
    }

    #[test]
    fn run_reports_failures_in_exit_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = handle_run(
            vec![tmp.path().join("missing")],
            Some("abcdefghijklmnopqrstuvwx".into()),
            None,
            tmp.path().join("config.properties"),
            None,
            true,
            1024,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, FileCryptError::JobsFailed { failed: 1, total: 1 }));
    }

    #[test]
    fn key_check_counts_bytes() {
        assert!(handle_key_check("abcdefghijklmnopqrstuvwx".into()).is_ok());
        assert!(handle_key_check("short".into()).is_err());
    }
}

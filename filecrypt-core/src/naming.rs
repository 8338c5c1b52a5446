use std::ffi::OsString;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::domain::JobMode;
use crate::error::NamingError;
use crate::policy::MARKER_SUFFIX;

/// Millisecond wall clock used to stamp decrypt outputs.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        u64::try_from(ms).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Where the output of `source` goes.
///
/// Encrypt appends the marker and overwrites whatever is there. Decrypt drops
/// the marker and prefixes `<millis>-` in the source's directory, so repeated
/// runs do not clobber each other. Two decrypts of the same name inside one
/// millisecond still collide; nothing guards that.
///
/// The name is never re-encoded, so non-UTF-8 names round-trip. A file named
/// only `.enc` is refused with `EmptyStem` instead of producing a bare
/// `<millis>-` as the desktop tool did.
pub fn destination_for(
    source: &Path,
    mode: JobMode,
    clock: &dyn Clock,
) -> Result<PathBuf, NamingError> {
    let name = source
        .file_name()
        .ok_or_else(|| NamingError::NoFileName(source.to_path_buf()))?;

    match mode {
        JobMode::Encrypt => {
            let mut out: OsString = source.as_os_str().to_owned();
            out.push(MARKER_SUFFIX);
            Ok(PathBuf::from(out))
        }
        JobMode::Decrypt => {
            if name == MARKER_SUFFIX {
                return Err(NamingError::EmptyStem(source.to_path_buf()));
            }
            let marked = source
                .extension()
                .is_some_and(|ext| ext == &MARKER_SUFFIX[1..]);
            let stem = match source.file_stem() {
                Some(stem) if marked => stem,
                _ => return Err(NamingError::MissingMarker(source.to_path_buf())),
            };
            let mut stamped = OsString::from(clock.now_millis().to_string());
            stamped.push("-");
            stamped.push(stem);
            Ok(match source.parent() {
                Some(dir) => dir.join(stamped),
                None => PathBuf::from(stamped),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_appends_marker() {
        let d = destination_for(Path::new("a.txt"), JobMode::Encrypt, &FixedClock(1)).unwrap();
        assert_eq!(d, PathBuf::from("a.txt.enc"));

        let d = destination_for(Path::new("/tmp/x/a"), JobMode::Encrypt, &FixedClock(1)).unwrap();
        assert_eq!(d, PathBuf::from("/tmp/x/a.enc"));
    }

    #[test]
    fn decrypt_strips_marker_and_stamps() {
        let d = destination_for(
            Path::new("a.txt.enc"),
            JobMode::Decrypt,
            &FixedClock(1_700_000_000_123),
        )
        .unwrap();
        assert_eq!(d, PathBuf::from("1700000000123-a.txt"));

        let d = destination_for(Path::new("/data/in/b.bin.enc"), JobMode::Decrypt, &FixedClock(42))
            .unwrap();
        assert_eq!(d, PathBuf::from("/data/in/42-b.bin"));
    }

    #[test]
    fn decrypt_only_strips_the_last_marker() {
        let d = destination_for(Path::new("a.enc.enc"), JobMode::Decrypt, &FixedClock(5)).unwrap();
        assert_eq!(d, PathBuf::from("5-a.enc"));
    }

    #[test]
    fn decrypt_without_marker_is_an_error() {
        let err = destination_for(Path::new("a.txt"), JobMode::Decrypt, &FixedClock(1)).unwrap_err();
        assert_eq!(err, NamingError::MissingMarker(PathBuf::from("a.txt")));
    }

    #[test]
    fn marker_only_name_is_an_error() {
        let err = destination_for(Path::new("dir/.enc"), JobMode::Decrypt, &FixedClock(1)).unwrap_err();
        assert_eq!(err, NamingError::EmptyStem(PathBuf::from("dir/.enc")));
    }

    #[test]
    fn path_without_file_name_is_an_error() {
        assert!(matches!(
            destination_for(Path::new("/"), JobMode::Encrypt, &FixedClock(1)),
            Err(NamingError::NoFileName(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_name_keeps_its_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let src = Path::new(OsStr::from_bytes(b"caf\xe9.txt.enc"));
        let d = destination_for(src, JobMode::Decrypt, &FixedClock(7)).unwrap();
        assert_eq!(d.into_os_string().into_vec(), b"7-caf\xe9.txt".to_vec());

        let src = Path::new(OsStr::from_bytes(b"dir/\xff"));
        let d = destination_for(src, JobMode::Encrypt, &FixedClock(7)).unwrap();
        assert_eq!(JobMode::for_path(&d), JobMode::Decrypt);
        assert_eq!(d.into_os_string().into_vec(), b"dir/\xff.enc".to_vec());
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}

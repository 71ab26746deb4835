//! Run lock that keeps two pipeline runs from working the same folder

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime};
use log::{debug, warn};

const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Held for the duration of a run; the lock file is removed on drop
#[derive(Debug)]
pub struct RunLock {
    path: Option<PathBuf>,
}

impl RunLock {
    /// Take the lock at `path`
    ///
    /// With `allow_overlap` no file is created. A lock older than `stale_after`
    /// is assumed to be left over from a crashed run and is replaced.
    pub fn acquire(path: &Path, allow_overlap: bool, stale_after: ChronoDuration, now: NaiveDateTime) -> Result<Self> {
        if allow_overlap {
            return Ok(Self { path: None });
        }

        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    writeln!(file, "{}\t{}", std::process::id(), now.format(STAMP_FORMAT))
                        .with_context(|| format!("Failed to write run lock {}", path.display()))?;
                    debug!("Acquired run lock {}", path.display());
                    return Ok(Self {
                        path: Some(path.to_path_buf()),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let started = lock_started(path);
                    let stale = started.is_none_or(|s| now - s >= stale_after);
                    if !stale {
                        bail!(
                            "Another run is in progress (lock {} taken at {}). Set policy.allow_overlap to run anyway.",
                            path.display(),
                            started.map(|s| s.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
                        );
                    }
                    warn!("Replacing stale run lock {}", path.display());
                    fs::remove_file(path)
                        .with_context(|| format!("Failed to remove stale run lock {}", path.display()))?;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create run lock {}", path.display()));
                }
            }
        }
        bail!("Could not take run lock {}", path.display())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to release run lock {}: {}", path.display(), e);
            }
        }
    }
}

/// When the current holder took the lock: the recorded time, else the file's mtime
fn lock_started(path: &Path) -> Option<NaiveDateTime> {
    let recorded = fs::read_to_string(path).ok().and_then(|content| {
        let stamp = content.trim().split('\t').nth(1)?.to_string();
        NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT).ok()
    });
    recorded.or_else(|| {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified).naive_local())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".accessioner.lock");
        {
            let _lock = RunLock::acquire(&path, false, ChronoDuration::hours(24), at(19, 9)).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_second_run_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".accessioner.lock");
        let _held = RunLock::acquire(&path, false, ChronoDuration::hours(24), at(19, 9)).unwrap();

        let err = RunLock::acquire(&path, false, ChronoDuration::hours(24), at(19, 10)).unwrap_err();
        assert!(err.to_string().contains("Another run is in progress"));
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".accessioner.lock");
        fs::write(&path, format!("4242\t{}\n", at(18, 9).format(STAMP_FORMAT))).unwrap();

        let lock = RunLock::acquire(&path, false, ChronoDuration::hours(24), at(19, 10)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("2026-10-19T10:00:00"));
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_overlap_allowed_takes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".accessioner.lock");
        let _held = RunLock::acquire(&path, false, ChronoDuration::hours(24), at(19, 9)).unwrap();
        let _second = RunLock::acquire(&path, true, ChronoDuration::hours(24), at(19, 9)).unwrap();
        assert!(path.exists());
    }
}

//! Move processed spreadsheets out of the network folder

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::error::HousekeepingError;

pub struct FileMover {
    complete: PathBuf,
    errors: PathBuf,
}

impl FileMover {
    pub fn new(complete: &Path, errors: &Path) -> Self {
        Self {
            complete: complete.to_path_buf(),
            errors: errors.to_path_buf(),
        }
    }

    /// Move `sheet` to `complete/` on success or `errors/` on failure
    pub fn settle(&self, sheet: &Path, succeeded: bool, now: NaiveDateTime) -> Result<PathBuf, HousekeepingError> {
        let dir = if succeeded { &self.complete } else { &self.errors };
        let target = free_target(dir, sheet, now);
        move_file(sheet, &target)?;
        info!("Moved {} to {}", sheet.display(), target.display());
        Ok(target)
    }
}

/// Destination path in `dir`, suffixed with a timestamp if the name is taken
fn free_target(dir: &Path, sheet: &Path, now: NaiveDateTime) -> PathBuf {
    let name = sheet
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let plain = dir.join(&name);
    if !plain.exists() {
        return plain;
    }

    let stem = sheet
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = sheet
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = now.format("%Y%m%d-%H%M%S");

    let mut candidate = dir.join(format!("{}-{}{}", stem, stamp, ext));
    let mut n = 1;
    while candidate.exists() {
        n += 1;
        candidate = dir.join(format!("{}-{}-{}{}", stem, stamp, n, ext));
    }
    candidate
}

/// Rename, falling back to copy and remove across devices
fn move_file(from: &Path, to: &Path) -> Result<(), HousekeepingError> {
    let failed = |reason: String| HousekeepingError::FileMove {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!("Rename failed ({}), copying instead", rename_err);
            fs::copy(from, to).map_err(|e| failed(e.to_string()))?;
            if let Err(e) = fs::remove_file(from) {
                // Leave a single copy behind, not two
                let _ = fs::remove_file(to);
                return Err(failed(format!("copied but could not remove source: {}", e)));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(9, 12, 0).unwrap()
    }

    fn setup() -> (tempfile::TempDir, FileMover, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("complete")).unwrap();
        fs::create_dir(dir.path().join("errors")).unwrap();
        let mover = FileMover::new(&dir.path().join("complete"), &dir.path().join("errors"));
        let sheet = dir.path().join("mssa_create.csv");
        fs::write(&sheet, "data").unwrap();
        (dir, mover, sheet)
    }

    #[test]
    fn test_success_goes_to_complete() {
        let (dir, mover, sheet) = setup();
        let target = mover.settle(&sheet, true, now()).unwrap();
        assert_eq!(target, dir.path().join("complete").join("mssa_create.csv"));
        assert!(!sheet.exists());
        assert_eq!(fs::read_to_string(target).unwrap(), "data");
    }

    #[test]
    fn test_failure_goes_to_errors() {
        let (dir, mover, sheet) = setup();
        let target = mover.settle(&sheet, false, now()).unwrap();
        assert_eq!(target, dir.path().join("errors").join("mssa_create.csv"));
        assert!(!sheet.exists());
    }

    #[test]
    fn test_existing_destination_is_kept() {
        let (dir, mover, sheet) = setup();
        let earlier = dir.path().join("complete").join("mssa_create.csv");
        fs::write(&earlier, "yesterday").unwrap();

        let target = mover.settle(&sheet, true, now()).unwrap();

        assert_eq!(target, dir.path().join("complete").join("mssa_create-20261019-091200.csv"));
        assert_eq!(fs::read_to_string(earlier).unwrap(), "yesterday");
        assert_eq!(fs::read_to_string(target).unwrap(), "data");
    }

    #[test]
    fn test_missing_destination_reports_move_error() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("update.csv");
        fs::write(&sheet, "data").unwrap();
        let mover = FileMover::new(&dir.path().join("nope"), &dir.path().join("nope"));

        let err = mover.settle(&sheet, true, now()).unwrap_err();

        assert!(matches!(err, HousekeepingError::FileMove { .. }));
        assert!(sheet.exists());
    }
}

use crate::models::backup_record::BackupRecord;
use crate::models::error::{Result, TimeMachineError};
use crate::utils::directory::get_dirs_at_depth;
use chrono::Datelike;
use log::{debug, info};
use std::path::Path;

/// Lists snapshot directories under `backup_root`, most recent first.
///
/// Only `YYYY/MM/YYYY-MM-DD-HHMMSS` leaves whose year and month agree with their
/// parents count; anything else is skipped. A root that does not exist yet has no
/// backups.
pub fn scan_backups(backup_root: &Path) -> Result<Vec<BackupRecord>> {
    if !backup_root.exists() {
        debug!("Backup root {} does not exist yet", backup_root.display());
        return Ok(Vec::new());
    }
    if !backup_root.is_dir() {
        return Err(TimeMachineError::DirectoryRead {
            path: backup_root.to_path_buf(),
            cause: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
        });
    }

    let mut backups: Vec<BackupRecord> = get_dirs_at_depth(backup_root, 3)
        .into_iter()
        .filter_map(|path| {
            let created_at = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(BackupRecord::parse_timestamp)?;

            let month_dir = path.parent()?;
            let year_dir = month_dir.parent()?;
            let month_ok = month_dir.file_name()?.to_str()? == format!("{:02}", created_at.month());
            let year_ok = year_dir.file_name()?.to_str()? == format!("{:04}", created_at.year());
            if !(month_ok && year_ok) {
                debug!("Skipping misplaced backup directory {}", path.display());
                return None;
            }

            Some(BackupRecord { path, created_at })
        })
        .collect();

    backups.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.path.cmp(&a.path))
    });

    info!(
        "Found {} backups under {}",
        backups.len(),
        backup_root.display()
    );
    Ok(backups)
}

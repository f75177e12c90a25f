use crate::models::error::{Result, TimeMachineError};
use crate::service::backup::{create_backup, BackupReport};
use crate::service::content::storage_file_path;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Where to put the safety snapshot taken before a restore.
#[derive(Debug, Clone)]
pub struct SnapshotTarget {
    pub backup_root: PathBuf,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub restored_file: PathBuf,
    pub snapshot: Option<BackupReport>,
}

/// Overwrites `live_config/.storage/file_name` with `content`.
///
/// With a snapshot target the whole live config is backed up first, and the live file is
/// only written once that succeeded.
pub fn restore_dashboard_file(
    live_config: &Path,
    file_name: &str,
    content: &str,
    snapshot: Option<&SnapshotTarget>,
) -> Result<RestoreReport> {
    let snapshot = match snapshot {
        Some(target) => {
            info!(
                "Taking safety snapshot of {} before restoring {}",
                live_config.display(),
                file_name
            );
            let report = create_backup(live_config, &target.backup_root, &target.timezone)
                .map_err(|e| TimeMachineError::SnapshotFailed(Box::new(e)))?;
            Some(report)
        }
        None => None,
    };

    let restored_file = storage_file_path(live_config, file_name);
    fs::write(&restored_file, content).map_err(|cause| TimeMachineError::FileWrite {
        path: restored_file.clone(),
        cause,
    })?;
    info!("Restored {}", restored_file.display());

    Ok(RestoreReport {
        restored_file,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::backup::STORAGE_DIR;
    use tempfile::TempDir;

    fn live_with_dashboard(content: &str) -> TempDir {
        let live = TempDir::new().unwrap();
        fs::write(live.path().join("configuration.yaml"), "a: 1\n").unwrap();
        fs::create_dir_all(live.path().join(STORAGE_DIR)).unwrap();
        fs::write(live.path().join(".storage/lovelace.dashboard"), content).unwrap();
        live
    }

    #[test]
    fn test_restore_without_snapshot_overwrites() {
        let live = live_with_dashboard("old");

        let report = restore_dashboard_file(live.path(), "lovelace.dashboard", "new", None).unwrap();

        assert!(report.snapshot.is_none());
        assert_eq!(fs::read_to_string(report.restored_file).unwrap(), "new");
    }

    #[test]
    fn test_restore_snapshots_before_overwriting() {
        let live = live_with_dashboard("old");
        let root = TempDir::new().unwrap();
        let target = SnapshotTarget {
            backup_root: root.path().to_path_buf(),
            timezone: "UTC".to_string(),
        };

        let report =
            restore_dashboard_file(live.path(), "lovelace.dashboard", "new", Some(&target)).unwrap();

        let snapshot = report.snapshot.unwrap();
        assert!(snapshot.backup_dir.starts_with(root.path()));
        assert_eq!(
            fs::read_to_string(snapshot.backup_dir.join(".storage/lovelace.dashboard")).unwrap(),
            "old"
        );
        assert_eq!(
            fs::read_to_string(live.path().join(".storage/lovelace.dashboard")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_failed_snapshot_leaves_live_file_untouched() {
        let live = live_with_dashboard("old");
        let scratch = TempDir::new().unwrap();
        // a regular file where the backup root should be makes directory creation fail
        let blocked_root = scratch.path().join("not-a-dir");
        fs::write(&blocked_root, "x").unwrap();
        let target = SnapshotTarget {
            backup_root: blocked_root,
            timezone: "UTC".to_string(),
        };

        let result = restore_dashboard_file(live.path(), "lovelace.dashboard", "new", Some(&target));

        assert!(matches!(result, Err(TimeMachineError::SnapshotFailed(_))));
        assert_eq!(
            fs::read_to_string(live.path().join(".storage/lovelace.dashboard")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_restore_into_missing_storage_dir_fails() {
        let live = TempDir::new().unwrap();
        let result = restore_dashboard_file(live.path(), "lovelace", "{}", None);
        assert!(matches!(result, Err(TimeMachineError::FileWrite { .. })));
    }
}

use crate::models::backup_record::TIMESTAMP_FORMAT;
use crate::models::error::{Result, TimeMachineError};
use crate::utils::path_guard::DASHBOARD_PREFIX;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hidden subdirectory Home Assistant keeps dashboard storage files in.
pub const STORAGE_DIR: &str = ".storage";

/// Outcome of a backup pass. `warnings` collects the dashboard copies that were skipped.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub backup_dir: PathBuf,
    pub yaml_files: Vec<String>,
    pub dashboard_files: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn parse_timezone(timezone: &str) -> Result<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| TimeMachineError::InvalidTimezone(timezone.to_string()))
}

/// Snapshot directory for `now` rendered in `tz`: `root/YYYY/MM/YYYY-MM-DD-HHMMSS`.
pub fn backup_dir_for(backup_root: &Path, now: DateTime<Utc>, tz: Tz) -> PathBuf {
    let local = now.with_timezone(&tz);
    backup_root
        .join(local.format("%Y").to_string())
        .join(local.format("%m").to_string())
        .join(local.format(TIMESTAMP_FORMAT).to_string())
}

pub fn create_backup(live_config: &Path, backup_root: &Path, timezone: &str) -> Result<BackupReport> {
    let tz = parse_timezone(timezone)?;
    create_backup_at(live_config, backup_root, tz, Utc::now())
}

pub fn create_backup_at(
    live_config: &Path,
    backup_root: &Path,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<BackupReport> {
    let backup_dir = backup_dir_for(backup_root, now, tz);
    info!(
        "Creating backup of {} in {}",
        live_config.display(),
        backup_dir.display()
    );
    create_dir(&backup_dir)?;

    let yaml_files = copy_yaml_files(live_config, &backup_dir)?;

    let backup_storage = backup_dir.join(STORAGE_DIR);
    create_dir(&backup_storage)?;

    let (dashboard_files, warnings) =
        copy_dashboard_files(&live_config.join(STORAGE_DIR), &backup_storage);

    info!(
        "Backup created at {} ({} yaml files, {} dashboard files, {} warnings)",
        backup_dir.display(),
        yaml_files.len(),
        dashboard_files.len(),
        warnings.len()
    );

    Ok(BackupReport {
        backup_dir,
        yaml_files,
        dashboard_files,
        warnings,
    })
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|cause| TimeMachineError::CreateDirectory {
        path: path.to_path_buf(),
        cause,
    })
}

/// Copies every top-level `*.yaml` file. Any failure here aborts the backup.
fn copy_yaml_files(live_config: &Path, backup_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(live_config).map_err(|cause| TimeMachineError::DirectoryRead {
        path: live_config.to_path_buf(),
        cause,
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|cause| TimeMachineError::DirectoryRead {
            path: live_config.to_path_buf(),
            cause,
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.ends_with(".yaml") {
            continue;
        }
        let source = entry.path();
        if !source.is_file() {
            continue;
        }

        let destination = backup_dir.join(&name);
        debug!("Copying {} to {}", source.display(), destination.display());
        fs::copy(&source, &destination).map_err(|cause| TimeMachineError::FileCopy {
            from: source.clone(),
            to: destination.clone(),
            cause,
        })?;
        copied.push(name);
    }
    copied.sort();
    Ok(copied)
}

/// Copies `lovelace*` entries from the live storage directory. Nothing here is fatal:
/// problems end up in the returned warnings.
fn copy_dashboard_files(live_storage: &Path, backup_storage: &Path) -> (Vec<String>, Vec<String>) {
    let entries = match fs::read_dir(live_storage) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Error reading {} directory, skipping dashboard files: {}",
                live_storage.display(),
                e
            );
            return (
                Vec::new(),
                vec![format!("{}: {}", live_storage.display(), e)],
            );
        }
    };

    let names: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => entry.file_name().to_str().map(str::to_string),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", live_storage.display(), e);
                None
            }
        })
        .filter(|name| name.starts_with(DASHBOARD_PREFIX))
        .collect();

    let (mut copied, warnings) = names.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut copied, mut warnings), name| {
            let source = live_storage.join(&name);
            let destination = backup_storage.join(&name);
            match fs::copy(&source, &destination) {
                Ok(_) => copied.push(name),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} disappeared before it could be copied", source.display());
                    warnings.push(format!("{}: vanished during backup", name));
                }
                Err(e) => {
                    warn!("Error copying {}: {}", source.display(), e);
                    warnings.push(format!("{}: {}", name, e));
                }
            }
            (copied, warnings)
        },
    );
    copied.sort();
    (copied, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn live_config() -> TempDir {
        let live = TempDir::new().unwrap();
        fs::write(live.path().join("configuration.yaml"), "homeassistant:\n  name: Home\n").unwrap();
        fs::write(live.path().join("automations.yaml"), "- id: x\n  alias: Morning\n").unwrap();
        fs::write(live.path().join("secrets.txt"), "not yaml").unwrap();
        fs::write(live.path().join("notes.yml"), "wrong extension").unwrap();
        fs::create_dir_all(live.path().join("packages.yaml")).unwrap();
        fs::create_dir_all(live.path().join(STORAGE_DIR)).unwrap();
        fs::write(live.path().join(".storage/lovelace"), r#"{"data":{}}"#).unwrap();
        fs::write(live.path().join(".storage/lovelace.dashboard_energy"), "{}").unwrap();
        fs::write(live.path().join(".storage/auth"), "secret").unwrap();
        live
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 15).unwrap()
    }

    #[test]
    fn test_backup_dir_layout() {
        let dir = backup_dir_for(Path::new("/backups"), fixed_now(), chrono_tz::UTC);
        assert_eq!(dir, PathBuf::from("/backups/2024/05/2024-05-17-093015"));
    }

    #[test]
    fn test_backup_dir_uses_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 2, 30, 0).unwrap();
        let tz = parse_timezone("America/New_York").unwrap();
        let dir = backup_dir_for(Path::new("/backups"), now, tz);
        assert_eq!(dir, PathBuf::from("/backups/2023/12/2023-12-31-213000"));
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let result = create_backup(Path::new("/config"), Path::new("/backups"), "Nowhere/City");
        assert!(matches!(result, Err(TimeMachineError::InvalidTimezone(_))));
    }

    #[test]
    fn test_copies_only_top_level_yaml_files() {
        let live = live_config();
        let root = TempDir::new().unwrap();

        let report = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert_eq!(
            report.backup_dir,
            root.path().join("2024").join("05").join("2024-05-17-093015")
        );
        assert_eq!(report.yaml_files, vec!["automations.yaml", "configuration.yaml"]);
        for name in &report.yaml_files {
            assert_eq!(
                fs::read(live.path().join(name)).unwrap(),
                fs::read(report.backup_dir.join(name)).unwrap()
            );
        }
        assert!(!report.backup_dir.join("secrets.txt").exists());
        assert!(!report.backup_dir.join("notes.yml").exists());
        assert!(!report.backup_dir.join("packages.yaml").exists());
    }

    #[test]
    fn test_copies_only_dashboard_storage_files() {
        let live = live_config();
        let root = TempDir::new().unwrap();

        let report = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert_eq!(
            report.dashboard_files,
            vec!["lovelace", "lovelace.dashboard_energy"]
        );
        let storage = report.backup_dir.join(STORAGE_DIR);
        assert_eq!(
            fs::read_to_string(storage.join("lovelace")).unwrap(),
            r#"{"data":{}}"#
        );
        assert!(!storage.join("auth").exists());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_storage_dir_is_not_fatal() {
        let live = TempDir::new().unwrap();
        fs::write(live.path().join("configuration.yaml"), "a: 1\n").unwrap();
        let root = TempDir::new().unwrap();

        let report = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert!(report.backup_dir.join(STORAGE_DIR).is_dir());
        assert!(report.dashboard_files.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_dashboard_copy_errors_are_collected() {
        let live = live_config();
        // a directory cannot be copied with fs::copy
        fs::create_dir_all(live.path().join(".storage/lovelace_resources")).unwrap();
        let root = TempDir::new().unwrap();

        let report = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert_eq!(report.dashboard_files.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("lovelace_resources"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dashboard_file_vanishing_mid_backup_is_a_warning() {
        let live = live_config();
        // listed by read_dir, but copying it hits NotFound
        std::os::unix::fs::symlink(
            live.path().join(".storage/lovelace.deleted"),
            live.path().join(".storage/lovelace.gone"),
        )
        .unwrap();
        let root = TempDir::new().unwrap();

        let report = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert_eq!(
            report.dashboard_files,
            vec!["lovelace", "lovelace.dashboard_energy"]
        );
        assert_eq!(report.warnings, vec!["lovelace.gone: vanished during backup"]);
        assert!(!report.backup_dir.join(STORAGE_DIR).join("lovelace.gone").exists());
    }

    #[test]
    fn test_missing_live_dir_is_fatal() {
        let root = TempDir::new().unwrap();
        let result = create_backup_at(
            Path::new("/this/does/not/exist"),
            root.path(),
            chrono_tz::UTC,
            fixed_now(),
        );
        assert!(matches!(result, Err(TimeMachineError::DirectoryRead { .. })));
    }

    #[test]
    fn test_repeated_backup_in_same_second_reuses_directory() {
        let live = live_config();
        let root = TempDir::new().unwrap();

        let first = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();
        let second = create_backup_at(live.path(), root.path(), chrono_tz::UTC, fixed_now()).unwrap();

        assert_eq!(first.backup_dir, second.backup_dir);
    }
}

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// Layout of a snapshot directory name, e.g. `2024-05-17-093015`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// A snapshot directory discovered under a backup root.
///
/// `created_at` is wall-clock time in whatever timezone the snapshot was taken with;
/// the directory name carries no offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub path: PathBuf,
    pub created_at: NaiveDateTime,
}

impl BackupRecord {
    /// Parses a snapshot directory name back into its timestamp.
    pub fn parse_timestamp(name: &str) -> Option<NaiveDateTime> {
        // %Y accepts more than four digits, the layout does not
        if name.len() != "YYYY-MM-DD-HHMMSS".len() {
            return None;
        }
        NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).ok()
    }
}

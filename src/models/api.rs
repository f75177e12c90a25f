use crate::models::backup_record::BackupRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request body for POST /api/backup-now
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackupRequest {
    pub live_folder_path: Option<String>,
    pub backup_folder_path: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackupResponse {
    pub message: String,
    pub backup_dir: String,
    pub yaml_files: Vec<String>,
    pub dashboard_files: Vec<String>,
    pub warnings: Vec<String>,
}

/// Request body for POST /api/scan-backups
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanBackupsRequest {
    pub backup_root_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanBackupsResponse {
    pub backups: Vec<BackupRecord>,
}

/// Request body for POST /api/get-backup-lovelace
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDashboardFilesRequest {
    pub backup_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDashboardFilesResponse {
    pub lovelace_files: Vec<String>,
}

/// Request body for POST /api/get-backup-lovelace-file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBackupFileRequest {
    pub backup_path: Option<String>,
    pub file_name: Option<String>,
    /// Raw content unless set
    #[serde(default)]
    pub normalize: bool,
}

/// Request body for POST /api/get-live-lovelace-file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadLiveFileRequest {
    pub live_config_path: Option<String>,
    pub file_name: Option<String>,
    /// Normalized content unless set to false
    #[serde(default = "bool_true")]
    pub normalize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContentResponse {
    pub content: String,
}

/// Request body for POST /api/restore-lovelace-file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFileRequest {
    pub live_config_path: Option<String>,
    pub file_name: Option<String>,
    pub content: Option<String>,
    /// Takes a safety snapshot into this root before overwriting
    pub backup_root_path: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFileResponse {
    pub message: String,
    pub snapshot_dir: Option<String>,
}

/// Request body for POST /api/get-live-items
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveItemsRequest {
    pub live_config_path: Option<String>,
    pub item_identifiers: Option<Vec<String>>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveItemsResponse {
    pub live_items: BTreeMap<String, serde_json::Value>,
}

/// Request body for POST /api/reload-home-assistant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCallRequest {
    pub ha_url: Option<String>,
    pub ha_token: Option<String>,
    pub service: Option<String>,
    /// Dispatch without waiting for Home Assistant to answer
    #[serde(default)]
    pub background: bool,
}

/// Request body for POST /api/restart-home-assistant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartRequest {
    pub ha_url: Option<String>,
    pub ha_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

const fn bool_true() -> bool {
    true
}

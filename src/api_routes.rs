use crate::api_state::{missing, AppState};
use crate::models::api::*;
use crate::models::config_item::ItemMode;
use crate::models::error::TimeMachineError;
use crate::service::backup::create_backup;
use crate::service::config_items::get_live_items;
use crate::service::content::{list_dashboard_files, read_dashboard_file, ReadMode};
use crate::service::home_assistant::{Dispatch, RESTART_SERVICE};
use crate::service::restore::{restore_dashboard_file, SnapshotTarget};
use crate::service::scanner::scan_backups;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, State};
use std::error::Error;

type ApiResult<T> = Result<Json<T>, TimeMachineError>;

impl<'r> Responder<'r, 'static> for TimeMachineError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            log::error!("{} {} failed: {}", request.method(), request.uri(), self);
        } else {
            log::warn!("{} {} rejected: {}", request.method(), request.uri(), self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            details: self.source().map(|cause| cause.to_string()),
        };
        (status, Json(body)).respond_to(request)
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, TimeMachineError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(field))
}

/// POST /api/backup-now - Snapshot the live config into the backup root
#[post("/backup-now", format = "json", data = "<request>")]
pub fn backup_now(
    request: Json<CreateBackupRequest>,
    state: &State<AppState>,
) -> ApiResult<CreateBackupResponse> {
    let live = state.live_config_path(request.live_folder_path.as_deref(), "liveFolderPath")?;
    let root = state.backup_root_path(request.backup_folder_path.as_deref(), "backupFolderPath")?;
    let timezone = state.timezone(request.timezone.as_deref());

    let report = create_backup(&live, &root, &timezone)?;
    let backup_dir = report.backup_dir.display().to_string();

    Ok(Json(CreateBackupResponse {
        message: format!("Backup created successfully at {}", backup_dir),
        backup_dir,
        yaml_files: report.yaml_files,
        dashboard_files: report.dashboard_files,
        warnings: report.warnings,
    }))
}

/// POST /api/scan-backups - List snapshots, most recent first
#[post("/scan-backups", format = "json", data = "<request>")]
pub fn scan_backups_endpoint(
    request: Json<ScanBackupsRequest>,
    state: &State<AppState>,
) -> ApiResult<ScanBackupsResponse> {
    let root = state.backup_root_path(request.backup_root_path.as_deref(), "backupRootPath")?;
    let backups = scan_backups(&root)?;
    Ok(Json(ScanBackupsResponse { backups }))
}

/// POST /api/get-backup-lovelace - Dashboard files stored in a snapshot
#[post("/get-backup-lovelace", format = "json", data = "<request>")]
pub fn get_backup_lovelace(
    request: Json<ListDashboardFilesRequest>,
    state: &State<AppState>,
) -> ApiResult<ListDashboardFilesResponse> {
    let backup = state.guard().check(required(&request.backup_path, "backupPath")?)?;
    let lovelace_files = list_dashboard_files(&backup)?;
    Ok(Json(ListDashboardFilesResponse { lovelace_files }))
}

/// POST /api/get-backup-lovelace-file - Read a dashboard file from a snapshot
#[post("/get-backup-lovelace-file", format = "json", data = "<request>")]
pub fn get_backup_lovelace_file(
    request: Json<ReadBackupFileRequest>,
    state: &State<AppState>,
) -> ApiResult<FileContentResponse> {
    let backup = state.guard().check(required(&request.backup_path, "backupPath")?)?;
    let file_name = required(&request.file_name, "fileName")?;
    state.guard().check_file_name(file_name)?;

    let content = read_dashboard_file(&backup, file_name, ReadMode::from_flag(request.normalize))?;
    Ok(Json(FileContentResponse { content }))
}

/// POST /api/get-live-lovelace-file - Read a dashboard file from the live config
#[post("/get-live-lovelace-file", format = "json", data = "<request>")]
pub fn get_live_lovelace_file(
    request: Json<ReadLiveFileRequest>,
    state: &State<AppState>,
) -> ApiResult<FileContentResponse> {
    let live = state.live_config_path(request.live_config_path.as_deref(), "liveConfigPath")?;
    let file_name = required(&request.file_name, "fileName")?;
    state.guard().check_file_name(file_name)?;

    let content = read_dashboard_file(&live, file_name, ReadMode::from_flag(request.normalize))?;
    Ok(Json(FileContentResponse { content }))
}

/// POST /api/restore-lovelace-file - Overwrite a live dashboard file
#[post("/restore-lovelace-file", format = "json", data = "<request>")]
pub fn restore_lovelace_file(
    request: Json<RestoreFileRequest>,
    state: &State<AppState>,
) -> ApiResult<RestoreFileResponse> {
    let live = state.live_config_path(request.live_config_path.as_deref(), "liveConfigPath")?;
    let file_name = required(&request.file_name, "fileName")?;
    state.guard().check_file_name(file_name)?;
    // Written verbatim, so only an empty string counts as missing
    let content = request
        .content
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing("content"))?;

    let snapshot = match request.backup_root_path.as_deref() {
        Some(root) if !root.trim().is_empty() => Some(SnapshotTarget {
            backup_root: state.guard().check(root)?,
            timezone: state.timezone(request.timezone.as_deref()),
        }),
        _ => None,
    };

    let report = restore_dashboard_file(&live, file_name, content, snapshot.as_ref())?;
    let snapshot_dir = report
        .snapshot
        .map(|s| s.backup_dir.display().to_string());

    Ok(Json(RestoreFileResponse {
        message: format!("File restored successfully to {}", report.restored_file.display()),
        snapshot_dir,
    }))
}

/// POST /api/get-live-items - Current automations or scripts by identifier
#[post("/get-live-items", format = "json", data = "<request>")]
pub fn get_live_items_endpoint(
    request: Json<LiveItemsRequest>,
    state: &State<AppState>,
) -> ApiResult<LiveItemsResponse> {
    let live = state.live_config_path(request.live_config_path.as_deref(), "liveConfigPath")?;
    let identifiers = request
        .item_identifiers
        .as_ref()
        .ok_or_else(|| missing("itemIdentifiers"))?;
    let mode: ItemMode = required(&request.mode, "mode")?.parse()?;

    let live_items = get_live_items(&live, identifiers, mode)?;
    Ok(Json(LiveItemsResponse { live_items }))
}

/// POST /api/reload-home-assistant - Call a Home Assistant service
#[post("/reload-home-assistant", format = "json", data = "<request>")]
pub async fn reload_home_assistant(
    request: Json<ServiceCallRequest>,
    state: &State<AppState>,
) -> ApiResult<MessageResponse> {
    let service = required(&request.service, "service")?;
    let client = state.home_assistant(request.ha_url.as_deref(), request.ha_token.as_deref())?;
    log::info!("Service received: {}", service);

    let message = match client.invoke(service, request.background).await? {
        Dispatch::Completed => format!("Home Assistant {} completed successfully", service),
        Dispatch::Background => format!("Home Assistant {} initiated successfully", service),
    };
    Ok(Json(MessageResponse { message }))
}

/// POST /api/restart-home-assistant - Restart Home Assistant without waiting for it
#[post("/restart-home-assistant", format = "json", data = "<request>")]
pub async fn restart_home_assistant(
    request: Json<RestartRequest>,
    state: &State<AppState>,
) -> ApiResult<MessageResponse> {
    let client = state.home_assistant(request.ha_url.as_deref(), request.ha_token.as_deref())?;
    client.spawn_service(RESTART_SERVICE)?;
    Ok(Json(MessageResponse {
        message: "Home Assistant is restarting".to_string(),
    }))
}

/// GET /api/health - Health check endpoint
#[get("/health")]
pub fn health_check() -> &'static str {
    "OK"
}

/// Unmatched JSON bodies still answer with the error shape.
#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request<'_>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: status.reason_lossy().to_string(),
        details: None,
    })
}

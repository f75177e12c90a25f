use rocket::http::Status;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeMachineError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    MissingParameters(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Invalid service '{0}', expected '<domain>.<service>'")]
    InvalidService(String),

    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to create directory '{path}': {cause}")]
    CreateDirectory { path: PathBuf, cause: io::Error },

    #[error("Failed to read directory '{path}': {cause}")]
    DirectoryRead { path: PathBuf, cause: io::Error },

    #[error("Failed to copy file from '{from}' to '{to}': {cause}")]
    FileCopy {
        from: PathBuf,
        to: PathBuf,
        cause: io::Error,
    },

    #[error("Failed to read file '{path}': {cause}")]
    FileRead { path: PathBuf, cause: io::Error },

    #[error("Failed to write file '{path}': {cause}")]
    FileWrite { path: PathBuf, cause: io::Error },

    #[error("Failed to parse '{path}': {cause}")]
    YamlParse {
        path: PathBuf,
        cause: serde_yaml::Error,
    },

    #[error("Failed to serialize document: {0}")]
    YamlSerialize(#[source] serde_yaml::Error),

    #[error("{} is not in the expected format: {reason}", .path.display())]
    UnexpectedFormat { path: PathBuf, reason: String },

    #[error("Safety snapshot failed, live file left untouched: {0}")]
    SnapshotFailed(#[source] Box<TimeMachineError>),

    #[error("Home Assistant responded with {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Home Assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl TimeMachineError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            TimeMachineError::MissingParameters(_)
            | TimeMachineError::InvalidPath(_)
            | TimeMachineError::InvalidTimezone(_)
            | TimeMachineError::UnsupportedMode(_)
            | TimeMachineError::InvalidService(_) => Status::BadRequest,
            TimeMachineError::NotFound { .. } => Status::NotFound,
            TimeMachineError::Upstream { status, .. } => {
                Status::from_code(*status).unwrap_or(Status::BadGateway)
            }
            TimeMachineError::SnapshotFailed(inner) => {
                if inner.status() == Status::BadRequest {
                    Status::BadRequest
                } else {
                    Status::InternalServerError
                }
            }
            _ => Status::InternalServerError,
        }
    }
}

/// Maps an I/O failure on `path` to `NotFound` when the file is absent, otherwise to the
/// variant built by `other`.
pub fn not_found_or(
    path: PathBuf,
    cause: io::Error,
    other: impl FnOnce(PathBuf, io::Error) -> TimeMachineError,
) -> TimeMachineError {
    if cause.kind() == io::ErrorKind::NotFound {
        TimeMachineError::NotFound { path }
    } else {
        other(path, cause)
    }
}

pub type Result<T> = std::result::Result<T, TimeMachineError>;

use crate::models::error::{not_found_or, Result, TimeMachineError};
use crate::service::backup::STORAGE_DIR;
use crate::utils::path_guard::DASHBOARD_PREFIX;
use log::debug;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// File text exactly as stored
    Raw,

    /// Canonical YAML, suitable for textual comparison
    Normalized,
}

impl ReadMode {
    pub fn from_flag(normalize: bool) -> Self {
        if normalize {
            ReadMode::Normalized
        } else {
            ReadMode::Raw
        }
    }
}

pub fn storage_file_path(base_dir: &Path, file_name: &str) -> PathBuf {
    base_dir.join(STORAGE_DIR).join(file_name)
}

/// Reads `base_dir/.storage/file_name`, where `base_dir` is a backup or the live config.
pub fn read_dashboard_file(base_dir: &Path, file_name: &str, mode: ReadMode) -> Result<String> {
    let path = storage_file_path(base_dir, file_name);
    debug!("Reading {} ({:?})", path.display(), mode);

    let text = fs::read_to_string(&path).map_err(|cause| {
        not_found_or(path.clone(), cause, |path, cause| TimeMachineError::FileRead {
            path,
            cause,
        })
    })?;

    match mode {
        ReadMode::Raw => Ok(text),
        ReadMode::Normalized => normalize_document(&text).map_err(|e| match e {
            TimeMachineError::YamlParse { cause, .. } => TimeMachineError::YamlParse { path, cause },
            other => other,
        }),
    }
}

/// Dashboard files stored in `backup_dir/.storage`, sorted by name.
pub fn list_dashboard_files(backup_dir: &Path) -> Result<Vec<String>> {
    let storage = backup_dir.join(STORAGE_DIR);
    let entries = fs::read_dir(&storage).map_err(|cause| {
        not_found_or(storage.clone(), cause, |path, cause| {
            TimeMachineError::DirectoryRead { path, cause }
        })
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|cause| TimeMachineError::DirectoryRead {
            path: storage.clone(),
            cause,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(DASHBOARD_PREFIX) && entry.path().is_file() {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Parses `text` as YAML (JSON included) and re-serializes it with every mapping's keys
/// sorted. Aliases are expanded while parsing and never emitted again.
pub fn normalize_document(text: &str) -> Result<String> {
    let value: Value = serde_yaml::from_str(text).map_err(|cause| TimeMachineError::YamlParse {
        path: PathBuf::new(),
        cause,
    })?;
    serde_yaml::to_string(&sort_keys(value)).map_err(TimeMachineError::YamlSerialize)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping
                .into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect();
            entries.sort_by_cached_key(|(k, _)| key_text(k));
            let mut sorted = Mapping::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Mapping(sorted)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
        Value::Tagged(mut tagged) => {
            tagged.value = sort_keys(std::mem::take(&mut tagged.value));
            Value::Tagged(tagged)
        }
        scalar => scalar,
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

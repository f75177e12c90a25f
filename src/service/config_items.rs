use crate::models::config_item::ItemMode;
use crate::models::error::{not_found_or, Result, TimeMachineError};
use log::debug;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Looks up automations or scripts in the live config by identifier.
///
/// Identifiers that match nothing are left out of the result.
pub fn get_live_items(
    live_config: &Path,
    identifiers: &[String],
    mode: ItemMode,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let path = live_config.join(mode.file_name());
    let text = fs::read_to_string(&path).map_err(|cause| {
        not_found_or(path.clone(), cause, |path, cause| TimeMachineError::FileRead {
            path,
            cause,
        })
    })?;
    let document: Value = serde_yaml::from_str(&text).map_err(|cause| TimeMachineError::YamlParse {
        path: path.clone(),
        cause,
    })?;

    let found = match (mode, document) {
        (ItemMode::Automations, Value::Sequence(items)) => find_automations(&items, identifiers),
        (ItemMode::Scripts, Value::Mapping(scripts)) => find_scripts(&scripts, identifiers),
        (_, other) => {
            return Err(TimeMachineError::UnexpectedFormat {
                path,
                reason: format!("top level is {}", describe(&other)),
            })
        }
    };
    debug!(
        "Matched {} of {} identifiers in {}",
        found.len(),
        identifiers.len(),
        path.display()
    );

    found
        .into_iter()
        .map(|(id, item)| {
            serde_json::to_value(&item)
                .map(|json| (id, json))
                .map_err(|e| TimeMachineError::UnexpectedFormat {
                    path: path.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn find_automations(items: &[Value], identifiers: &[String]) -> Vec<(String, Value)> {
    identifiers
        .iter()
        .filter_map(|id| {
            items
                .iter()
                .find(|item| field_matches(item, "id", id) || field_matches(item, "alias", id))
                .map(|item| (id.clone(), item.clone()))
        })
        .collect()
}

fn find_scripts(scripts: &Mapping, identifiers: &[String]) -> Vec<(String, Value)> {
    identifiers
        .iter()
        .filter_map(|id| {
            let script = scripts.get(id.as_str())?;
            let mut item = Mapping::new();
            item.insert(Value::String("id".to_string()), Value::String(id.clone()));
            if let Value::Mapping(fields) = script {
                for (k, v) in fields {
                    item.insert(k.clone(), v.clone());
                }
            }
            Some((id.clone(), Value::Mapping(item)))
        })
        .collect()
}

/// Automation ids are usually quoted strings but unquoted numeric ids parse as numbers.
fn field_matches(item: &Value, field: &str, expected: &str) -> bool {
    match item.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "empty",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

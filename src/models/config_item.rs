use crate::models::error::TimeMachineError;
use std::str::FromStr;

/// Which live YAML source a config item lookup reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMode {
    /// `automations.yaml`, a list of records matched by `id` or `alias`
    Automations,

    /// `scripts.yaml`, a mapping keyed by script id
    Scripts,
}

impl ItemMode {
    pub fn file_name(&self) -> &'static str {
        match self {
            ItemMode::Automations => "automations.yaml",
            ItemMode::Scripts => "scripts.yaml",
        }
    }
}

impl FromStr for ItemMode {
    type Err = TimeMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automations" => Ok(ItemMode::Automations),
            "scripts" => Ok(ItemMode::Scripts),
            other => Err(TimeMachineError::UnsupportedMode(other.to_string())),
        }
    }
}

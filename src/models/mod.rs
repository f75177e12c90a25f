pub mod api;
pub mod backup_record;
pub mod config;
pub mod config_item;
pub mod config_validator;
pub mod error;

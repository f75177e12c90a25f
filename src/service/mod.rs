pub mod backup;
pub mod config_items;
pub mod content;
pub mod home_assistant;
pub mod restore;
pub mod scanner;

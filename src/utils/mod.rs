pub mod directory;
pub mod path_guard;
pub mod progress;

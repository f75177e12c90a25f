use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories exactly `depth` levels below `dir`. Unreadable entries are logged and skipped.
pub fn get_dirs_at_depth(dir: &Path, depth: usize) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(depth)
        .max_depth(depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!("Skipping unreadable entry under {}: {}", dir.display(), e))
                .ok()
        })
    {
        if entry.file_type().is_dir() {
            dirs.push(entry.path().to_path_buf());
        }
    }
    dirs
}

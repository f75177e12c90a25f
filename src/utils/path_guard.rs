use crate::models::error::{Result, TimeMachineError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name prefix shared by every dashboard storage file.
pub const DASHBOARD_PREFIX: &str = "lovelace";

/// Returns false when `path` contains a parent-directory sequence.
pub fn validate(path: &str) -> bool {
    !path.contains("..")
}

/// Dashboard file names are a single component starting with [`DASHBOARD_PREFIX`].
pub fn is_dashboard_file_name(name: &str) -> bool {
    validate(name)
        && !name.contains('/')
        && !name.contains('\\')
        && name.starts_with(DASHBOARD_PREFIX)
}

/// Checks user-supplied paths before any filesystem access.
///
/// Without allowed roots only the traversal check applies. With roots configured, paths
/// are resolved to their canonical form and must land inside one of them.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    allowed_roots: Vec<PathBuf>,
}

impl PathGuard {
    pub fn new<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut allowed_roots = Vec::new();
        for root in roots {
            let root = root.as_ref();
            let canonical = fs::canonicalize(root).map_err(|_| {
                TimeMachineError::InvalidConfig(format!(
                    "Allowed root cannot be resolved: {}",
                    root.display()
                ))
            })?;
            allowed_roots.push(canonical);
        }
        Ok(Self { allowed_roots })
    }

    pub fn check(&self, path: &str) -> Result<PathBuf> {
        if path.trim().is_empty() || !validate(path) {
            return Err(TimeMachineError::InvalidPath(path.to_string()));
        }
        if self.allowed_roots.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let resolved = resolve(Path::new(path))
            .ok_or_else(|| TimeMachineError::InvalidPath(path.to_string()))?;
        if self
            .allowed_roots
            .iter()
            .any(|root| resolved.starts_with(root))
        {
            Ok(resolved)
        } else {
            Err(TimeMachineError::InvalidPath(format!(
                "{} is outside the allowed roots",
                path
            )))
        }
    }

    pub fn check_file_name(&self, name: &str) -> Result<()> {
        if is_dashboard_file_name(name) {
            Ok(())
        } else {
            Err(TimeMachineError::InvalidPath(format!(
                "{} is not a dashboard file name",
                name
            )))
        }
    }
}

/// Canonicalizes the deepest existing ancestor and re-attaches the remaining components,
/// so paths that are about to be created can still be checked.
fn resolve(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut pending = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(canonical) => {
                let mut resolved = canonical;
                for component in pending.iter().rev() {
                    resolved.push(component);
                }
                return Some(resolved);
            }
            Err(_) => {
                let name = existing.file_name()?;
                pending.push(name.to_os_string());
                existing = existing.parent()?;
            }
        }
    }
}

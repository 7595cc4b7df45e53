use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("failed to write {path:?}: {source}")]
pub struct OutputError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Replace `path` with `contents`.
///
/// The text goes to a temporary file next to `path` first and is renamed
/// over it, so readers never see a half-written table. An existing file keeps
/// its permissions; a new one gets `0644`.
pub fn write_table(path: &Path, contents: &str) -> Result<(), OutputError> {
    let err = |source| OutputError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(err)?;
    if let Some(perms) = target_permissions(path) {
        tmp.as_file().set_permissions(perms).map_err(err)?;
    }
    tmp.write_all(contents.as_bytes()).map_err(err)?;
    tmp.flush().map_err(err)?;
    tmp.persist(path).map_err(|e| err(e.error))?;

    info!(bytes = contents.len(), "Wrote table to {}", path.display());
    Ok(())
}

fn target_permissions(path: &Path) -> Option<Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        #[cfg(unix)]
        Err(_) => {
            use std::os::unix::fs::PermissionsExt;
            Some(Permissions::from_mode(0o644))
        }
        #[cfg(not(unix))]
        Err(_) => None,
    }
}

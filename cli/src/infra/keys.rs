//! Local identity file resolution.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::RemoteError;

/// Expands a leading `~` to the current user's home directory.
///
/// # Errors
///
/// Returns `RemoteError::Auth` if the path starts with `~` and the home
/// directory cannot be determined.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs::home_dir()
        .ok_or_else(|| RemoteError::Auth("cannot determine home directory".to_string()))?;
    Ok(home.join(rest))
}

/// Resolves an identity setting to an existing private key file.
///
/// # Errors
///
/// Returns `RemoteError::Auth` if the file does not exist.
pub fn resolve_identity(identity: &Path) -> Result<PathBuf> {
    let key = expand_home(identity)?;
    if !key.is_file() {
        return Err(RemoteError::Auth(format!("identity file {} not found", key.display())).into());
    }
    Ok(key)
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use serde::{Serialize, de::DeserializeOwned};

use super::StoreError;

/// Reads a JSON value, or returns `default` when `path` does not exist.
pub fn read_json<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    default: T,
) -> Result<T, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(default);
    }
    let contents = fs::read_to_string(path)
        .map_err(|err| StoreError::Read(err, path.display().to_string()))?;
    serde_json::from_str(&contents)
        .map_err(|err| StoreError::ParseJson(err, path.display().to_string()))
}

/// Writes `value` as indented JSON followed by a newline, creating the parent
/// folders first.
pub fn write_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    create_parent(path)?;
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    fs::write(path, contents).map_err(|err| StoreError::Write(err, path.display().to_string()))?;
    info!("wrote {}", path.display());
    Ok(())
}

pub(crate) fn create_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| StoreError::NoCreateFolderPermission(err, parent.display().to_string())),
        _ => Ok(()),
    }
}

/// Closest ancestor of `start` holding a `.git` folder or a `Cargo.toml`.
pub fn repo_root(start: impl AsRef<Path>) -> PathBuf {
    let start = start.as_ref();
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists() || dir.join("Cargo.toml").exists())
        .unwrap_or(start)
        .to_path_buf()
}

// src/storage.rs
// =============================================================================
// Local storage layout: <root>/<package>/<distribution file>
//
// Directory creation is idempotent. Two packages in the same batch may race
// to create the same directory, and "already exists" counts as success.
// =============================================================================

use crate::error::{FetchError, InputError};
use crate::package::PackageName;
use std::path::{Path, PathBuf};

/// Makes sure the storage root exists and is a directory.
pub async fn ensure_storage_root(root: &Path) -> Result<(), InputError> {
    let fail = |reason: String| InputError::StorageRoot {
        path: root.to_path_buf(),
        reason,
    };

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| fail(e.to_string()))?;

    let metadata = tokio::fs::metadata(root)
        .await
        .map_err(|e| fail(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(fail("not a directory".to_string()));
    }
    Ok(())
}

pub async fn ensure_package_dir(root: &Path, package: &PackageName) -> Result<PathBuf, FetchError> {
    let dir = root.join(package.as_str());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| FetchError::Storage {
            path: dir.clone(),
            source,
        })?;
    Ok(dir)
}

// A distribution name comes straight from a remote page, so it must stay
// a plain file name inside the package directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

/// Writes one artifact, overwriting any earlier copy.
pub async fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, FetchError> {
    if !is_safe_file_name(name) {
        return Err(FetchError::UnsafeName {
            name: name.to_string(),
        });
    }

    let path = dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| FetchError::Storage {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

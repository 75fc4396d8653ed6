use std::{io::ErrorKind, path::PathBuf};

use crate::error::{archive as ArchiveError, Error};

/// Root directory archives are served from.
#[derive(Clone, Debug)]
pub struct Dir(PathBuf);

impl Dir {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    /// Resolve an archive identifier to a directory strictly inside the root.
    ///
    /// Identifiers must be a single plain path component. The resolved path
    /// is canonicalized so symlinks cannot escape the root either.
    pub async fn resolve(&self, id: &str) -> Result<PathBuf, Error> {
        if id.is_empty() || !sanitize_filename::is_sanitized(id) {
            log::debug!("Rejected archive identifier {:?}", id);
            return Err(ArchiveError::InvalidIdentifier);
        }

        let path = match tokio::fs::canonicalize(self.0.join(id)).await {
            Ok(path) => path,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ArchiveError::ArchiveNotFound)
            }
            Err(err) => {
                log::error!("Cannot canonicalize archive path for {:?}: {}", id, err);
                return Err(ArchiveError::PathResolve);
            }
        };
        let root = tokio::fs::canonicalize(&self.0).await.map_err(|err| {
            log::error!("Cannot canonicalize source root {}: {}", self.0.display(), err);
            ArchiveError::PathResolve
        })?;
        if path == root || !path.starts_with(&root) {
            log::debug!("Archive identifier {:?} escapes source root", id);
            return Err(ArchiveError::InvalidIdentifier);
        }

        match tokio::fs::metadata(&path).await {
            Ok(md) if md.is_dir() => Ok(path),
            Ok(_) => Err(ArchiveError::ArchiveNotFound),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ArchiveError::ArchiveNotFound),
            Err(_) => Err(ArchiveError::PathResolve),
        }
    }
}

//! File-backed credential cache
//!
//! Holds a single JSON-serialized [`TokenPair`]. The file is sensitive and
//! is written owner-readable only.

use crate::{AuthError, AuthResult, TokenPair};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persists the service's credential on the local filesystem
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted credential, `None` if nothing was stored yet
    pub async fn load(&self) -> AuthResult<Option<TokenPair>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored credential at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let tokens: TokenPair = serde_json::from_str(&json).map_err(|e| {
            AuthError::StorageError(format!(
                "Failed to parse credential at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Loaded credential from {}", self.path.display());
        Ok(Some(tokens))
    }

    /// Overwrite the persisted credential
    pub async fn save(&self, tokens: &TokenPair) -> AuthResult<()> {
        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AuthError::StorageError(format!("Failed to serialize tokens: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!("Stored credential at {}", self.path.display());
        Ok(())
    }

    /// Delete the persisted credential
    pub async fn delete(&self) -> AuthResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Deleted credential at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> AuthResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> AuthResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenPair {
        TokenPair {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1_900_000_000),
        }
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));

        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));

        let mut updated = sample();
        updated.access_token = "newer".to_string();
        store.save(&updated).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().access_token, "newer");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&sample()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "garbage").unwrap();

        let err = TokenStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, AuthError::StorageError(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&sample()).await.unwrap();

        store.delete().await.unwrap();
        store.delete().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}

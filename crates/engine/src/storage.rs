//! Where uploaded images and audio demos end up.
//!
//! The engine only needs four things from a storage backend: put bytes under
//! a folder, check that a stored path still exists, remove it, and turn it
//! into a public URL. [`LocalStorage`] keeps files on the local filesystem.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::sanitize_file_name};

/// Folder for plugin images.
pub const IMAGE_FOLDER: &str = "plugin_images";
/// Folder for audio demos.
pub const AUDIO_FOLDER: &str = "audio_demos";

#[async_trait]
pub trait MediaStorage: Send + Sync + std::fmt::Debug {
    /// Persist `bytes` and return the storage path to record in the database.
    async fn store(&self, folder: &str, file_name: &str, bytes: &[u8]) -> ResultEngine<String>;

    /// Whether `path` (as returned by [`store`](Self::store)) still exists.
    async fn exists(&self, path: &str) -> bool;

    async fn remove(&self, path: &str) -> ResultEngine<()>;

    fn url(&self, path: &str) -> String;
}

#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    /// Map a storage path to a filesystem path, refusing anything that would
    /// escape the root.
    fn resolve(&self, path: &str) -> ResultEngine<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(EngineError::Storage(format!("invalid storage path: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new("./media", "/media/")
    }
}

#[async_trait]
impl MediaStorage for LocalStorage {
    async fn store(&self, folder: &str, file_name: &str, bytes: &[u8]) -> ResultEngine<String> {
        let file_name = sanitize_file_name(file_name);
        let path = format!("{folder}/{}_{file_name}", Uuid::new_v4().simple());
        let target = self.resolve(&path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!("stored {} bytes at {path}", bytes.len());
        Ok(path)
    }

    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(target) => tokio::fs::try_exists(target).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn remove(&self, path: &str) -> ResultEngine<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let storage = LocalStorage::new("/tmp/media", "/media");
        assert_eq!(
            storage.url("plugin_images/a.png"),
            "/media/plugin_images/a.png"
        );
    }

    #[test]
    fn resolve_rejects_parent_components() {
        let storage = LocalStorage::default();
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("audio_demos/a.wav").is_ok());
    }

    #[tokio::test]
    async fn store_then_remove() {
        let root = std::env::temp_dir().join(format!("catalog_media_{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&root, "/media/");

        let path = storage
            .store(AUDIO_FOLDER, "demo loop.wav", b"RIFF")
            .await
            .unwrap();
        assert!(path.starts_with("audio_demos/"));
        assert!(path.ends_with("demo_loop.wav"));
        assert!(storage.exists(&path).await);

        storage.remove(&path).await.unwrap();
        assert!(!storage.exists(&path).await);
        // Removing twice is not an error.
        storage.remove(&path).await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }
}

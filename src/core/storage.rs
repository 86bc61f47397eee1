//! File storage hooks for campaign cover and gallery images.
//!
//! Paths are relative to a storage root and deterministic per campaign, so a new
//! upload under the same name replaces the old file instead of getting a suffix.

use crate::errors::{Error, Result};
use std::future::Future;
use std::path::{Component, Path, PathBuf};

/// An uploaded file as received from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original filename supplied by the user
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Backing store for uploaded images
pub trait FileStorage: Send + Sync {
    /// Writes `bytes` at `path`, replacing any existing file, and returns the stored path.
    fn save(&self, path: &str, bytes: &[u8]) -> impl Future<Output = Result<String>> + Send;

    /// Removes the file at `path`. Missing files are not an error.
    fn delete(&self, path: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Storage path for a campaign's cover image: `campaign/cover_image/<slug><ext>`.
#[must_use]
pub fn cover_image_path(slug: &str, filename: &str) -> String {
    format!("campaign/cover_image/{slug}{}", extension_of(filename))
}

/// Storage path for a gallery image: `campaign/gallery/<id>/<safe name>`.
#[must_use]
pub fn gallery_image_path(campaign_id: i64, filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    let base = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let safe_base = base.trim().replace(' ', "_");
    format!(
        "campaign/gallery/{campaign_id}/{safe_base}{}",
        extension_of(name)
    )
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Stores files on the local disk under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(Error::validation("file", format!("unsafe storage path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorage for LocalStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Overwrite in place; same name means same file.
        tokio::fs::write(&target, bytes).await?;
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_cover_image_path_uses_slug() {
        assert_eq!(
            cover_image_path("clean-water", "My Photo.JPG"),
            "campaign/cover_image/clean-water.jpg"
        );
        assert_eq!(
            cover_image_path("clean-water", "noext"),
            "campaign/cover_image/clean-water"
        );
    }

    #[test]
    fn test_gallery_image_path_replaces_spaces() {
        assert_eq!(
            gallery_image_path(7, " well site 1.png"),
            "campaign/gallery/7/well_site_1.png"
        );
        assert_eq!(
            gallery_image_path(7, "../../etc/passwd"),
            "campaign/gallery/7/passwd"
        );
    }

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let storage = LocalStorage::new("/tmp/media");
        assert!(storage.resolve("../secret").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
        assert!(storage.resolve("campaign/gallery/1/a.png").is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_overwrites_and_deletes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = LocalStorage::new(dir.path());

        let path = storage.save("campaign/cover_image/x.png", b"first").await?;
        storage.save(&path, b"second").await?;

        let on_disk = std::fs::read(dir.path().join(&path))?;
        assert_eq!(on_disk, b"second");

        storage.delete(&path).await?;
        assert!(!dir.path().join(&path).exists());

        // Deleting again is fine
        storage.delete(&path).await?;
        Ok(())
    }
}

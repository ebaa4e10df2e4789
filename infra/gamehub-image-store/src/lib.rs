use std::path::{Component, Path, PathBuf};

use gamehub_app::ports::image_storage::{
    ImageFolder, ImageStorageError, ImageStoragePort, ImageTransform, StoredImage,
};

const ROOT_FOLDER: &str = "gamehub";

/// Keeps uploads on the local disk under `root` and hands out URLs below `base_url`,
/// which the HTTP layer serves statically.
///
/// A public id is the path of the file relative to `root`, extension included,
/// e.g. `gamehub/avatars/3f2c....png`.
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new() -> Self {
        let root = std::env::var("GAMEHUB_IMAGE_DIR").expect("GAMEHUB_IMAGE_DIR env var not set");
        let base_url = std::env::var("GAMEHUB_IMAGE_BASE_URL")
            .expect("GAMEHUB_IMAGE_BASE_URL env var not set");
        Self::with_root(root, base_url)
    }

    pub fn with_root(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a public id onto a file below `root`. Ids that would escape it are refused.
    fn resolve(&self, public_id: &str) -> Option<PathBuf> {
        let relative = Path::new(public_id);
        let mut components = relative.components().peekable();
        components.peek()?;
        if components.any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn storage_error(e: std::io::Error) -> ImageStorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ImageStorageError::NotFound
    } else {
        ImageStorageError::Storage(e.to_string())
    }
}

#[async_trait::async_trait]
impl ImageStoragePort for LocalImageStore {
    async fn upload(
        &self,
        folder: ImageFolder,
        data: Vec<u8>,
        extension: &str,
    ) -> Result<StoredImage, ImageStorageError> {
        let public_id = format!(
            "{}/{}/{}.{}",
            ROOT_FOLDER,
            folder.as_str(),
            uuid::Uuid::new_v4(),
            extension
        );
        let path = self
            .resolve(&public_id)
            .ok_or_else(|| ImageStorageError::Storage(format!("Invalid path {}", public_id)))?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(storage_error)?;
        }
        let bytes = data.len();
        tokio::fs::write(&path, data).await.map_err(storage_error)?;
        log::debug!("Stored image {} ({} bytes)", public_id, bytes);

        Ok(StoredImage {
            url: format!("{}/{}", self.base_url, public_id),
            public_id,
            bytes,
            format: extension.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageStorageError> {
        let path = self.resolve(public_id).ok_or(ImageStorageError::NotFound)?;
        tokio::fs::remove_file(&path).await.map_err(storage_error)?;
        log::debug!("Deleted image {}", public_id);
        Ok(())
    }

    /// Transformations travel as query parameters; the static file server ignores them,
    /// so clients always receive the original file.
    fn url_for(&self, public_id: &str, transform: &ImageTransform) -> String {
        let mut params = Vec::new();
        if let Some(width) = transform.width {
            params.push(format!("w={}", width));
        }
        if let Some(height) = transform.height {
            params.push(format!("h={}", height));
        }
        if let Some(quality) = &transform.quality {
            params.push(format!("q={}", quality));
        }
        if let Some(format) = &transform.format {
            params.push(format!("f={}", format));
        }
        let url = format!("{}/{}", self.base_url, public_id);
        if params.is_empty() {
            url
        } else {
            format!("{}?{}", url, params.join("&"))
        }
    }

    fn public_id_from_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let public_id = rest.split(['?', '#']).next()?;
        self.resolve(public_id)?;
        Some(public_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &Path) -> LocalImageStore {
        LocalImageStore::with_root(root, "http://localhost:5000/images/")
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("gamehub-images-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_then_delete() {
        let root = scratch_dir();
        let store = store(&root);

        let stored = store
            .upload(ImageFolder::Avatars, vec![1, 2, 3], "png")
            .await
            .unwrap();
        assert!(stored.public_id.starts_with("gamehub/avatars/"));
        assert!(stored.public_id.ends_with(".png"));
        assert_eq!(stored.bytes, 3);
        assert_eq!(
            stored.url,
            format!("http://localhost:5000/images/{}", stored.public_id)
        );
        assert!(root.join(&stored.public_id).exists());

        assert_eq!(
            store.public_id_from_url(&stored.url),
            Some(stored.public_id.clone())
        );
        store.delete(&stored.public_id).await.unwrap();
        assert!(!root.join(&stored.public_id).exists());
        assert!(matches!(
            store.delete(&stored.public_id).await,
            Err(ImageStorageError::NotFound)
        ));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn test_ids_cannot_escape_root() {
        let store = store(Path::new("/srv/images"));
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("gamehub/../../x").is_none());
        assert!(store.resolve("").is_none());
        assert_eq!(
            store.resolve("gamehub/teams/a.png"),
            Some(PathBuf::from("/srv/images/gamehub/teams/a.png"))
        );
    }

    #[test]
    fn test_url_for_transform() {
        let store = store(Path::new("/srv/images"));
        let plain = store.url_for("gamehub/general/a.png", &ImageTransform::default());
        assert_eq!(plain, "http://localhost:5000/images/gamehub/general/a.png");

        let resized = store.url_for(
            "gamehub/general/a.png",
            &ImageTransform {
                width: Some(300),
                height: Some(200),
                quality: Some("auto".to_string()),
                format: None,
            },
        );
        assert_eq!(
            resized,
            "http://localhost:5000/images/gamehub/general/a.png?w=300&h=200&q=auto"
        );
        assert_eq!(
            store.public_id_from_url(&resized),
            Some("gamehub/general/a.png".to_string())
        );
        assert_eq!(store.public_id_from_url("https://elsewhere/x.png"), None);
    }
}

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Avatars,
    Teams,
    Tournaments,
    Screenshots,
    General,
}

impl ImageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFolder::Avatars => "avatars",
            ImageFolder::Teams => "teams",
            ImageFolder::Tournaments => "tournaments",
            ImageFolder::Screenshots => "screenshots",
            ImageFolder::General => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub public_id: String,
    pub url: String,
    pub bytes: usize,
    pub format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A file received from a client, not yet accepted.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidImage {
    #[error("Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.")]
    UnsupportedType,
    #[error("File too large. Maximum size is 10MB.")]
    TooLarge,
}

impl ImageUpload {
    /// Returns the file extension to store the upload under.
    pub fn validate(&self) -> Result<&'static str, InvalidImage> {
        let extension = match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => return Err(InvalidImage::UnsupportedType),
        };
        if self.data.len() > MAX_IMAGE_BYTES {
            return Err(InvalidImage::TooLarge);
        }
        Ok(extension)
    }
}

#[derive(Debug, Clone)]
pub enum ImageStorageError {
    NotFound,
    Storage(String),
}

impl std::fmt::Display for ImageStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageStorageError::NotFound => write!(f, "Image not found"),
            ImageStorageError::Storage(e) => write!(f, "Image storage error: {}", e),
        }
    }
}

#[async_trait::async_trait]
pub trait ImageStoragePort {
    async fn upload(
        &self,
        folder: ImageFolder,
        data: Vec<u8>,
        extension: &str,
    ) -> Result<StoredImage, ImageStorageError>;
    async fn delete(&self, public_id: &str) -> Result<(), ImageStorageError>;
    fn url_for(&self, public_id: &str, transform: &ImageTransform) -> String;
    /// Recovers the public id from a URL this store handed out.
    fn public_id_from_url(&self, url: &str) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_validation() {
        let upload = |content_type: &str, len: usize| ImageUpload {
            content_type: content_type.to_string(),
            data: vec![0; len],
        };
        assert_eq!(upload("image/jpeg", 10).validate(), Ok("jpg"));
        assert_eq!(upload("image/webp", MAX_IMAGE_BYTES).validate(), Ok("webp"));
        assert_eq!(
            upload("image/png", MAX_IMAGE_BYTES + 1).validate(),
            Err(InvalidImage::TooLarge)
        );
        assert_eq!(
            upload("application/pdf", 10).validate(),
            Err(InvalidImage::UnsupportedType)
        );
    }
}

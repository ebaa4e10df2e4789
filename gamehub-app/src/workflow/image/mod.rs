use serde::Serialize;

use crate::{
    domain::{RepoError, permission::AccessDenied},
    ports::image_storage::{ImageStoragePort, ImageTransform, InvalidImage, StoredImage},
};

pub mod upload;

pub const MAX_SCREENSHOTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error(transparent)]
    Invalid(#[from] InvalidImage),
    #[error("No image file provided")]
    NoFile,
    #[error("At most {MAX_SCREENSHOTS} screenshots can be uploaded at once")]
    TooManyFiles,
    #[error("Public ID is required")]
    MissingPublicId,
    #[error("Only team leaders can update team logo")]
    NotTeamLeader,
    #[error("Only match participants or admins can upload screenshots")]
    NotMatchParticipant,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} upload failed")]
    UploadFailed(&'static str),
    #[error("Image not found")]
    ImageNotFound,
    #[error("Image deletion failed")]
    DeleteFailed,
    #[error("Internal server error")]
    Internal,
}

impl ImageError {
    pub(crate) fn from_repo(e: RepoError, entity: &'static str) -> Self {
        match e {
            RepoError::NotFound => ImageError::NotFound(entity),
            e => {
                log::error!("{} storage failure: {}", entity, e);
                ImageError::Internal
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedUrls {
    pub thumbnail: String,
    pub medium: String,
    pub large: String,
}

impl OptimizedUrls {
    /// Three widths keeping the given aspect ratio, the medium size twice the thumbnail.
    pub(crate) fn build<I: ImageStoragePort + ?Sized>(
        storage: &I,
        public_id: &str,
        (width, height): (u32, u32),
    ) -> Self {
        let sized = |factor: u32| {
            storage.url_for(
                public_id,
                &ImageTransform {
                    width: Some(width * factor),
                    height: Some(height * factor),
                    ..Default::default()
                },
            )
        };
        OptimizedUrls {
            thumbnail: sized(1),
            medium: sized(2),
            large: sized(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[serde(flatten)]
    pub image: StoredImage,
    pub optimized_urls: OptimizedUrls,
}

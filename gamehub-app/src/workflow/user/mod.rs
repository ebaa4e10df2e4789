use crate::{
    domain::{RepoError, permission::AccessDenied},
    ports::image_storage::InvalidImage,
};

pub mod admin;
pub mod game_profile;
pub mod profile;
pub mod query;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("User not found")]
    NotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Gamer tag already taken")]
    GamerTagTaken,
    #[error("Game profile not found")]
    GameProfileNotFound,
    #[error("Unsupported game")]
    UnsupportedGame,
    #[error(transparent)]
    InvalidImage(#[from] InvalidImage),
    #[error("Avatar upload failed")]
    ImageUpload,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for UserError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => UserError::NotFound,
            e => {
                log::error!("User storage failure: {}", e);
                UserError::Internal
            }
        }
    }
}

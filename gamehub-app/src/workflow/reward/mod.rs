use crate::domain::{RepoError, permission::AccessDenied, reward::UnmetRequirement};

pub mod claim;
pub mod manage;
pub mod query;

#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Reward not found")]
    NotFound,
    #[error("Reward not found or inactive")]
    Unavailable,
    #[error("Reward already claimed")]
    AlreadyClaimed,
    #[error(transparent)]
    Unmet(#[from] UnmetRequirement),
    #[error("User not found")]
    UserNotFound,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for RewardError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => RewardError::NotFound,
            RepoError::UniqueViolation => RewardError::AlreadyClaimed,
            e => {
                log::error!("Reward storage failure: {}", e);
                RewardError::Internal
            }
        }
    }
}

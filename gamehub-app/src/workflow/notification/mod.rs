use crate::domain::RepoError;

pub mod inbox;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for NotificationError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => NotificationError::NotFound,
            e => {
                log::error!("Notification storage failure: {}", e);
                NotificationError::Internal
            }
        }
    }
}

use crate::domain::permission::AccessDenied;

pub mod outreach;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Email address is required")]
    MissingRecipient,
    #[error("Email, username, and tournament name are required")]
    MissingInvitationFields,
    #[error("Failed to send {0}")]
    SendFailed(&'static str),
}

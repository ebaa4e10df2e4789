use crate::domain::{RepoError, permission::AccessDenied, tournament::TournamentStatus};

pub mod manage;
pub mod participation;
pub mod query;

#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Tournament not found")]
    NotFound,
    #[error("Tournament registration is closed")]
    RegistrationClosed,
    #[error("Tournament is full")]
    Full,
    #[error("Already joined this tournament")]
    AlreadyJoined,
    #[error("Not a participant in this tournament")]
    NotParticipant,
    #[error("Cannot change tournament status from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for TournamentError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => TournamentError::NotFound,
            e => {
                log::error!("Tournament storage failure: {}", e);
                TournamentError::Internal
            }
        }
    }
}

use serde::Serialize;

use crate::domain::{
    RepoError,
    r#match::{Match, MatchParticipant, MatchStatus},
    permission::AccessDenied,
};

pub mod manage;
pub mod query;
pub mod result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(flatten)]
    pub r#match: Match,
    pub participants: Vec<MatchParticipant>,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Match not found")]
    NotFound,
    #[error("Tournament not found")]
    TournamentNotFound,
    #[error("A match needs at least two participants")]
    NotEnoughParticipants,
    #[error("Participants must be distinct")]
    DuplicateParticipant,
    #[error("Participant not found")]
    UnknownParticipant,
    #[error("Match is already {}", .0.as_str())]
    AlreadyFinished(MatchStatus),
    #[error("Only scheduled matches can be started")]
    NotScheduled,
    #[error("Result must only list match participants")]
    ResultParticipantMismatch,
    #[error("Result must not be empty")]
    EmptyResult,
    #[error("Only match participants or admins can submit results")]
    NotAParticipant,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for MatchError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => MatchError::NotFound,
            e => {
                log::error!("Match storage failure: {}", e);
                MatchError::Internal
            }
        }
    }
}

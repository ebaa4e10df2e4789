use crate::domain::{
    RepoError, TeamId, UserId,
    permission::AccessDenied,
    team::{TeamMember, TeamRepository, TeamRole},
};

pub mod manage;
pub mod membership;
pub mod query;

#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Team not found")]
    NotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("You are already a member of a team")]
    AlreadyInTeam,
    #[error("Team is full")]
    Full,
    #[error("You are not a member of this team")]
    NotMember,
    #[error("Only team leaders can {0}")]
    NotLeader(&'static str),
    #[error("Transfer leadership before leaving the team")]
    MustTransferLeadership,
    #[error("Cannot kick yourself")]
    CannotKickSelf,
    #[error("You are already the team leader")]
    AlreadyLeader,
    #[error("User is not a member of this team")]
    TargetNotMember,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for TeamError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => TeamError::NotFound,
            e => {
                log::error!("Team storage failure: {}", e);
                TeamError::Internal
            }
        }
    }
}

/// Fails with `NotLeader(action)` unless `user_id` leads the team.
pub(crate) async fn require_leader<T: TeamRepository + ?Sized>(
    team_repository: &T,
    team_id: TeamId,
    user_id: UserId,
    action: &'static str,
) -> Result<TeamMember, TeamError> {
    match team_repository.get_member(team_id, user_id).await? {
        Some(member) if member.role == TeamRole::Leader => Ok(member),
        _ => Err(TeamError::NotLeader(action)),
    }
}

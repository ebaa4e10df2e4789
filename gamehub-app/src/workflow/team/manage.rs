use std::sync::Arc;

use crate::{
    domain::{
        TeamId,
        event::Outbox,
        notification::{Notification, NotificationDraft, NotificationRepository, NotificationType},
        team::{NewTeam, Team, TeamRepository, TeamUpdate},
        user::{User, UserRepository},
    },
    services::dispatch::EventDispatcher,
    workflow::team::{TeamError, require_leader},
};

#[async_trait::async_trait]
pub trait ManageTeamUseCase {
    /// The creator becomes the team's leader.
    async fn create_team(&self, user: &User, team: NewTeam) -> Result<Team, TeamError>;
    async fn update_team(
        &self,
        user: &User,
        id: TeamId,
        update: TeamUpdate,
    ) -> Result<Team, TeamError>;
    /// Deactivates the team; members and history are kept.
    async fn delete_team(&self, user: &User, id: TeamId) -> Result<(), TeamError>;
    async fn invite(
        &self,
        user: &User,
        id: TeamId,
        username: &str,
    ) -> Result<Notification, TeamError>;
}

pub struct ManageTeamUseCaseImpl<
    T: TeamRepository,
    U: UserRepository,
    N: NotificationRepository,
    D: EventDispatcher,
> {
    team_repository: Arc<T>,
    user_repository: Arc<U>,
    notification_repository: Arc<N>,
    dispatcher: Arc<D>,
}

impl<T: TeamRepository, U: UserRepository, N: NotificationRepository, D: EventDispatcher>
    ManageTeamUseCaseImpl<T, U, N, D>
{
    pub fn new(
        team_repository: Arc<T>,
        user_repository: Arc<U>,
        notification_repository: Arc<N>,
        dispatcher: Arc<D>,
    ) -> Self {
        Self {
            team_repository,
            user_repository,
            notification_repository,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl<
    T: TeamRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> ManageTeamUseCase for ManageTeamUseCaseImpl<T, U, N, D>
{
    async fn create_team(&self, user: &User, team: NewTeam) -> Result<Team, TeamError> {
        if self
            .team_repository
            .find_membership(user.id)
            .await?
            .is_some()
        {
            return Err(TeamError::AlreadyInTeam);
        }
        let team = self
            .team_repository
            .create_team_with_leader(team, user.id)
            .await?;
        log::info!("Team {} created by {}", team.id, user.id);
        Ok(team)
    }

    async fn update_team(
        &self,
        user: &User,
        id: TeamId,
        update: TeamUpdate,
    ) -> Result<Team, TeamError> {
        require_leader(
            self.team_repository.as_ref(),
            id,
            user.id,
            "update team details",
        )
        .await?;
        Ok(self.team_repository.update_team(id, update).await?)
    }

    async fn delete_team(&self, user: &User, id: TeamId) -> Result<(), TeamError> {
        require_leader(self.team_repository.as_ref(), id, user.id, "delete the team").await?;
        self.team_repository
            .update_team(
                id,
                TeamUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        log::info!("Team {} deactivated by {}", id, user.id);
        Ok(())
    }

    async fn invite(
        &self,
        user: &User,
        id: TeamId,
        username: &str,
    ) -> Result<Notification, TeamError> {
        require_leader(self.team_repository.as_ref(), id, user.id, "invite members").await?;
        let team = self.team_repository.get_team(id).await?;
        let invitee = self
            .user_repository
            .find_by_username(username)
            .await?
            .ok_or(TeamError::UserNotFound)?;

        let notification = self
            .notification_repository
            .create_notification(NotificationDraft::new(
                invitee.id,
                NotificationType::Team,
                "Team Invitation",
                format!("You have been invited to join {}", team.name),
            ))
            .await?;
        self.dispatcher
            .dispatch(Outbox::new().notification(notification.clone()));
        Ok(notification)
    }
}

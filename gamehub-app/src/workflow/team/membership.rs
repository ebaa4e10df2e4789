use std::sync::Arc;

use crate::{
    domain::{
        RepoError, TeamId, UserId,
        event::{DomainEvent, Outbox, Room},
        team::{TeamMember, TeamRepository, TeamRole},
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::team::{TeamError, require_leader},
};

#[async_trait::async_trait]
pub trait TeamMembershipUseCase {
    async fn join_team(&self, user: &User, id: TeamId) -> Result<TeamMember, TeamError>;
    /// A leader may only leave once no other member remains.
    async fn leave_team(&self, user: &User, id: TeamId) -> Result<(), TeamError>;
    async fn kick_member(&self, user: &User, id: TeamId, member: UserId) -> Result<(), TeamError>;
    /// Hands leadership to another member; the current leader becomes a member.
    async fn promote_member(
        &self,
        user: &User,
        id: TeamId,
        member: UserId,
    ) -> Result<(), TeamError>;
}

pub struct TeamMembershipUseCaseImpl<T: TeamRepository, D: EventDispatcher> {
    team_repository: Arc<T>,
    dispatcher: Arc<D>,
}

impl<T: TeamRepository, D: EventDispatcher> TeamMembershipUseCaseImpl<T, D> {
    pub fn new(team_repository: Arc<T>, dispatcher: Arc<D>) -> Self {
        Self {
            team_repository,
            dispatcher,
        }
    }

    fn announce(&self, id: TeamId, event: DomainEvent) {
        self.dispatcher
            .dispatch(Outbox::new().event(Room::Team(id), event));
    }
}

#[async_trait::async_trait]
impl<T: TeamRepository + Send + Sync + 'static, D: EventDispatcher + Send + Sync + 'static>
    TeamMembershipUseCase for TeamMembershipUseCaseImpl<T, D>
{
    async fn join_team(&self, user: &User, id: TeamId) -> Result<TeamMember, TeamError> {
        let team = self.team_repository.get_team(id).await?;
        if !team.is_active {
            return Err(TeamError::NotFound);
        }
        let members = self.team_repository.count_members(id).await?;
        if members >= team.max_members.max(0) as u64 {
            return Err(TeamError::Full);
        }
        if self
            .team_repository
            .find_membership(user.id)
            .await?
            .is_some()
        {
            return Err(TeamError::AlreadyInTeam);
        }

        let member = match self
            .team_repository
            .add_member(id, user.id, TeamRole::Member)
            .await
        {
            Ok(member) => member,
            Err(RepoError::UniqueViolation) => return Err(TeamError::AlreadyInTeam),
            Err(e) => return Err(e.into()),
        };
        self.announce(
            id,
            DomainEvent::TeamMemberJoined {
                team_id: id,
                user_id: user.id,
            },
        );
        Ok(member)
    }

    async fn leave_team(&self, user: &User, id: TeamId) -> Result<(), TeamError> {
        let membership = self
            .team_repository
            .get_member(id, user.id)
            .await?
            .ok_or(TeamError::NotMember)?;
        if membership.role == TeamRole::Leader
            && self.team_repository.count_members(id).await? > 1
        {
            return Err(TeamError::MustTransferLeadership);
        }
        self.team_repository.remove_member(id, user.id).await?;
        self.announce(
            id,
            DomainEvent::TeamMemberLeft {
                team_id: id,
                user_id: user.id,
            },
        );
        Ok(())
    }

    async fn kick_member(&self, user: &User, id: TeamId, member: UserId) -> Result<(), TeamError> {
        require_leader(self.team_repository.as_ref(), id, user.id, "kick members").await?;
        if member == user.id {
            return Err(TeamError::CannotKickSelf);
        }
        if self.team_repository.get_member(id, member).await?.is_none() {
            return Err(TeamError::TargetNotMember);
        }
        self.team_repository.remove_member(id, member).await?;
        log::info!("User {} kicked from team {} by {}", member, id, user.id);
        self.announce(
            id,
            DomainEvent::TeamMemberLeft {
                team_id: id,
                user_id: member,
            },
        );
        Ok(())
    }

    async fn promote_member(
        &self,
        user: &User,
        id: TeamId,
        member: UserId,
    ) -> Result<(), TeamError> {
        require_leader(self.team_repository.as_ref(), id, user.id, "promote members").await?;
        if member == user.id {
            return Err(TeamError::AlreadyLeader);
        }
        match self
            .team_repository
            .transfer_leadership(id, user.id, member)
            .await
        {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(TeamError::TargetNotMember),
            Err(e) => return Err(e.into()),
        }
        self.announce(
            id,
            DomainEvent::TeamLeaderChanged {
                team_id: id,
                leader_id: member,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{team::NewTeam, user::Role},
        testing::{InMemoryStore, RecordingDispatcher},
    };

    async fn leaders(store: &InMemoryStore, id: TeamId) -> Vec<UserId> {
        store
            .list_members(id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.role == TeamRole::Leader)
            .map(|m| m.user_id)
            .collect()
    }

    #[tokio::test]
    async fn test_single_leader_through_membership_changes() {
        let store = InMemoryStore::new();
        let use_case = TeamMembershipUseCaseImpl::new(store.clone(), RecordingDispatcher::new());
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let team = store
            .create_team_with_leader(
                NewTeam {
                    name: "Night Owls".to_string(),
                    description: None,
                    max_members: 5,
                },
                ada.id,
            )
            .await
            .unwrap();

        use_case.join_team(&bob, team.id).await.unwrap();
        let blocked = use_case.leave_team(&ada, team.id).await;
        assert!(matches!(blocked, Err(TeamError::MustTransferLeadership)));
        assert_eq!(leaders(&store, team.id).await, vec![ada.id]);

        let result = use_case.promote_member(&bob, team.id, bob.id).await;
        assert!(matches!(result, Err(TeamError::NotLeader(_))));
        use_case.promote_member(&ada, team.id, bob.id).await.unwrap();
        assert_eq!(leaders(&store, team.id).await, vec![bob.id]);

        use_case.leave_team(&ada, team.id).await.unwrap();
        assert_eq!(leaders(&store, team.id).await, vec![bob.id]);
        use_case.leave_team(&bob, team.id).await.unwrap();
        assert_eq!(store.count_members(team.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_join_and_kick_rules() {
        let store = InMemoryStore::new();
        let dispatcher = RecordingDispatcher::new();
        let use_case = TeamMembershipUseCaseImpl::new(store.clone(), dispatcher.clone());
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let cyd = store.seed_user("cyd", Role::User, 0);
        let team = store
            .create_team_with_leader(
                NewTeam {
                    name: "Duo".to_string(),
                    description: None,
                    max_members: 2,
                },
                ada.id,
            )
            .await
            .unwrap();

        use_case.join_team(&bob, team.id).await.unwrap();
        let full = use_case.join_team(&cyd, team.id).await;
        assert!(matches!(full, Err(TeamError::Full)));

        let own = use_case.kick_member(&ada, team.id, ada.id).await;
        assert!(matches!(own, Err(TeamError::CannotKickSelf)));
        let stranger = use_case.kick_member(&ada, team.id, cyd.id).await;
        assert!(matches!(stranger, Err(TeamError::TargetNotMember)));
        use_case.kick_member(&ada, team.id, bob.id).await.unwrap();

        let second_team = store
            .create_team_with_leader(
                NewTeam {
                    name: "Other".to_string(),
                    description: None,
                    max_members: 5,
                },
                cyd.id,
            )
            .await
            .unwrap();
        let taken = use_case.join_team(&cyd, team.id).await;
        assert!(matches!(taken, Err(TeamError::AlreadyInTeam)));
        assert_ne!(second_team.id, team.id);
        assert!(dispatcher.events().iter().all(|(room, _)| *room == Room::Team(team.id)));
    }
}

use std::{collections::HashSet, sync::Arc};

use crate::{
    domain::{
        MatchId, RepoError,
        cache::{CacheStore, CacheStoreExt},
        event::{DomainEvent, Outbox, Room},
        r#match::{CompleteMatchError, MatchRepository, MatchResult, ParticipantOutcome},
        notification::{NotificationDraft, NotificationRepository, NotificationType},
        permission::{AccessDenied, Capability, PermissionPolicy},
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::r#match::{MatchDetails, MatchError},
};

#[async_trait::async_trait]
pub trait MatchResultUseCase {
    /// Completes the match. Any participant may report the result, staff may
    /// referee matches they did not play in. Participants left out of the result
    /// keep their standing and earn nothing.
    async fn submit_result(
        &self,
        actor: &User,
        id: MatchId,
        result: MatchResult,
    ) -> Result<MatchDetails, MatchError>;
}

pub struct MatchResultUseCaseImpl<
    M: MatchRepository,
    N: NotificationRepository,
    C: CacheStore,
    D: EventDispatcher,
> {
    match_repository: Arc<M>,
    notification_repository: Arc<N>,
    cache: Arc<C>,
    dispatcher: Arc<D>,
}

impl<M: MatchRepository, N: NotificationRepository, C: CacheStore, D: EventDispatcher>
    MatchResultUseCaseImpl<M, N, C, D>
{
    pub fn new(
        match_repository: Arc<M>,
        notification_repository: Arc<N>,
        cache: Arc<C>,
        dispatcher: Arc<D>,
    ) -> Self {
        Self {
            match_repository,
            notification_repository,
            cache,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl<
    M: MatchRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> MatchResultUseCase for MatchResultUseCaseImpl<M, N, C, D>
{
    async fn submit_result(
        &self,
        actor: &User,
        id: MatchId,
        result: MatchResult,
    ) -> Result<MatchDetails, MatchError> {
        let current = self.match_repository.get_match(id).await?;
        let participants = self.match_repository.list_participants(id).await?;
        if !actor.is_active {
            return Err(AccessDenied::AccountInactive.into());
        }
        let plays = participants.iter().any(|p| p.user_id == actor.id);
        if !plays && !Capability::RefereeMatches.allows(actor.role) {
            return Err(MatchError::NotAParticipant);
        }
        if current.status.is_terminal() {
            return Err(MatchError::AlreadyFinished(current.status));
        }
        if result.0.is_empty() {
            return Err(MatchError::EmptyResult);
        }

        let roster: HashSet<_> = participants.iter().map(|p| p.user_id).collect();
        let mut reported = HashSet::new();
        for entry in result.0.iter() {
            if !roster.contains(&entry.user_id) || !reported.insert(entry.user_id) {
                return Err(MatchError::ResultParticipantMismatch);
            }
        }

        let outcomes: Vec<ParticipantOutcome> =
            result.0.iter().map(ParticipantOutcome::from).collect();
        let completed = self
            .match_repository
            .complete_match(id, result.clone(), outcomes.clone())
            .await
            .map_err(|e| match e {
                CompleteMatchError::AlreadyFinished(status) => MatchError::AlreadyFinished(status),
                CompleteMatchError::Repo(RepoError::NotFound) => {
                    MatchError::ResultParticipantMismatch
                }
                CompleteMatchError::Repo(e) => e.into(),
            })?;
        log::info!("Match {} completed, reported by {}", id, actor.id);

        let mut outbox = Outbox::new().event(
            Room::Match(id),
            DomainEvent::MatchCompleted {
                match_id: id,
                result,
            },
        );
        for outcome in outcomes.iter() {
            self.cache.invalidate_user(outcome.user_id);
            let draft = NotificationDraft::new(
                outcome.user_id,
                NotificationType::Match,
                "Match Completed",
                format!(
                    "You finished in position {} and earned {} XP",
                    outcome.position, outcome.experience
                ),
            );
            match self.notification_repository.create_notification(draft).await {
                Ok(notification) => outbox = outbox.notification(notification),
                Err(e) => log::warn!(
                    "Failed to notify {} about match {}: {}",
                    outcome.user_id,
                    id,
                    e
                ),
            }
        }
        self.dispatcher.dispatch(outbox);

        let participants = self.match_repository.list_participants(id).await?;
        Ok(MatchDetails {
            r#match: completed,
            participants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            r#match::{MatchStatus, ParticipantResult},
            user::Role,
        },
        testing::{self, InMemoryStore, RecordingDispatcher},
        workflow::r#match::manage::{ManageMatchUseCase, ManageMatchUseCaseImpl, tests::draft},
    };

    fn placing(user: &User, score: i32, position: i32) -> ParticipantResult {
        ParticipantResult {
            user_id: user.id,
            score,
            position,
        }
    }

    #[tokio::test]
    async fn test_result_grants_experience_once() {
        let store = InMemoryStore::new();
        let dispatcher = RecordingDispatcher::new();
        let manage =
            ManageMatchUseCaseImpl::new(store.clone(), store.clone(), RecordingDispatcher::new());
        let use_case = MatchResultUseCaseImpl::new(
            store.clone(),
            store.clone(),
            testing::cache(),
            dispatcher.clone(),
        );
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let outsider = store.seed_user("outsider", Role::User, 0);
        let created = manage
            .create_match(&moderator, draft(vec![ada.id, bob.id]))
            .await
            .unwrap();
        let result = MatchResult(vec![placing(&bob, 13, 1), placing(&ada, 9, 2)]);

        let denied = use_case
            .submit_result(&outsider, created.id, result.clone())
            .await;
        assert!(matches!(denied, Err(MatchError::NotAParticipant)));
        let stranger = use_case
            .submit_result(
                &ada,
                created.id,
                MatchResult(vec![placing(&ada, 9, 1), placing(&outsider, 4, 2)]),
            )
            .await;
        assert!(matches!(stranger, Err(MatchError::ResultParticipantMismatch)));
        let doubled = use_case
            .submit_result(
                &ada,
                created.id,
                MatchResult(vec![placing(&ada, 9, 1), placing(&ada, 9, 2)]),
            )
            .await;
        assert!(matches!(doubled, Err(MatchError::ResultParticipantMismatch)));
        let empty = use_case
            .submit_result(&ada, created.id, MatchResult(Vec::new()))
            .await;
        assert!(matches!(empty, Err(MatchError::EmptyResult)));

        let details = use_case
            .submit_result(&ada, created.id, result.clone())
            .await
            .unwrap();
        assert_eq!(details.r#match.status, MatchStatus::Completed);
        assert_eq!(details.participants[0].user_id, bob.id);
        assert_eq!(store.user(bob.id).unwrap().experience, 100);
        assert_eq!(store.user(ada.id).unwrap().experience, 80);
        assert_eq!(store.notifications_for(ada.id).len(), 1);

        let again = use_case.submit_result(&moderator, created.id, result).await;
        assert!(matches!(
            again,
            Err(MatchError::AlreadyFinished(MatchStatus::Completed))
        ));
        assert_eq!(store.user(bob.id).unwrap().experience, 100);
        assert!(matches!(
            dispatcher.events().first(),
            Some((Room::Match(_), DomainEvent::MatchCompleted { .. }))
        ));
    }

    #[tokio::test]
    async fn test_partial_result_rewards_listed_players_only() {
        let store = InMemoryStore::new();
        let manage =
            ManageMatchUseCaseImpl::new(store.clone(), store.clone(), RecordingDispatcher::new());
        let use_case = MatchResultUseCaseImpl::new(
            store.clone(),
            store.clone(),
            testing::cache(),
            RecordingDispatcher::new(),
        );
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let cyd = store.seed_user("cyd", Role::User, 0);
        let created = manage
            .create_match(&moderator, draft(vec![ada.id, bob.id, cyd.id]))
            .await
            .unwrap();

        let details = use_case
            .submit_result(
                &moderator,
                created.id,
                MatchResult(vec![placing(&ada, 21, 1), placing(&bob, 17, 2)]),
            )
            .await
            .unwrap();
        assert_eq!(details.r#match.status, MatchStatus::Completed);
        assert_eq!(store.user(ada.id).unwrap().experience, 100);
        assert_eq!(store.user(bob.id).unwrap().experience, 80);
        assert_eq!(store.user(cyd.id).unwrap().experience, 0);
        assert!(store.notifications_for(cyd.id).is_empty());
    }
}

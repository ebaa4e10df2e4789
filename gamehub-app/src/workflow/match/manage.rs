use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        MatchId, RepoError, TournamentId, UserId,
        event::{DomainEvent, Outbox, Room},
        r#match::{Match, MatchRepository, MatchStatus, MatchUpdate, NewMatch},
        permission::{Capability, authorize},
        tournament::TournamentRepository,
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::r#match::MatchError,
};

#[derive(Debug, Clone)]
pub struct MatchDraft {
    pub title: String,
    pub tournament_id: Option<TournamentId>,
    pub game: String,
    pub round: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Seeded positions follow this order.
    pub participants: Vec<UserId>,
}

#[async_trait::async_trait]
pub trait ManageMatchUseCase {
    async fn create_match(&self, actor: &User, draft: MatchDraft) -> Result<Match, MatchError>;
    async fn update_match(
        &self,
        actor: &User,
        id: MatchId,
        update: MatchUpdate,
    ) -> Result<Match, MatchError>;
    async fn delete_match(&self, actor: &User, id: MatchId) -> Result<(), MatchError>;
    async fn start_match(&self, actor: &User, id: MatchId) -> Result<Match, MatchError>;
    async fn cancel_match(&self, actor: &User, id: MatchId) -> Result<Match, MatchError>;
}

pub struct ManageMatchUseCaseImpl<M: MatchRepository, T: TournamentRepository, D: EventDispatcher>
{
    match_repository: Arc<M>,
    tournament_repository: Arc<T>,
    dispatcher: Arc<D>,
}

impl<M: MatchRepository, T: TournamentRepository, D: EventDispatcher>
    ManageMatchUseCaseImpl<M, T, D>
{
    pub fn new(match_repository: Arc<M>, tournament_repository: Arc<T>, dispatcher: Arc<D>) -> Self {
        Self {
            match_repository,
            tournament_repository,
            dispatcher,
        }
    }

    fn announce(&self, id: MatchId, event: DomainEvent) {
        self.dispatcher
            .dispatch(Outbox::new().event(Room::Match(id), event));
    }
}

#[async_trait::async_trait]
impl<
    M: MatchRepository + Send + Sync + 'static,
    T: TournamentRepository + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> ManageMatchUseCase for ManageMatchUseCaseImpl<M, T, D>
{
    async fn create_match(&self, actor: &User, draft: MatchDraft) -> Result<Match, MatchError> {
        authorize(actor, &Capability::ManageMatches)?;
        if draft.participants.len() < 2 {
            return Err(MatchError::NotEnoughParticipants);
        }
        let mut seen = HashSet::new();
        if !draft.participants.iter().all(|id| seen.insert(*id)) {
            return Err(MatchError::DuplicateParticipant);
        }
        if let Some(tournament_id) = draft.tournament_id {
            match self.tournament_repository.get_tournament(tournament_id).await {
                Ok(_) => {}
                Err(RepoError::NotFound) => return Err(MatchError::TournamentNotFound),
                Err(e) => return Err(e.into()),
            }
        }

        let created = self
            .match_repository
            .create_match(
                NewMatch {
                    title: draft.title,
                    tournament_id: draft.tournament_id,
                    game: draft.game,
                    round: draft.round,
                    scheduled_at: draft.scheduled_at,
                },
                draft.participants,
            )
            .await
            .map_err(|e| match e {
                RepoError::ForeignKeyViolation => MatchError::UnknownParticipant,
                e => e.into(),
            })?;
        log::info!("Match {} created by {}", created.id, actor.id);
        Ok(created)
    }

    async fn update_match(
        &self,
        actor: &User,
        id: MatchId,
        update: MatchUpdate,
    ) -> Result<Match, MatchError> {
        authorize(actor, &Capability::ManageMatches)?;
        let current = self.match_repository.get_match(id).await?;
        if current.status.is_terminal() {
            return Err(MatchError::AlreadyFinished(current.status));
        }
        let updated = self.match_repository.update_match(id, update).await?;
        if updated.status != current.status {
            self.announce(
                id,
                DomainEvent::MatchUpdated {
                    match_id: id,
                    status: updated.status,
                },
            );
        }
        Ok(updated)
    }

    async fn delete_match(&self, actor: &User, id: MatchId) -> Result<(), MatchError> {
        authorize(actor, &Capability::ManageMatches)?;
        self.match_repository.delete_match(id).await?;
        log::info!("Match {} deleted by {}", id, actor.id);
        Ok(())
    }

    async fn start_match(&self, actor: &User, id: MatchId) -> Result<Match, MatchError> {
        authorize(actor, &Capability::ManageMatches)?;
        let current = self.match_repository.get_match(id).await?;
        if current.status != MatchStatus::Scheduled {
            return Err(MatchError::NotScheduled);
        }
        let started = self
            .match_repository
            .update_match(
                id,
                MatchUpdate {
                    status: Some(MatchStatus::InProgress),
                    started_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        self.announce(id, DomainEvent::MatchStarted { match_id: id });
        Ok(started)
    }

    async fn cancel_match(&self, actor: &User, id: MatchId) -> Result<Match, MatchError> {
        authorize(actor, &Capability::ManageMatches)?;
        let current = self.match_repository.get_match(id).await?;
        if current.status.is_terminal() {
            return Err(MatchError::AlreadyFinished(current.status));
        }
        let cancelled = self
            .match_repository
            .update_match(
                id,
                MatchUpdate {
                    status: Some(MatchStatus::Cancelled),
                    ended_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        self.announce(
            id,
            DomainEvent::MatchUpdated {
                match_id: id,
                status: MatchStatus::Cancelled,
            },
        );
        Ok(cancelled)
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        TournamentId,
        event::{DomainEvent, Outbox, Room},
        permission::{AccessDenied, Capability, authorize},
        tournament::{
            NewTournament, Tournament, TournamentFormat, TournamentRepository, TournamentStatus,
            TournamentUpdate,
        },
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::tournament::TournamentError,
};

#[derive(Debug, Clone)]
pub struct TournamentDraft {
    pub title: String,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub game: String,
    pub format: TournamentFormat,
    pub max_participants: i32,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait ManageTournamentUseCase {
    /// Any active account may organise a tournament.
    async fn create_tournament(
        &self,
        actor: &User,
        draft: TournamentDraft,
    ) -> Result<Tournament, TournamentError>;
    async fn update_tournament(
        &self,
        actor: &User,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> Result<Tournament, TournamentError>;
    async fn delete_tournament(&self, actor: &User, id: TournamentId)
    -> Result<(), TournamentError>;
    async fn start_tournament(
        &self,
        actor: &User,
        id: TournamentId,
    ) -> Result<Tournament, TournamentError>;
    async fn cancel_tournament(
        &self,
        actor: &User,
        id: TournamentId,
    ) -> Result<Tournament, TournamentError>;
}

pub struct ManageTournamentUseCaseImpl<T: TournamentRepository, D: EventDispatcher> {
    tournament_repository: Arc<T>,
    dispatcher: Arc<D>,
}

impl<T: TournamentRepository, D: EventDispatcher> ManageTournamentUseCaseImpl<T, D> {
    pub fn new(tournament_repository: Arc<T>, dispatcher: Arc<D>) -> Self {
        Self {
            tournament_repository,
            dispatcher,
        }
    }

    async fn apply(
        &self,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> Result<Tournament, TournamentError> {
        let current = self.tournament_repository.get_tournament(id).await?;
        if let Some(next) = update.status
            && next != current.status
            && !current.status.can_transition_to(next)
        {
            return Err(TournamentError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }
        let tournament = self
            .tournament_repository
            .update_tournament(id, update)
            .await?;
        if tournament.status != current.status {
            log::info!(
                "Tournament {} moved from {} to {}",
                id,
                current.status.as_str(),
                tournament.status.as_str()
            );
            self.dispatcher.dispatch(Outbox::new().event(
                Room::Tournament(id),
                DomainEvent::TournamentUpdated {
                    tournament_id: id,
                    status: tournament.status,
                },
            ));
        }
        Ok(tournament)
    }

    async fn move_to(
        &self,
        actor: &User,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<Tournament, TournamentError> {
        authorize(actor, &Capability::ManageTournaments)?;
        let current = self.tournament_repository.get_tournament(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(TournamentError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        self.apply(
            id,
            TournamentUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}

#[async_trait::async_trait]
impl<T: TournamentRepository + Send + Sync + 'static, D: EventDispatcher + Send + Sync + 'static>
    ManageTournamentUseCase for ManageTournamentUseCaseImpl<T, D>
{
    async fn create_tournament(
        &self,
        actor: &User,
        draft: TournamentDraft,
    ) -> Result<Tournament, TournamentError> {
        if !actor.is_active {
            return Err(AccessDenied::AccountInactive.into());
        }
        let tournament = self
            .tournament_repository
            .create_tournament(NewTournament {
                title: draft.title,
                description: draft.description,
                rules: draft.rules,
                game: draft.game,
                format: draft.format,
                max_participants: draft.max_participants,
                entry_fee: draft.entry_fee,
                prize_pool: draft.prize_pool,
                start_date: draft.start_date,
                end_date: draft.end_date,
                created_by: actor.id,
            })
            .await?;
        log::info!("Tournament {} created by {}", tournament.id, actor.id);
        Ok(tournament)
    }

    async fn update_tournament(
        &self,
        actor: &User,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> Result<Tournament, TournamentError> {
        authorize(actor, &Capability::ManageTournaments)?;
        self.apply(id, update).await
    }

    async fn delete_tournament(
        &self,
        actor: &User,
        id: TournamentId,
    ) -> Result<(), TournamentError> {
        authorize(actor, &Capability::ManageTournaments)?;
        self.tournament_repository.delete_tournament(id).await?;
        log::info!("Tournament {} deleted by {}", id, actor.id);
        Ok(())
    }

    async fn start_tournament(
        &self,
        actor: &User,
        id: TournamentId,
    ) -> Result<Tournament, TournamentError> {
        self.move_to(actor, id, TournamentStatus::InProgress).await
    }

    async fn cancel_tournament(
        &self,
        actor: &User,
        id: TournamentId,
    ) -> Result<Tournament, TournamentError> {
        self.move_to(actor, id, TournamentStatus::Cancelled).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        domain::user::Role,
        testing::{InMemoryStore, RecordingDispatcher},
    };

    pub(crate) fn draft(max_participants: i32) -> TournamentDraft {
        TournamentDraft {
            title: "Friday Cup".to_string(),
            description: None,
            rules: Some("Best of three, no emulators".to_string()),
            game: "pubg".to_string(),
            format: TournamentFormat::SingleElimination,
            max_participants,
            entry_fee: 0,
            prize_pool: 500,
            start_date: Utc::now(),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_lifecycle_and_terminal_states() {
        let store = InMemoryStore::new();
        let organiser = store.seed_user("organiser", Role::User, 0);
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let dispatcher = RecordingDispatcher::new();
        let use_case = ManageTournamentUseCaseImpl::new(store.clone(), dispatcher.clone());

        let tournament = use_case
            .create_tournament(&organiser, draft(8))
            .await
            .unwrap();
        assert_eq!(tournament.status, TournamentStatus::Upcoming);

        let result = use_case.start_tournament(&organiser, tournament.id).await;
        assert!(matches!(
            result,
            Err(TournamentError::Access(AccessDenied::InsufficientPermissions))
        ));

        let started = use_case
            .start_tournament(&moderator, tournament.id)
            .await
            .unwrap();
        assert_eq!(started.status, TournamentStatus::InProgress);
        let cancelled = use_case
            .cancel_tournament(&moderator, tournament.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, TournamentStatus::Cancelled);

        let result = use_case.start_tournament(&moderator, tournament.id).await;
        assert!(matches!(
            result,
            Err(TournamentError::InvalidTransition { .. })
        ));
        let reopen = use_case
            .update_tournament(
                &moderator,
                tournament.id,
                TournamentUpdate {
                    status: Some(TournamentStatus::RegistrationOpen),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(reopen, Err(TournamentError::InvalidTransition { .. })));
        assert_eq!(dispatcher.events().len(), 2);
    }
}

use std::sync::Arc;

use crate::{
    domain::{
        RepoError, TournamentId,
        event::{DomainEvent, Outbox, Room},
        tournament::{TournamentParticipant, TournamentRepository},
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::tournament::TournamentError,
};

#[async_trait::async_trait]
pub trait TournamentParticipationUseCase {
    /// The capacity check and the insert are separate statements: two concurrent joins
    /// for the last seat can both succeed.
    async fn join_tournament(
        &self,
        user: &User,
        id: TournamentId,
    ) -> Result<TournamentParticipant, TournamentError>;
    async fn leave_tournament(&self, user: &User, id: TournamentId) -> Result<(), TournamentError>;
}

pub struct TournamentParticipationUseCaseImpl<T: TournamentRepository, D: EventDispatcher> {
    tournament_repository: Arc<T>,
    dispatcher: Arc<D>,
}

impl<T: TournamentRepository, D: EventDispatcher> TournamentParticipationUseCaseImpl<T, D> {
    pub fn new(tournament_repository: Arc<T>, dispatcher: Arc<D>) -> Self {
        Self {
            tournament_repository,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl<T: TournamentRepository + Send + Sync + 'static, D: EventDispatcher + Send + Sync + 'static>
    TournamentParticipationUseCase for TournamentParticipationUseCaseImpl<T, D>
{
    async fn join_tournament(
        &self,
        user: &User,
        id: TournamentId,
    ) -> Result<TournamentParticipant, TournamentError> {
        let tournament = self.tournament_repository.get_tournament(id).await?;
        if !tournament.status.accepts_registrations() {
            return Err(TournamentError::RegistrationClosed);
        }
        let registered = self.tournament_repository.count_participants(id).await?;
        if registered >= tournament.max_participants.max(0) as u64 {
            return Err(TournamentError::Full);
        }

        let participant = match self.tournament_repository.add_participant(id, user.id).await {
            Ok(participant) => participant,
            Err(RepoError::UniqueViolation) => return Err(TournamentError::AlreadyJoined),
            Err(e) => return Err(e.into()),
        };
        log::info!("User {} joined tournament {}", user.id, id);
        self.dispatcher.dispatch(Outbox::new().event(
            Room::Tournament(id),
            DomainEvent::ParticipantJoined {
                tournament_id: id,
                user_id: user.id,
            },
        ));
        Ok(participant)
    }

    async fn leave_tournament(&self, user: &User, id: TournamentId) -> Result<(), TournamentError> {
        match self
            .tournament_repository
            .remove_participant(id, user.id)
            .await
        {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(TournamentError::NotParticipant),
            Err(e) => return Err(e.into()),
        }
        self.dispatcher.dispatch(Outbox::new().event(
            Room::Tournament(id),
            DomainEvent::ParticipantLeft {
                tournament_id: id,
                user_id: user.id,
            },
        ));
        Ok(())
    }
}

use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::{
        Page, TournamentId,
        r#match::MatchRepository,
        tournament::{Tournament, TournamentParticipant, TournamentQuery, TournamentRepository},
    },
    workflow::{r#match::MatchDetails, tournament::TournamentError},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentListing {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub participant_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TournamentDetails {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub participants: Vec<TournamentParticipant>,
    pub matches: Vec<MatchDetails>,
}

#[async_trait::async_trait]
pub trait TournamentQueryUseCase {
    async fn list_tournaments(
        &self,
        query: TournamentQuery,
    ) -> Result<Page<TournamentListing>, TournamentError>;
    async fn get_tournament(&self, id: TournamentId) -> Result<TournamentDetails, TournamentError>;
    async fn list_participants(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, TournamentError>;
    async fn list_matches(&self, id: TournamentId) -> Result<Vec<MatchDetails>, TournamentError>;
}

pub struct TournamentQueryUseCaseImpl<T: TournamentRepository, M: MatchRepository> {
    tournament_repository: Arc<T>,
    match_repository: Arc<M>,
}

impl<T: TournamentRepository, M: MatchRepository> TournamentQueryUseCaseImpl<T, M> {
    pub fn new(tournament_repository: Arc<T>, match_repository: Arc<M>) -> Self {
        Self {
            tournament_repository,
            match_repository,
        }
    }
}

#[async_trait::async_trait]
impl<T: TournamentRepository + Send + Sync + 'static, M: MatchRepository + Send + Sync + 'static>
    TournamentQueryUseCase for TournamentQueryUseCaseImpl<T, M>
{
    async fn list_tournaments(
        &self,
        query: TournamentQuery,
    ) -> Result<Page<TournamentListing>, TournamentError> {
        let page = self.tournament_repository.query_tournaments(query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for tournament in page.items {
            let participant_count = self
                .tournament_repository
                .count_participants(tournament.id)
                .await?;
            items.push(TournamentListing {
                tournament,
                participant_count,
            });
        }
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<TournamentDetails, TournamentError> {
        let tournament = self.tournament_repository.get_tournament(id).await?;
        let participants = self.tournament_repository.list_participants(id).await?;
        let matches = self.list_matches(id).await?;
        Ok(TournamentDetails {
            tournament,
            participants,
            matches,
        })
    }

    async fn list_participants(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, TournamentError> {
        Ok(self.tournament_repository.list_participants(id).await?)
    }

    async fn list_matches(&self, id: TournamentId) -> Result<Vec<MatchDetails>, TournamentError> {
        let matches = self.match_repository.list_tournament_matches(id).await?;
        let mut details = Vec::with_capacity(matches.len());
        for m in matches {
            let participants = self.match_repository.list_participants(m.id).await?;
            details.push(MatchDetails {
                r#match: m,
                participants,
            });
        }
        Ok(details)
    }
}

use std::sync::Arc;

use crate::{
    domain::{
        MatchId, Page,
        r#match::{Match, MatchParticipant, MatchQuery, MatchRepository},
    },
    workflow::r#match::{MatchDetails, MatchError},
};

#[async_trait::async_trait]
pub trait MatchQueryUseCase {
    async fn list_matches(&self, query: MatchQuery) -> Result<Page<Match>, MatchError>;
    async fn get_match(&self, id: MatchId) -> Result<MatchDetails, MatchError>;
    async fn list_participants(&self, id: MatchId) -> Result<Vec<MatchParticipant>, MatchError>;
}

pub struct MatchQueryUseCaseImpl<M: MatchRepository> {
    match_repository: Arc<M>,
}

impl<M: MatchRepository> MatchQueryUseCaseImpl<M> {
    pub fn new(match_repository: Arc<M>) -> Self {
        Self { match_repository }
    }
}

#[async_trait::async_trait]
impl<M: MatchRepository + Send + Sync + 'static> MatchQueryUseCase for MatchQueryUseCaseImpl<M> {
    async fn list_matches(&self, query: MatchQuery) -> Result<Page<Match>, MatchError> {
        Ok(self.match_repository.query_matches(query).await?)
    }

    async fn get_match(&self, id: MatchId) -> Result<MatchDetails, MatchError> {
        let r#match = self.match_repository.get_match(id).await?;
        let participants = self.match_repository.list_participants(id).await?;
        Ok(MatchDetails {
            r#match,
            participants,
        })
    }

    async fn list_participants(&self, id: MatchId) -> Result<Vec<MatchParticipant>, MatchError> {
        self.match_repository.get_match(id).await?;
        Ok(self.match_repository.list_participants(id).await?)
    }
}

use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::{
        Page, TeamId, UserId,
        team::{Team, TeamMember, TeamQuery, TeamRepository},
    },
    workflow::team::TeamError,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamListing {
    #[serde(flatten)]
    pub team: Team,
    pub member_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamDetails {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
}

#[async_trait::async_trait]
pub trait TeamQueryUseCase {
    async fn list_teams(&self, query: TeamQuery) -> Result<Page<TeamListing>, TeamError>;
    async fn get_team(&self, id: TeamId) -> Result<TeamDetails, TeamError>;
    /// Leader first.
    async fn list_members(&self, id: TeamId) -> Result<Vec<TeamMember>, TeamError>;
    async fn team_of(&self, user_id: UserId) -> Result<Option<TeamDetails>, TeamError>;
}

pub struct TeamQueryUseCaseImpl<T: TeamRepository> {
    team_repository: Arc<T>,
}

impl<T: TeamRepository> TeamQueryUseCaseImpl<T> {
    pub fn new(team_repository: Arc<T>) -> Self {
        Self { team_repository }
    }
}

#[async_trait::async_trait]
impl<T: TeamRepository + Send + Sync + 'static> TeamQueryUseCase for TeamQueryUseCaseImpl<T> {
    async fn list_teams(&self, query: TeamQuery) -> Result<Page<TeamListing>, TeamError> {
        let page = self.team_repository.query_teams(query).await?;
        let mut items = Vec::with_capacity(page.items.len());
        for team in page.items {
            let member_count = self.team_repository.count_members(team.id).await?;
            items.push(TeamListing { team, member_count });
        }
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn get_team(&self, id: TeamId) -> Result<TeamDetails, TeamError> {
        let team = self.team_repository.get_team(id).await?;
        let members = self.team_repository.list_members(id).await?;
        Ok(TeamDetails { team, members })
    }

    async fn list_members(&self, id: TeamId) -> Result<Vec<TeamMember>, TeamError> {
        Ok(self.team_repository.list_members(id).await?)
    }

    async fn team_of(&self, user_id: UserId) -> Result<Option<TeamDetails>, TeamError> {
        match self.team_repository.find_membership(user_id).await? {
            Some(membership) => Ok(Some(self.get_team(membership.team_id).await?)),
            None => Ok(None),
        }
    }
}

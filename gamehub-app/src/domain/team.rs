use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Page, Pagination, RepoError, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    Leader,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Leader => "LEADER",
            TeamRole::Member => "MEMBER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LEADER" => Some(TeamRole::Leader),
            "MEMBER" => Some(TeamRole::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub max_members: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub username: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub description: Option<String>,
    pub max_members: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub max_members: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamQuery {
    pub search: Option<String>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait TeamRepository {
    /// Creates the team and its first member as `Leader` in one transaction.
    async fn create_team_with_leader(
        &self,
        team: NewTeam,
        leader: UserId,
    ) -> Result<Team, RepoError>;
    async fn get_team(&self, id: TeamId) -> Result<Team, RepoError>;
    /// Active teams only, newest first.
    async fn query_teams(&self, query: TeamQuery) -> Result<Page<Team>, RepoError>;
    async fn update_team(&self, id: TeamId, update: TeamUpdate) -> Result<Team, RepoError>;
    /// The membership the user holds in any team.
    async fn find_membership(&self, user_id: UserId) -> Result<Option<TeamMember>, RepoError>;
    async fn get_member(
        &self,
        id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamMember>, RepoError>;
    /// Leaders first, then by join time.
    async fn list_members(&self, id: TeamId) -> Result<Vec<TeamMember>, RepoError>;
    async fn count_members(&self, id: TeamId) -> Result<u64, RepoError>;
    async fn add_member(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> Result<TeamMember, RepoError>;
    async fn remove_member(&self, id: TeamId, user_id: UserId) -> Result<(), RepoError>;
    /// Demotes `from` and promotes `to` in one transaction. `NotFound` when `to` is not
    /// a member of the team.
    async fn transfer_leadership(
        &self,
        id: TeamId,
        from: UserId,
        to: UserId,
    ) -> Result<(), RepoError>;
}

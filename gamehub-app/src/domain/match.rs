use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, Page, Pagination, RepoError, TournamentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::InProgress => "IN_PROGRESS",
            MatchStatus::Completed => "COMPLETED",
            MatchStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(MatchStatus::Scheduled),
            "IN_PROGRESS" => Some(MatchStatus::InProgress),
            "COMPLETED" => Some(MatchStatus::Completed),
            "CANCELLED" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResult {
    pub user_id: UserId,
    pub score: i32,
    pub position: i32,
}

/// Per-participant outcome stored as the match result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchResult(pub Vec<ParticipantResult>);

/// Experience granted for a finishing position: 100 for the winner, 20 less per
/// place below, never under 10.
pub fn experience_for_position(position: i32) -> i64 {
    let position = position.max(1) as i64;
    (100 - (position - 1) * 20).max(10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantOutcome {
    pub user_id: UserId,
    pub score: i32,
    pub position: i32,
    pub experience: i64,
}

impl From<&ParticipantResult> for ParticipantOutcome {
    fn from(r: &ParticipantResult) -> Self {
        ParticipantOutcome {
            user_id: r.user_id,
            score: r.score,
            position: r.position,
            experience: experience_for_position(r.position),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub title: String,
    pub tournament_id: Option<TournamentId>,
    pub game: String,
    pub round: Option<i32>,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<MatchResult>,
    pub screenshots: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    pub match_id: MatchId,
    pub user_id: UserId,
    pub username: String,
    pub score: Option<i32>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub title: String,
    pub tournament_id: Option<TournamentId>,
    pub game: String,
    pub round: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchUpdate {
    pub title: Option<String>,
    pub game: Option<String>,
    pub round: Option<i32>,
    pub status: Option<MatchStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub screenshots: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub status: Option<MatchStatus>,
    pub game: Option<String>,
    pub tournament_id: Option<TournamentId>,
    pub pagination: Pagination,
}

/// Failure of [`MatchRepository::complete_match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteMatchError {
    /// The match reached a final status before this completion could be recorded.
    AlreadyFinished(MatchStatus),
    Repo(RepoError),
}

impl From<RepoError> for CompleteMatchError {
    fn from(e: RepoError) -> Self {
        CompleteMatchError::Repo(e)
    }
}

impl std::fmt::Display for CompleteMatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompleteMatchError::AlreadyFinished(status) => {
                write!(f, "Match is already {}", status.as_str())
            }
            CompleteMatchError::Repo(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CompleteMatchError {}

#[async_trait::async_trait]
pub trait MatchRepository {
    /// Participants receive positions 1..n in the given order.
    async fn create_match(
        &self,
        new_match: NewMatch,
        participants: Vec<UserId>,
    ) -> Result<Match, RepoError>;
    async fn get_match(&self, id: MatchId) -> Result<Match, RepoError>;
    /// Latest scheduled first.
    async fn query_matches(&self, query: MatchQuery) -> Result<Page<Match>, RepoError>;
    /// Ordered by round, then schedule.
    async fn list_tournament_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Match>, RepoError>;
    async fn update_match(&self, id: MatchId, update: MatchUpdate) -> Result<Match, RepoError>;
    async fn delete_match(&self, id: MatchId) -> Result<(), RepoError>;
    /// Ordered by position.
    async fn list_participants(&self, id: MatchId) -> Result<Vec<MatchParticipant>, RepoError>;
    /// Marks the match completed, records each participant's score and position and
    /// grants the experience, all in one transaction. Only a match that is still open
    /// can be completed, so experience is granted at most once.
    async fn complete_match(
        &self,
        id: MatchId,
        result: MatchResult,
        outcomes: Vec<ParticipantOutcome>,
    ) -> Result<Match, CompleteMatchError>;
}

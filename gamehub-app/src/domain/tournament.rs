use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Page, Pagination, RepoError, TournamentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Upcoming,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn accepts_registrations(&self) -> bool {
        matches!(
            self,
            TournamentStatus::Upcoming | TournamentStatus::RegistrationOpen
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TournamentStatus::Completed | TournamentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: TournamentStatus) -> bool {
        use TournamentStatus::*;
        match (self, next) {
            (a, b) if *a == b => false,
            (Completed | Cancelled, _) => false,
            (_, Upcoming) => false,
            (InProgress, Completed | Cancelled) => true,
            (InProgress, _) => false,
            (_, Completed) => false,
            _ => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "UPCOMING",
            TournamentStatus::RegistrationOpen => "REGISTRATION_OPEN",
            TournamentStatus::RegistrationClosed => "REGISTRATION_CLOSED",
            TournamentStatus::InProgress => "IN_PROGRESS",
            TournamentStatus::Completed => "COMPLETED",
            TournamentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UPCOMING" => Some(TournamentStatus::Upcoming),
            "REGISTRATION_OPEN" => Some(TournamentStatus::RegistrationOpen),
            "REGISTRATION_CLOSED" => Some(TournamentStatus::RegistrationClosed),
            "IN_PROGRESS" => Some(TournamentStatus::InProgress),
            "COMPLETED" => Some(TournamentStatus::Completed),
            "CANCELLED" => Some(TournamentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "SINGLE_ELIMINATION",
            TournamentFormat::DoubleElimination => "DOUBLE_ELIMINATION",
            TournamentFormat::RoundRobin => "ROUND_ROBIN",
            TournamentFormat::Swiss => "SWISS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SINGLE_ELIMINATION" => Some(TournamentFormat::SingleElimination),
            "DOUBLE_ELIMINATION" => Some(TournamentFormat::DoubleElimination),
            "ROUND_ROBIN" => Some(TournamentFormat::RoundRobin),
            "SWISS" => Some(TournamentFormat::Swiss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub game: String,
    pub format: TournamentFormat,
    pub max_participants: i32,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub status: TournamentStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub banner: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentParticipant {
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub username: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTournament {
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
    pub created_by: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub game: Option<String>,
    pub format: Option<TournamentFormat>,
    pub max_participants: Option<i32>,
    pub entry_fee: Option<i64>,
    pub prize_pool: Option<i64>,
    pub status: Option<TournamentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub banner: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentQuery {
    pub status: Option<TournamentStatus>,
    /// Substring match on the game name.
    pub game: Option<String>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait TournamentRepository {
    async fn create_tournament(&self, tournament: NewTournament) -> Result<Tournament, RepoError>;
    async fn get_tournament(&self, id: TournamentId) -> Result<Tournament, RepoError>;
    /// Ordered by start date, soonest first.
    async fn query_tournaments(&self, query: TournamentQuery)
    -> Result<Page<Tournament>, RepoError>;
    async fn update_tournament(
        &self,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> Result<Tournament, RepoError>;
    /// Drops participants, detaches matches and removes the tournament.
    async fn delete_tournament(&self, id: TournamentId) -> Result<(), RepoError>;
    async fn count_participants(&self, id: TournamentId) -> Result<u64, RepoError>;
    /// `UniqueViolation` if the user already joined.
    async fn add_participant(
        &self,
        id: TournamentId,
        user_id: UserId,
    ) -> Result<TournamentParticipant, RepoError>;
    async fn remove_participant(&self, id: TournamentId, user_id: UserId)
    -> Result<(), RepoError>;
    /// Ordered by registration time.
    async fn list_participants(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, RepoError>;
}

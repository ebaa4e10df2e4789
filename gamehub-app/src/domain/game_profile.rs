use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{GameProfileId, RepoError, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProfile {
    pub id: GameProfileId,
    pub user_id: UserId,
    pub game_id: String,
    pub game_name: String,
    pub game_uid: String,
    pub in_game_name: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GameProfileInput {
    pub game_id: String,
    pub game_name: String,
    pub game_uid: String,
    pub in_game_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct GameProfileUpdate {
    pub game_uid: Option<String>,
    pub in_game_name: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedGame {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const SUPPORTED_GAMES: [SupportedGame; 4] = [
    SupportedGame {
        id: "freefire",
        name: "Free Fire",
        description: "Battle Royale Game",
    },
    SupportedGame {
        id: "pubg",
        name: "PUBG Mobile",
        description: "Battle Royale Game",
    },
    SupportedGame {
        id: "codm",
        name: "Call of Duty Mobile",
        description: "FPS Battle Royale",
    },
    SupportedGame {
        id: "valorant",
        name: "Valorant Mobile",
        description: "Tactical FPS",
    },
];

#[async_trait::async_trait]
pub trait GameProfileRepository {
    /// Primary profile first, then oldest first.
    async fn list_game_profiles(&self, user_id: UserId) -> Result<Vec<GameProfile>, RepoError>;
    /// Creates or refreshes the profile for `(user, game)`. A user's first profile
    /// becomes primary.
    async fn upsert_game_profile(
        &self,
        user_id: UserId,
        input: GameProfileInput,
    ) -> Result<GameProfile, RepoError>;
    /// Setting `is_primary` clears the flag on the user's other profiles.
    async fn update_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
        update: GameProfileUpdate,
    ) -> Result<GameProfile, RepoError>;
    /// Deleting the primary profile promotes the oldest remaining one.
    async fn delete_game_profile(&self, user_id: UserId, id: GameProfileId)
    -> Result<(), RepoError>;
}

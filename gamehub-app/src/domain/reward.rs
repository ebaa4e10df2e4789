use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Page, Pagination, RepoError, RewardId, UserId,
    notification::{Notification, NotificationDraft},
    user::{User, UserActivity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    Coins,
    Experience,
    Badge,
    Item,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Coins => "COINS",
            RewardType::Experience => "EXPERIENCE",
            RewardType::Badge => "BADGE",
            RewardType::Item => "ITEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COINS" => Some(RewardType::Coins),
            "EXPERIENCE" => Some(RewardType::Experience),
            "BADGE" => Some(RewardType::Badge),
            "ITEM" => Some(RewardType::Item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_experience: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tournaments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_matches: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnmetRequirement {
    #[error("Level requirement not met")]
    Level,
    #[error("Experience requirement not met")]
    Experience,
    #[error("Tournament participation requirement not met")]
    Tournaments,
    #[error("Match participation requirement not met")]
    Matches,
}

impl RewardRequirements {
    /// Checked against live stats, in the order level, experience, tournaments, matches.
    pub fn check(&self, user: &User, activity: &UserActivity) -> Result<(), UnmetRequirement> {
        if let Some(min) = self.min_level
            && user.level < min
        {
            return Err(UnmetRequirement::Level);
        }
        if let Some(min) = self.min_experience
            && user.experience < min
        {
            return Err(UnmetRequirement::Experience);
        }
        if let Some(min) = self.min_tournaments
            && activity.tournaments < min
        {
            return Err(UnmetRequirement::Tournaments);
        }
        if let Some(min) = self.min_matches
            && activity.matches < min
        {
            return Err(UnmetRequirement::Matches);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: RewardId,
    pub title: String,
    pub description: Option<String>,
    pub reward_type: RewardType,
    pub value: i64,
    pub requirements: Option<RewardRequirements>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    pub fn is_eligible(&self, user: &User, activity: &UserActivity) -> Result<(), UnmetRequirement> {
        match &self.requirements {
            Some(requirements) => requirements.check(user, activity),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub user_id: UserId,
    pub reward: Reward,
    pub claimed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReward {
    pub title: String,
    pub description: Option<String>,
    pub reward_type: RewardType,
    pub value: i64,
    pub requirements: Option<RewardRequirements>,
}

#[derive(Debug, Clone, Default)]
pub struct RewardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_type: Option<RewardType>,
    pub value: Option<i64>,
    pub requirements: Option<RewardRequirements>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct RewardQuery {
    pub active_only: bool,
    pub reward_type: Option<RewardType>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait RewardRepository {
    async fn create_reward(&self, reward: NewReward) -> Result<Reward, RepoError>;
    async fn get_reward(&self, id: RewardId) -> Result<Reward, RepoError>;
    async fn query_rewards(&self, query: RewardQuery) -> Result<Page<Reward>, RepoError>;
    async fn update_reward(&self, id: RewardId, update: RewardUpdate)
    -> Result<Reward, RepoError>;
    async fn claimed_reward_ids(&self, user_id: UserId) -> Result<Vec<RewardId>, RepoError>;
    /// Most recent claim first.
    async fn list_claims(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<UserReward>, RepoError>;
    /// Records the claim, applies a coin or experience value to the user and stores the
    /// notification in one transaction. `UniqueViolation` on a second claim.
    async fn claim(
        &self,
        user_id: UserId,
        reward: &Reward,
        notification: NotificationDraft,
    ) -> Result<(UserReward, Notification), RepoError>;
}

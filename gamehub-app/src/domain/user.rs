use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Page, Pagination, RepoError, SortOrder, UserId,
    notification::{Notification, NotificationDraft},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Role::User),
            "MODERATOR" => Some(Role::Moderator),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gamer_tag: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub level: i32,
    pub experience: i64,
    pub coins: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub bio: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub game_setup: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub teams: u64,
    pub tournaments: u64,
    pub matches: u64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub is_verified: bool,
}

/// Field-wise update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gamer_tag: Option<String>,
    pub avatar: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub password_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub profile: Option<ProfileUpdate>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub game_setup: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortBy {
    CreatedAt,
    Username,
    Level,
    Experience,
}

#[derive(Debug, Clone)]
pub struct UserQuery {
    pub search: Option<String>,
    pub sort_by: UserSortBy,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait UserRepository {
    /// Inserts the user together with an empty profile row.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    async fn get_user(&self, id: UserId) -> Result<User, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_gamer_tag(&self, gamer_tag: &str) -> Result<Option<User>, RepoError>;
    /// Active users only.
    async fn query_users(&self, query: UserQuery) -> Result<Page<User>, RepoError>;
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, RepoError>;
    /// Flips the active flag and stores the notification in one transaction.
    async fn set_active(
        &self,
        id: UserId,
        active: bool,
        notification: NotificationDraft,
    ) -> Result<(User, Notification), RepoError>;
    /// Removes every row referencing the user, then the user row, in one transaction.
    async fn delete_user_cascade(&self, id: UserId) -> Result<(), RepoError>;
    async fn user_activity(&self, id: UserId) -> Result<UserActivity, RepoError>;
}

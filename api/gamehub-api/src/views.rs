use chrono::{DateTime, Utc};
use gamehub_app::{
    domain::{
        UserId,
        user::{Role, User, UserActivity, UserProfile},
    },
    workflow::user::query::PublicProfile,
};
use serde::Serialize;

/// A user record as its owner and admins see it. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub username: String,
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

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            gamer_tag: user.gamer_tag,
            avatar: user.avatar,
            role: user.role,
            is_active: user.is_active,
            is_verified: user.is_verified,
            level: user.level,
            experience: user.experience,
            coins: user.coins,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
            profile: user.profile,
        }
    }
}

/// What anyone may see about a player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserView {
    pub id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gamer_tag: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub level: i32,
    pub experience: i64,
    pub created_at: DateTime<Utc>,
    pub profile: Option<UserProfile>,
}

impl From<User> for PublicUserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            gamer_tag: user.gamer_tag,
            avatar: user.avatar,
            role: user.role,
            level: user.level,
            experience: user.experience,
            created_at: user.created_at,
            profile: user.profile,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    #[serde(flatten)]
    pub user: PublicUserView,
    #[serde(rename = "_count")]
    pub counts: UserActivity,
}

impl From<PublicProfile> for PublicProfileView {
    fn from(profile: PublicProfile) -> Self {
        Self {
            user: profile.user.into(),
            counts: profile.activity,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{NotificationId, Page, Pagination, RepoError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    System,
    Tournament,
    Match,
    Team,
    Transaction,
    Reward,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::System => "SYSTEM",
            NotificationType::Tournament => "TOURNAMENT",
            NotificationType::Match => "MATCH",
            NotificationType::Team => "TEAM",
            NotificationType::Transaction => "TRANSACTION",
            NotificationType::Reward => "REWARD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SYSTEM" => Some(NotificationType::System),
            "TOURNAMENT" => Some(NotificationType::Tournament),
            "MATCH" => Some(NotificationType::Match),
            "TEAM" => Some(NotificationType::Team),
            "TRANSACTION" => Some(NotificationType::Transaction),
            "REWARD" => Some(NotificationType::Reward),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification that has not been stored yet. Repository operations that change
/// state on behalf of a user accept drafts so the row lands in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
}

impl NotificationDraft {
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type,
        }
    }

    pub fn into_notification(self, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(),
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            notification_type: self.notification_type,
            is_read: false,
            created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub user_id: UserId,
    pub notification_type: Option<NotificationType>,
    pub is_read: Option<bool>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCounts {
    pub unread: u64,
    pub total: u64,
}

#[async_trait::async_trait]
pub trait NotificationRepository {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, RepoError>;
    async fn query_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<Page<Notification>, RepoError>;
    async fn count_notifications(&self, user_id: UserId) -> Result<NotificationCounts, RepoError>;
    /// `NotFound` unless the notification belongs to `user_id`.
    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError>;
    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError>;
    async fn delete_notification(&self, user_id: UserId, id: NotificationId)
    -> Result<(), RepoError>;
    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, RepoError>;
}

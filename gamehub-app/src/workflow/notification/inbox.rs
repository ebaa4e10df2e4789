use std::sync::Arc;

use crate::{
    domain::{
        NotificationId, Page, Pagination,
        notification::{
            Notification, NotificationCounts, NotificationQuery, NotificationRepository,
            NotificationType,
        },
        user::User,
    },
    workflow::notification::NotificationError,
};

#[derive(Debug, Clone, Default)]
pub struct InboxFilter {
    pub notification_type: Option<NotificationType>,
    pub is_read: Option<bool>,
    pub pagination: Pagination,
}

/// Every operation is scoped to the calling user's own notifications.
#[async_trait::async_trait]
pub trait InboxUseCase {
    async fn list(&self, user: &User, filter: InboxFilter)
    -> Result<Page<Notification>, NotificationError>;
    async fn counts(&self, user: &User) -> Result<NotificationCounts, NotificationError>;
    async fn mark_read(&self, user: &User, id: NotificationId) -> Result<(), NotificationError>;
    async fn mark_all_read(&self, user: &User) -> Result<u64, NotificationError>;
    async fn delete(&self, user: &User, id: NotificationId) -> Result<(), NotificationError>;
    async fn clear(&self, user: &User) -> Result<u64, NotificationError>;
}

pub struct InboxUseCaseImpl<N: NotificationRepository> {
    notification_repository: Arc<N>,
}

impl<N: NotificationRepository> InboxUseCaseImpl<N> {
    pub fn new(notification_repository: Arc<N>) -> Self {
        Self {
            notification_repository,
        }
    }
}

#[async_trait::async_trait]
impl<N: NotificationRepository + Send + Sync + 'static> InboxUseCase for InboxUseCaseImpl<N> {
    async fn list(
        &self,
        user: &User,
        filter: InboxFilter,
    ) -> Result<Page<Notification>, NotificationError> {
        Ok(self
            .notification_repository
            .query_notifications(NotificationQuery {
                user_id: user.id,
                notification_type: filter.notification_type,
                is_read: filter.is_read,
                pagination: filter.pagination,
            })
            .await?)
    }

    async fn counts(&self, user: &User) -> Result<NotificationCounts, NotificationError> {
        Ok(self
            .notification_repository
            .count_notifications(user.id)
            .await?)
    }

    async fn mark_read(&self, user: &User, id: NotificationId) -> Result<(), NotificationError> {
        Ok(self.notification_repository.mark_read(user.id, id).await?)
    }

    async fn mark_all_read(&self, user: &User) -> Result<u64, NotificationError> {
        Ok(self.notification_repository.mark_all_read(user.id).await?)
    }

    async fn delete(&self, user: &User, id: NotificationId) -> Result<(), NotificationError> {
        Ok(self
            .notification_repository
            .delete_notification(user.id, id)
            .await?)
    }

    async fn clear(&self, user: &User) -> Result<u64, NotificationError> {
        let removed = self
            .notification_repository
            .clear_notifications(user.id)
            .await?;
        log::debug!("Cleared {} notifications for {}", removed, user.id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{notification::NotificationDraft, user::Role},
        testing::InMemoryStore,
    };

    #[tokio::test]
    async fn test_inbox_is_scoped_to_owner() {
        let store = InMemoryStore::new();
        let use_case = InboxUseCaseImpl::new(store.clone());
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let mut ids = Vec::new();
        for title in ["one", "two"] {
            let n = store
                .create_notification(NotificationDraft::new(
                    ada.id,
                    NotificationType::System,
                    title,
                    "hello",
                ))
                .await
                .unwrap();
            ids.push(n.id);
        }

        let foreign = use_case.mark_read(&bob, ids[0]).await;
        assert!(matches!(foreign, Err(NotificationError::NotFound)));
        let foreign = use_case.delete(&bob, ids[0]).await;
        assert!(matches!(foreign, Err(NotificationError::NotFound)));

        use_case.mark_read(&ada, ids[0]).await.unwrap();
        assert_eq!(
            use_case.counts(&ada).await.unwrap(),
            NotificationCounts {
                unread: 1,
                total: 2
            }
        );
        let unread = use_case
            .list(
                &ada,
                InboxFilter {
                    is_read: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unread.items.len(), 1);
        assert_eq!(unread.items[0].title, "two");

        assert_eq!(use_case.mark_all_read(&ada).await.unwrap(), 1);
        assert_eq!(use_case.clear(&bob).await.unwrap(), 0);
        assert_eq!(use_case.clear(&ada).await.unwrap(), 2);
        assert_eq!(use_case.counts(&ada).await.unwrap().total, 0);
    }
}

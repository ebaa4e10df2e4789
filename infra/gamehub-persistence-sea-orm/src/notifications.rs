use chrono::Utc;
use gamehub_app::domain::{
    NotificationId, Page, RepoError, UserId,
    notification::{
        Notification, NotificationCounts, NotificationDraft, NotificationQuery,
        NotificationRepository, NotificationType,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, prelude::Expr,
};

use crate::{create_db_pool, decode, entity::notification, storage_error, window};

pub struct NotificationRepositoryImpl {
    db: DatabaseConnection,
}

impl NotificationRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_notification(model: notification::Model) -> Result<Notification, RepoError> {
    Ok(Notification {
        id: NotificationId(model.id),
        user_id: UserId(model.user_id),
        title: model.title,
        message: model.message,
        notification_type: decode(&model.notification_type, NotificationType::parse)?,
        is_read: model.is_read,
        created_at: model.created_at,
    })
}

/// Inserts a draft on whatever connection the caller is working on, so flows can store
/// their notification inside their own transaction.
pub(crate) async fn store_draft<C: ConnectionTrait>(
    db: &C,
    draft: NotificationDraft,
) -> Result<Notification, RepoError> {
    let notification = draft.into_notification(Utc::now());
    notification::ActiveModel {
        id: Set(notification.id.0),
        user_id: Set(notification.user_id.0),
        title: Set(notification.title.clone()),
        message: Set(notification.message.clone()),
        notification_type: Set(notification.notification_type.as_str().to_string()),
        is_read: Set(false),
        created_at: Set(notification.created_at),
    }
    .insert(db)
    .await
    .map_err(storage_error)?;
    Ok(notification)
}

#[async_trait::async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, RepoError> {
        store_draft(&self.db, draft).await
    }

    async fn query_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<Page<Notification>, RepoError> {
        let mut select =
            notification::Entity::find().filter(notification::Column::UserId.eq(query.user_id.0));
        if let Some(notification_type) = query.notification_type {
            select = select
                .filter(notification::Column::NotificationType.eq(notification_type.as_str()));
        }
        if let Some(is_read) = query.is_read {
            select = select.filter(notification::Column::IsRead.eq(is_read));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_desc(notification::Column::CreatedAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        let items = models
            .into_iter()
            .map(model_to_notification)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn count_notifications(&self, user_id: UserId) -> Result<NotificationCounts, RepoError> {
        let own = notification::Entity::find().filter(notification::Column::UserId.eq(user_id.0));
        let total = own.clone().count(&self.db).await.map_err(storage_error)?;
        let unread = own
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(NotificationCounts { unread, total })
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError> {
        let model = notification::Entity::find_by_id(id.0)
            .filter(notification::Column::UserId.eq(user_id.0))
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        if model.is_read {
            return Ok(());
        }
        let mut model: notification::ActiveModel = model.into();
        model.is_read = Set(true);
        model.update(&self.db).await.map_err(storage_error)?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError> {
        let res = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id.0))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(res.rows_affected)
    }

    async fn delete_notification(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), RepoError> {
        let res = notification::Entity::delete_many()
            .filter(notification::Column::Id.eq(id.0))
            .filter(notification::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        if res.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, RepoError> {
        let res = notification::Entity::delete_many()
            .filter(notification::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(res.rows_affected)
    }
}

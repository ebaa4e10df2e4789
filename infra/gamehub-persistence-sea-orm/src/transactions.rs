use chrono::Utc;
use gamehub_app::domain::{
    LedgerError, Page, RepoError, TransactionId, UserId,
    ledger::{
        NewTransaction, Settlement, Transaction, TransactionMetadata, TransactionQuery,
        TransactionRepository, TransactionStatus, TransactionType,
    },
    notification::{Notification, NotificationDraft},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::{transaction, user},
    flatten_transaction, from_json, notifications::store_draft, storage_error, to_json, window,
};

pub struct TransactionRepositoryImpl {
    db: DatabaseConnection,
}

impl TransactionRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn model_to_transaction(model: transaction::Model) -> Result<Transaction, RepoError> {
    Ok(Transaction {
        id: TransactionId(model.id),
        user_id: UserId(model.user_id),
        transaction_type: decode(&model.transaction_type, TransactionType::parse)?,
        amount: model.amount,
        status: decode(&model.status, TransactionStatus::parse)?,
        description: model.description,
        metadata: model
            .metadata
            .map(from_json::<TransactionMetadata>)
            .transpose()?,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub(crate) async fn insert_transaction<C: ConnectionTrait>(
    db: &C,
    new: NewTransaction,
) -> Result<Transaction, RepoError> {
    let now = Utc::now();
    let model = transaction::ActiveModel {
        id: Set(TransactionId::new().0),
        user_id: Set(new.user_id.0),
        transaction_type: Set(new.transaction_type.as_str().to_string()),
        amount: Set(new.amount),
        status: Set(new.status.as_str().to_string()),
        description: Set(new.description),
        metadata: Set(new.metadata.as_ref().map(to_json).transpose()?),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(storage_error)?;
    model_to_transaction(model)
}

/// Adds `delta` to the user's coins. A debit only applies while the balance covers it,
/// so the balance can never drop below zero.
pub(crate) async fn adjust_coins<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    delta: i64,
) -> Result<(), LedgerError> {
    if delta == 0 {
        return Ok(());
    }
    let mut update = user::Entity::update_many()
        .col_expr(user::Column::Coins, Expr::col(user::Column::Coins).add(delta))
        .filter(user::Column::Id.eq(user_id.0));
    if delta < 0 {
        update = update.filter(user::Column::Coins.gte(-delta));
    }
    let res = update.exec(db).await.map_err(storage_error)?;
    if res.rows_affected > 0 {
        return Ok(());
    }
    let exists = user::Entity::find_by_id(user_id.0)
        .one(db)
        .await
        .map_err(storage_error)?
        .is_some();
    if exists {
        Err(LedgerError::InsufficientBalance)
    } else {
        Err(LedgerError::Repo(RepoError::NotFound))
    }
}

#[async_trait::async_trait]
impl TransactionRepository for TransactionRepositoryImpl {
    async fn create_transaction(
        &self,
        new: NewTransaction,
    ) -> Result<Transaction, RepoError> {
        insert_transaction(&self.db, new).await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, RepoError> {
        let model = transaction::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        model_to_transaction(model)
    }

    async fn query_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, RepoError> {
        let mut select = transaction::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(transaction::Column::UserId.eq(user_id.0));
        }
        if let Some(status) = query.status {
            select = select.filter(transaction::Column::Status.eq(status.as_str()));
        }
        if let Some(transaction_type) = query.transaction_type {
            select =
                select.filter(transaction::Column::TransactionType.eq(transaction_type.as_str()));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_desc(transaction::Column::CreatedAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        let items = models
            .into_iter()
            .map(model_to_transaction)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn settle(
        &self,
        id: TransactionId,
        settlement: Settlement,
        notification: NotificationDraft,
    ) -> Result<(Transaction, Notification), LedgerError> {
        let res = self
            .db
            .transaction::<_, (Transaction, Notification), LedgerError>(|c| {
                Box::pin(async move {
                    let model = transaction::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    let mut current = model_to_transaction(model)?;
                    if current.status != TransactionStatus::Pending {
                        return Err(LedgerError::StaleState);
                    }

                    current.status = match &settlement {
                        Settlement::Approve => {
                            adjust_coins(c, current.user_id, current.approval_delta()).await?;
                            TransactionStatus::Completed
                        }
                        Settlement::Reject { .. } => TransactionStatus::Failed,
                    };
                    if let Settlement::Reject { reason } = settlement {
                        current.metadata = current.metadata.map(|m| m.with_rejection(reason));
                    }
                    current.updated_at = Utc::now();

                    // only a row still pending may settle
                    let res = transaction::Entity::update_many()
                        .col_expr(
                            transaction::Column::Status,
                            Expr::value(current.status.as_str()),
                        )
                        .col_expr(
                            transaction::Column::Metadata,
                            Expr::value(current.metadata.as_ref().map(to_json).transpose()?),
                        )
                        .col_expr(transaction::Column::UpdatedAt, Expr::value(current.updated_at))
                        .filter(transaction::Column::Id.eq(id.0))
                        .filter(
                            transaction::Column::Status.eq(TransactionStatus::Pending.as_str()),
                        )
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    if res.rows_affected == 0 {
                        return Err(LedgerError::StaleState);
                    }

                    let notification = store_draft(c, notification).await?;
                    Ok((current, notification))
                })
            })
            .await;
        flatten_transaction(res)
    }
}

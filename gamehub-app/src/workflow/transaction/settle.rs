use std::sync::Arc;

use crate::{
    domain::{
        TransactionId,
        cache::{CacheStore, CacheStoreExt},
        event::{DomainEvent, Outbox, Room},
        ledger::{Settlement, Transaction, TransactionRepository},
        notification::{NotificationDraft, NotificationType},
        permission::{Capability, authorize},
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::transaction::TransactionError,
};

#[async_trait::async_trait]
pub trait SettleTransactionUseCase {
    async fn approve(&self, actor: &User, id: TransactionId)
    -> Result<Transaction, TransactionError>;
    async fn reject(
        &self,
        actor: &User,
        id: TransactionId,
        reason: Option<String>,
    ) -> Result<Transaction, TransactionError>;
}

pub struct SettleTransactionUseCaseImpl<T: TransactionRepository, C: CacheStore, D: EventDispatcher>
{
    transaction_repository: Arc<T>,
    cache: Arc<C>,
    dispatcher: Arc<D>,
}

impl<T: TransactionRepository, C: CacheStore, D: EventDispatcher>
    SettleTransactionUseCaseImpl<T, C, D>
{
    pub fn new(transaction_repository: Arc<T>, cache: Arc<C>, dispatcher: Arc<D>) -> Self {
        Self {
            transaction_repository,
            cache,
            dispatcher,
        }
    }

    async fn settle(
        &self,
        id: TransactionId,
        settlement: Settlement,
        notification: impl FnOnce(&Transaction) -> NotificationDraft + Send,
    ) -> Result<Transaction, TransactionError> {
        let current = self.transaction_repository.get_transaction(id).await?;
        let draft = notification(&current);
        let (transaction, notification) = self
            .transaction_repository
            .settle(id, settlement, draft)
            .await?;
        self.cache.invalidate_user(transaction.user_id);
        log::info!(
            "Transaction {} settled as {}",
            id,
            transaction.status.as_str()
        );
        self.dispatcher.dispatch(
            Outbox::new()
                .notification(notification)
                .event(
                    Room::User(transaction.user_id),
                    DomainEvent::TransactionUpdated {
                        transaction_id: id,
                        status: transaction.status,
                    },
                ),
        );
        Ok(transaction)
    }
}

#[async_trait::async_trait]
impl<
    T: TransactionRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> SettleTransactionUseCase for SettleTransactionUseCaseImpl<T, C, D>
{
    async fn approve(
        &self,
        actor: &User,
        id: TransactionId,
    ) -> Result<Transaction, TransactionError> {
        authorize(actor, &Capability::ManageTransactions)?;
        self.settle(id, Settlement::Approve, |t| {
            NotificationDraft::new(
                t.user_id,
                NotificationType::Transaction,
                "Transaction Approved",
                format!(
                    "Your {} of {} coins has been approved.",
                    t.transaction_type.as_str().to_lowercase(),
                    t.amount
                ),
            )
        })
        .await
    }

    async fn reject(
        &self,
        actor: &User,
        id: TransactionId,
        reason: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        authorize(actor, &Capability::ManageTransactions)?;
        let message_reason = reason.clone();
        self.settle(
            id,
            Settlement::Reject {
                reason: reason.unwrap_or_default(),
            },
            move |t| {
                let kind = t.transaction_type.as_str().to_lowercase();
                let message = match message_reason {
                    Some(reason) => format!("Your {} has been rejected. Reason: {}", kind, reason),
                    None => format!("Your {} has been rejected.", kind),
                };
                NotificationDraft::new(
                    t.user_id,
                    NotificationType::Transaction,
                    "Transaction Rejected",
                    message,
                )
            },
        )
        .await
    }
}

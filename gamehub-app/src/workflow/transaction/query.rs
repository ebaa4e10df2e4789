use std::sync::Arc;

use crate::{
    domain::{
        Page, TransactionId,
        ledger::{Transaction, TransactionQuery, TransactionRepository},
        permission::{Capability, authorize},
        user::User,
    },
    workflow::transaction::TransactionError,
};

#[async_trait::async_trait]
pub trait TransactionQueryUseCase {
    /// The caller's own ledger; `query.user_id` is overridden.
    async fn list_own(
        &self,
        user: &User,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, TransactionError>;
    /// Entries of other users read as missing.
    async fn get_own(&self, user: &User, id: TransactionId)
    -> Result<Transaction, TransactionError>;
    async fn list_all(
        &self,
        actor: &User,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, TransactionError>;
}

pub struct TransactionQueryUseCaseImpl<T: TransactionRepository> {
    transaction_repository: Arc<T>,
}

impl<T: TransactionRepository> TransactionQueryUseCaseImpl<T> {
    pub fn new(transaction_repository: Arc<T>) -> Self {
        Self {
            transaction_repository,
        }
    }
}

#[async_trait::async_trait]
impl<T: TransactionRepository + Send + Sync + 'static> TransactionQueryUseCase
    for TransactionQueryUseCaseImpl<T>
{
    async fn list_own(
        &self,
        user: &User,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, TransactionError> {
        let query = TransactionQuery {
            user_id: Some(user.id),
            ..query
        };
        Ok(self.transaction_repository.query_transactions(query).await?)
    }

    async fn get_own(
        &self,
        user: &User,
        id: TransactionId,
    ) -> Result<Transaction, TransactionError> {
        let transaction = self.transaction_repository.get_transaction(id).await?;
        if transaction.user_id != user.id {
            return Err(TransactionError::NotFound);
        }
        Ok(transaction)
    }

    async fn list_all(
        &self,
        actor: &User,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, TransactionError> {
        authorize(actor, &Capability::ManageTransactions)?;
        Ok(self.transaction_repository.query_transactions(query).await?)
    }
}

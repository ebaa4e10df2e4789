use std::sync::Arc;

use crate::{
    domain::{
        ledger::{
            NewTransaction, Transaction, TransactionMetadata, TransactionRepository,
            TransactionStatus, TransactionType,
        },
        user::{User, UserRepository},
    },
    workflow::transaction::TransactionError,
};

/// Deposits and withdrawals are only requests; coins move when an admin approves them.
#[async_trait::async_trait]
pub trait CoinRequestUseCase {
    async fn request_deposit(
        &self,
        user: &User,
        amount: i64,
        payment_method: Option<String>,
    ) -> Result<Transaction, TransactionError>;
    /// Rejected up front when the current balance cannot cover `amount`.
    async fn request_withdrawal(
        &self,
        user: &User,
        amount: i64,
        withdrawal_method: Option<String>,
    ) -> Result<Transaction, TransactionError>;
}

pub struct CoinRequestUseCaseImpl<T: TransactionRepository, U: UserRepository> {
    transaction_repository: Arc<T>,
    user_repository: Arc<U>,
}

impl<T: TransactionRepository, U: UserRepository> CoinRequestUseCaseImpl<T, U> {
    pub fn new(transaction_repository: Arc<T>, user_repository: Arc<U>) -> Self {
        Self {
            transaction_repository,
            user_repository,
        }
    }
}

fn via(method: &Option<String>) -> &str {
    method.as_deref().unwrap_or("Unknown")
}

#[async_trait::async_trait]
impl<T: TransactionRepository + Send + Sync + 'static, U: UserRepository + Send + Sync + 'static>
    CoinRequestUseCase for CoinRequestUseCaseImpl<T, U>
{
    async fn request_deposit(
        &self,
        user: &User,
        amount: i64,
        payment_method: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        let transaction = self
            .transaction_repository
            .create_transaction(NewTransaction {
                user_id: user.id,
                transaction_type: TransactionType::Deposit,
                amount,
                status: TransactionStatus::Pending,
                description: Some(format!("Deposit via {}", via(&payment_method))),
                metadata: Some(TransactionMetadata::Deposit {
                    payment_method,
                    rejection_reason: None,
                }),
            })
            .await?;
        log::info!("Deposit {} requested by {}", transaction.id, user.id);
        Ok(transaction)
    }

    async fn request_withdrawal(
        &self,
        user: &User,
        amount: i64,
        withdrawal_method: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        let balance = self.user_repository.get_user(user.id).await?.coins;
        if balance < amount {
            return Err(TransactionError::InsufficientBalance);
        }
        let transaction = self
            .transaction_repository
            .create_transaction(NewTransaction {
                user_id: user.id,
                transaction_type: TransactionType::Withdrawal,
                amount,
                status: TransactionStatus::Pending,
                description: Some(format!("Withdrawal via {}", via(&withdrawal_method))),
                metadata: Some(TransactionMetadata::Withdrawal {
                    withdrawal_method,
                    rejection_reason: None,
                }),
            })
            .await?;
        log::info!("Withdrawal {} requested by {}", transaction.id, user.id);
        Ok(transaction)
    }
}

use crate::domain::{LedgerError, RepoError, permission::AccessDenied};

pub mod query;
pub mod request;
pub mod settle;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Transaction not found")]
    NotFound,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Transaction is not pending")]
    NotPending,
    #[error("Internal server error")]
    Internal,
}

impl From<RepoError> for TransactionError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => TransactionError::NotFound,
            e => {
                log::error!("Transaction storage failure: {}", e);
                TransactionError::Internal
            }
        }
    }
}

impl From<LedgerError> for TransactionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance => TransactionError::InsufficientBalance,
            LedgerError::StaleState => TransactionError::NotPending,
            LedgerError::Repo(e) => e.into(),
        }
    }
}

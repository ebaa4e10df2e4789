use crate::domain::{LedgerError, RepoError, order::OrderStatus, permission::AccessDenied};

pub mod fulfil;
pub mod place;
pub mod query;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("Order not found")]
    NotFound,
    #[error("Items are required")]
    NoItems,
    #[error("Invalid total amount")]
    InvalidTotal,
    #[error("Insufficient coins balance")]
    InsufficientCoins,
    /// The order is not in the status the requested step starts from.
    #[error("{}", refused_step(.0))]
    InvalidTransition(OrderStatus),
    #[error("Internal server error")]
    Internal,
}

fn refused_step(target: &OrderStatus) -> &'static str {
    match target {
        OrderStatus::Cancelled => "Only pending orders can be cancelled",
        OrderStatus::Confirmed => "Only pending orders can be confirmed",
        OrderStatus::Shipped => "Only confirmed orders can be shipped",
        OrderStatus::Delivered => "Only shipped orders can be marked as delivered",
        OrderStatus::Pending => "Orders cannot return to pending",
    }
}

impl From<RepoError> for OrderError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => OrderError::NotFound,
            e => {
                log::error!("Order storage failure: {}", e);
                OrderError::Internal
            }
        }
    }
}

impl OrderError {
    /// Maps a guarded write; a stale guard means the order left `target`'s source status.
    pub(crate) fn from_ledger(e: LedgerError, target: OrderStatus) -> Self {
        match e {
            LedgerError::InsufficientBalance => OrderError::InsufficientCoins,
            LedgerError::StaleState => OrderError::InvalidTransition(target),
            LedgerError::Repo(e) => e.into(),
        }
    }
}

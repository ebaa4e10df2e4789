use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    LedgerError, OrderId, Page, Pagination, RepoError, TransactionId, UserId,
    notification::{Notification, NotificationDraft},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Purchase,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Refund => "REFUND",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEPOSIT" => Some(TransactionType::Deposit),
            "WITHDRAWAL" => Some(TransactionType::Withdrawal),
            "PURCHASE" => Some(TransactionType::Purchase),
            "REFUND" => Some(TransactionType::Refund),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransactionStatus::Pending),
            "COMPLETED" => Some(TransactionStatus::Completed),
            "FAILED" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransactionMetadata {
    Deposit {
        payment_method: Option<String>,
        rejection_reason: Option<String>,
    },
    Withdrawal {
        withdrawal_method: Option<String>,
        rejection_reason: Option<String>,
    },
    Order {
        order_id: OrderId,
    },
}

impl TransactionMetadata {
    pub fn with_rejection(self, reason: String) -> Self {
        match self {
            TransactionMetadata::Deposit { payment_method, .. } => TransactionMetadata::Deposit {
                payment_method,
                rejection_reason: Some(reason),
            },
            TransactionMetadata::Withdrawal {
                withdrawal_method, ..
            } => TransactionMetadata::Withdrawal {
                withdrawal_method,
                rejection_reason: Some(reason),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub metadata: Option<TransactionMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Change to the owner's coin balance once an admin approves this entry.
    pub fn approval_delta(&self) -> i64 {
        match self.transaction_type {
            TransactionType::Deposit => self.amount,
            TransactionType::Withdrawal => -self.amount,
            TransactionType::Purchase | TransactionType::Refund => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub metadata: Option<TransactionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Approve,
    Reject { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub user_id: Option<UserId>,
    pub status: Option<TransactionStatus>,
    pub transaction_type: Option<TransactionType>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait TransactionRepository {
    async fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, RepoError>;
    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, RepoError>;
    /// Newest first.
    async fn query_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, RepoError>;
    /// Moves a pending entry to `Completed` or `Failed`. Approval applies
    /// [`Transaction::approval_delta`] to the owner's balance; a debit that would take
    /// the balance below zero fails with `InsufficientBalance` and nothing is written.
    async fn settle(
        &self,
        id: TransactionId,
        settlement: Settlement,
        notification: NotificationDraft,
    ) -> Result<(Transaction, Notification), LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_is_tagged() {
        let metadata = TransactionMetadata::Deposit {
            payment_method: Some("card".to_string()),
            rejection_reason: None,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["kind"], "deposit");
        assert_eq!(json["paymentMethod"], "card");
    }

    #[test]
    fn test_rejection_keeps_method() {
        let metadata = TransactionMetadata::Withdrawal {
            withdrawal_method: Some("paypal".to_string()),
            rejection_reason: None,
        }
        .with_rejection("duplicate".to_string());
        assert_eq!(
            metadata,
            TransactionMetadata::Withdrawal {
                withdrawal_method: Some("paypal".to_string()),
                rejection_reason: Some("duplicate".to_string()),
            }
        );
    }
}

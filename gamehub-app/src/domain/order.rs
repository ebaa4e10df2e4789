use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    LedgerError, OrderId, Page, Pagination, RepoError, UserId,
    notification::{Notification, NotificationDraft},
};

pub const COIN_PAYMENT: &str = "coins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The next step of the fulfilment pipeline, if any.
    pub fn fulfilment_successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match next {
            OrderStatus::Cancelled => *self == OrderStatus::Pending,
            _ => self.fulfilment_successor() == Some(next),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "CONFIRMED" => Some(OrderStatus::Confirmed),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn paid_with_coins(&self) -> bool {
        self.payment_method.as_deref() == Some(COIN_PAYMENT)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub payment_method: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

impl NewOrder {
    pub fn paid_with_coins(&self) -> bool {
        self.payment_method.as_deref() == Some(COIN_PAYMENT)
    }
}

#[derive(Debug, Clone)]
pub struct OrderTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub shipping_address: Option<ShippingAddress>,
    /// Coins credited back to the owner together with a `Refund` ledger entry.
    pub refund: Option<i64>,
    pub notification: NotificationDraft,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait OrderRepository {
    /// Stores a pending order. A coin payment debits the balance and records a
    /// completed `Purchase` entry in the same transaction, failing with
    /// `InsufficientBalance` (and no order row) when the balance is too low.
    async fn place_order(&self, order: NewOrder) -> Result<Order, LedgerError>;
    async fn get_order(&self, id: OrderId) -> Result<Order, RepoError>;
    /// Newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>, RepoError>;
    /// Applies the transition only while the order is still in `transition.from`,
    /// otherwise `StaleState`.
    async fn transition(
        &self,
        id: OrderId,
        transition: OrderTransition,
    ) -> Result<(Order, Notification), LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfilment_moves_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_only_pending_orders_cancel() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!status.can_transition_to(OrderStatus::Cancelled));
        }
    }
}

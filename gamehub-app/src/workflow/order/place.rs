use std::sync::Arc;

use crate::{
    domain::{
        OrderId,
        cache::{CacheStore, CacheStoreExt},
        event::{DomainEvent, Outbox, Room},
        notification::{NotificationDraft, NotificationType},
        order::{
            NewOrder, Order, OrderItem, OrderRepository, OrderStatus, OrderTransition,
            ShippingAddress,
        },
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::order::OrderError,
};

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub payment_method: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

#[async_trait::async_trait]
pub trait PlaceOrderUseCase {
    /// Paying with coins debits the balance together with the order row.
    async fn place_order(&self, user: &User, request: OrderRequest) -> Result<Order, OrderError>;
    /// Pending orders only; coin payments are refunded.
    async fn cancel_order(&self, user: &User, id: OrderId) -> Result<Order, OrderError>;
}

pub struct PlaceOrderUseCaseImpl<O: OrderRepository, C: CacheStore, D: EventDispatcher> {
    order_repository: Arc<O>,
    cache: Arc<C>,
    dispatcher: Arc<D>,
}

impl<O: OrderRepository, C: CacheStore, D: EventDispatcher> PlaceOrderUseCaseImpl<O, C, D> {
    pub fn new(order_repository: Arc<O>, cache: Arc<C>, dispatcher: Arc<D>) -> Self {
        Self {
            order_repository,
            cache,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl<
    O: OrderRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> PlaceOrderUseCase for PlaceOrderUseCaseImpl<O, C, D>
{
    async fn place_order(&self, user: &User, request: OrderRequest) -> Result<Order, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if request.total_amount <= 0 {
            return Err(OrderError::InvalidTotal);
        }
        let order = self
            .order_repository
            .place_order(NewOrder {
                user_id: user.id,
                items: request.items,
                total_amount: request.total_amount,
                payment_method: request.payment_method,
                shipping_address: request.shipping_address,
            })
            .await
            .map_err(|e| OrderError::from_ledger(e, OrderStatus::Pending))?;
        if order.paid_with_coins() {
            self.cache.invalidate_user(user.id);
        }
        log::info!("Order {} placed by {}", order.id, user.id);
        Ok(order)
    }

    async fn cancel_order(&self, user: &User, id: OrderId) -> Result<Order, OrderError> {
        let current = self.order_repository.get_order(id).await?;
        if current.user_id != user.id {
            return Err(OrderError::NotFound);
        }
        if !current.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition(OrderStatus::Cancelled));
        }
        let refund = current
            .paid_with_coins()
            .then_some(current.total_amount);
        let (order, notification) = self
            .order_repository
            .transition(
                id,
                OrderTransition {
                    from: current.status,
                    to: OrderStatus::Cancelled,
                    shipping_address: None,
                    refund,
                    notification: NotificationDraft::new(
                        user.id,
                        NotificationType::System,
                        "Order Cancelled",
                        format!("Your order #{} has been cancelled successfully.", id),
                    ),
                },
            )
            .await
            .map_err(|e| OrderError::from_ledger(e, OrderStatus::Cancelled))?;
        if refund.is_some() {
            self.cache.invalidate_user(user.id);
        }
        self.dispatcher.dispatch(
            Outbox::new().notification(notification).event(
                Room::User(user.id),
                DomainEvent::OrderUpdated {
                    order_id: id,
                    status: order.status,
                },
            ),
        );
        Ok(order)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        domain::{ledger::TransactionType, order::COIN_PAYMENT, user::Role},
        testing::{self, InMemoryStore, RecordingDispatcher},
    };

    pub(crate) fn coin_order(total_amount: i64) -> OrderRequest {
        OrderRequest {
            items: vec![OrderItem {
                name: "Skin bundle".to_string(),
                quantity: 1,
                price: total_amount,
                product_id: None,
            }],
            total_amount,
            payment_method: Some(COIN_PAYMENT.to_string()),
            shipping_address: None,
        }
    }

    #[tokio::test]
    async fn test_coin_order_needs_balance() {
        let store = InMemoryStore::new();
        let use_case =
            PlaceOrderUseCaseImpl::new(store.clone(), testing::cache(), RecordingDispatcher::new());
        let user = store.seed_user("ada", Role::User, 30);

        let result = use_case.place_order(&user, coin_order(50)).await;
        assert!(matches!(result, Err(OrderError::InsufficientCoins)));
        assert!(store.orders().is_empty());
        assert!(store.transactions_for(user.id).is_empty());

        let mut empty = coin_order(10);
        empty.items.clear();
        assert!(matches!(
            use_case.place_order(&user, empty).await,
            Err(OrderError::NoItems)
        ));
        assert!(matches!(
            use_case.place_order(&user, coin_order(0)).await,
            Err(OrderError::InvalidTotal)
        ));
    }

    #[tokio::test]
    async fn test_cancel_refunds_coin_payment() {
        let store = InMemoryStore::new();
        let dispatcher = RecordingDispatcher::new();
        let use_case =
            PlaceOrderUseCaseImpl::new(store.clone(), testing::cache(), dispatcher.clone());
        let user = store.seed_user("ada", Role::User, 30);
        let other = store.seed_user("bob", Role::User, 0);

        let order = use_case.place_order(&user, coin_order(20)).await.unwrap();
        assert_eq!(store.user(user.id).unwrap().coins, 10);

        let foreign = use_case.cancel_order(&other, order.id).await;
        assert!(matches!(foreign, Err(OrderError::NotFound)));

        let cancelled = use_case.cancel_order(&user, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(store.user(user.id).unwrap().coins, 30);
        let kinds: Vec<TransactionType> = store
            .transactions_for(user.id)
            .iter()
            .map(|t| t.transaction_type)
            .collect();
        assert_eq!(kinds, vec![TransactionType::Purchase, TransactionType::Refund]);

        let again = use_case.cancel_order(&user, order.id).await;
        assert!(matches!(
            again,
            Err(OrderError::InvalidTransition(OrderStatus::Cancelled))
        ));
        assert_eq!(store.user(user.id).unwrap().coins, 30);
        assert_eq!(dispatcher.events().len(), 2);
    }
}

use std::sync::Arc;

use crate::{
    domain::{
        OrderId,
        event::{DomainEvent, Outbox, Room},
        notification::{NotificationDraft, NotificationType},
        order::{Order, OrderRepository, OrderStatus, OrderTransition},
        permission::{Capability, authorize},
        user::User,
    },
    services::dispatch::EventDispatcher,
    workflow::order::OrderError,
};

#[async_trait::async_trait]
pub trait FulfilOrderUseCase {
    async fn confirm_order(&self, actor: &User, id: OrderId) -> Result<Order, OrderError>;
    /// The tracking number is kept on the shipping address.
    async fn ship_order(
        &self,
        actor: &User,
        id: OrderId,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderError>;
    async fn deliver_order(&self, actor: &User, id: OrderId) -> Result<Order, OrderError>;
}

pub struct FulfilOrderUseCaseImpl<O: OrderRepository, D: EventDispatcher> {
    order_repository: Arc<O>,
    dispatcher: Arc<D>,
}

impl<O: OrderRepository, D: EventDispatcher> FulfilOrderUseCaseImpl<O, D> {
    pub fn new(order_repository: Arc<O>, dispatcher: Arc<D>) -> Self {
        Self {
            order_repository,
            dispatcher,
        }
    }

    async fn advance(
        &self,
        actor: &User,
        id: OrderId,
        to: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderError> {
        authorize(actor, &Capability::ManageOrders)?;
        let current = self.order_repository.get_order(id).await?;
        if !current.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition(to));
        }

        let (title, message) = match to {
            OrderStatus::Confirmed => (
                "Order Confirmed",
                format!("Your order #{} has been confirmed and is being processed.", id),
            ),
            OrderStatus::Shipped => (
                "Order Shipped",
                match &tracking_number {
                    Some(tracking) => {
                        format!("Your order #{} has been shipped. Tracking: {}", id, tracking)
                    }
                    None => format!("Your order #{} has been shipped.", id),
                },
            ),
            _ => (
                "Order Delivered",
                format!("Your order #{} has been delivered successfully.", id),
            ),
        };
        let shipping_address = tracking_number.map(|tracking| {
            let mut address = current.shipping_address.clone().unwrap_or_default();
            address.tracking_number = Some(tracking);
            address
        });

        let (order, notification) = self
            .order_repository
            .transition(
                id,
                OrderTransition {
                    from: current.status,
                    to,
                    shipping_address,
                    refund: None,
                    notification: NotificationDraft::new(
                        current.user_id,
                        NotificationType::System,
                        title,
                        message,
                    ),
                },
            )
            .await
            .map_err(|e| OrderError::from_ledger(e, to))?;
        log::info!("Order {} moved to {} by {}", id, to.as_str(), actor.id);
        self.dispatcher.dispatch(
            Outbox::new().notification(notification).event(
                Room::User(order.user_id),
                DomainEvent::OrderUpdated {
                    order_id: id,
                    status: order.status,
                },
            ),
        );
        Ok(order)
    }
}

#[async_trait::async_trait]
impl<O: OrderRepository + Send + Sync + 'static, D: EventDispatcher + Send + Sync + 'static>
    FulfilOrderUseCase for FulfilOrderUseCaseImpl<O, D>
{
    async fn confirm_order(&self, actor: &User, id: OrderId) -> Result<Order, OrderError> {
        self.advance(actor, id, OrderStatus::Confirmed, None).await
    }

    async fn ship_order(
        &self,
        actor: &User,
        id: OrderId,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderError> {
        self.advance(actor, id, OrderStatus::Shipped, tracking_number)
            .await
    }

    async fn deliver_order(&self, actor: &User, id: OrderId) -> Result<Order, OrderError> {
        self.advance(actor, id, OrderStatus::Delivered, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::user::Role,
        testing::{self, InMemoryStore, RecordingDispatcher},
        workflow::order::place::{PlaceOrderUseCase, PlaceOrderUseCaseImpl, tests::coin_order},
    };

    #[tokio::test]
    async fn test_fulfilment_pipeline() {
        let store = InMemoryStore::new();
        let place =
            PlaceOrderUseCaseImpl::new(store.clone(), testing::cache(), RecordingDispatcher::new());
        let use_case = FulfilOrderUseCaseImpl::new(store.clone(), RecordingDispatcher::new());
        let admin = store.seed_user("admin", Role::Admin, 0);
        let user = store.seed_user("ada", Role::User, 100);
        let order = place.place_order(&user, coin_order(40)).await.unwrap();

        let early = use_case
            .ship_order(&admin, order.id, Some("TRK1".to_string()))
            .await;
        assert_eq!(
            early.unwrap_err().to_string(),
            "Only confirmed orders can be shipped"
        );
        let denied = use_case.confirm_order(&user, order.id).await;
        assert!(matches!(denied, Err(OrderError::Access(_))));

        use_case.confirm_order(&admin, order.id).await.unwrap();
        let shipped = use_case
            .ship_order(&admin, order.id, Some("TRK1".to_string()))
            .await
            .unwrap();
        assert_eq!(
            shipped
                .shipping_address
                .and_then(|a| a.tracking_number)
                .as_deref(),
            Some("TRK1")
        );
        let delivered = use_case.deliver_order(&admin, order.id).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        let titles: Vec<String> = store
            .notifications_for(user.id)
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Order Confirmed", "Order Shipped", "Order Delivered"]
        );
    }
}

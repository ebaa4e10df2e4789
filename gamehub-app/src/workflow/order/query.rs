use std::sync::Arc;

use crate::{
    domain::{
        OrderId, Page,
        order::{Order, OrderQuery, OrderRepository},
        permission::{Capability, authorize},
        user::User,
    },
    workflow::order::OrderError,
};

#[async_trait::async_trait]
pub trait OrderQueryUseCase {
    async fn list_own(&self, user: &User, query: OrderQuery) -> Result<Page<Order>, OrderError>;
    async fn get_own(&self, user: &User, id: OrderId) -> Result<Order, OrderError>;
    async fn list_all(&self, actor: &User, query: OrderQuery) -> Result<Page<Order>, OrderError>;
}

pub struct OrderQueryUseCaseImpl<O: OrderRepository> {
    order_repository: Arc<O>,
}

impl<O: OrderRepository> OrderQueryUseCaseImpl<O> {
    pub fn new(order_repository: Arc<O>) -> Self {
        Self { order_repository }
    }
}

#[async_trait::async_trait]
impl<O: OrderRepository + Send + Sync + 'static> OrderQueryUseCase for OrderQueryUseCaseImpl<O> {
    async fn list_own(&self, user: &User, query: OrderQuery) -> Result<Page<Order>, OrderError> {
        let query = OrderQuery {
            user_id: Some(user.id),
            ..query
        };
        Ok(self.order_repository.query_orders(query).await?)
    }

    async fn get_own(&self, user: &User, id: OrderId) -> Result<Order, OrderError> {
        let order = self.order_repository.get_order(id).await?;
        if order.user_id != user.id {
            return Err(OrderError::NotFound);
        }
        Ok(order)
    }

    async fn list_all(&self, actor: &User, query: OrderQuery) -> Result<Page<Order>, OrderError> {
        authorize(actor, &Capability::ManageOrders)?;
        Ok(self.order_repository.query_orders(query).await?)
    }
}

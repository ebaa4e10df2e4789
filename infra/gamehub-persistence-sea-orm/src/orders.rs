use chrono::Utc;
use gamehub_app::domain::{
    LedgerError, OrderId, Page, RepoError, UserId,
    ledger::{NewTransaction, TransactionMetadata, TransactionStatus, TransactionType},
    notification::Notification,
    order::{
        NewOrder, Order, OrderItem, OrderQuery, OrderRepository, OrderStatus, OrderTransition,
        ShippingAddress,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::order,
    flatten_transaction, from_json,
    notifications::store_draft,
    storage_error, to_json,
    transactions::{adjust_coins, insert_transaction},
    window,
};

pub struct OrderRepositoryImpl {
    db: DatabaseConnection,
}

impl OrderRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_order(model: order::Model) -> Result<Order, RepoError> {
        Ok(Order {
            id: OrderId(model.id),
            user_id: UserId(model.user_id),
            items: from_json::<Vec<OrderItem>>(model.items)?,
            total_amount: model.total_amount,
            status: decode(&model.status, OrderStatus::parse)?,
            payment_method: model.payment_method,
            shipping_address: model
                .shipping_address
                .map(from_json::<ShippingAddress>)
                .transpose()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    fn ledger_entry(
        order: &Order,
        transaction_type: TransactionType,
        amount: i64,
        description: String,
    ) -> NewTransaction {
        NewTransaction {
            user_id: order.user_id,
            transaction_type,
            amount,
            status: TransactionStatus::Completed,
            description: Some(description),
            metadata: Some(TransactionMetadata::Order { order_id: order.id }),
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for OrderRepositoryImpl {
    async fn place_order(&self, new_order: NewOrder) -> Result<Order, LedgerError> {
        let res = self
            .db
            .transaction::<_, Order, LedgerError>(|c| {
                Box::pin(async move {
                    let paid_with_coins = new_order.paid_with_coins();
                    if paid_with_coins {
                        adjust_coins(c, new_order.user_id, -new_order.total_amount).await?;
                    }

                    let now = Utc::now();
                    let model = order::ActiveModel {
                        id: Set(OrderId::new().0),
                        user_id: Set(new_order.user_id.0),
                        items: Set(to_json(&new_order.items)?),
                        total_amount: Set(new_order.total_amount),
                        status: Set(OrderStatus::Pending.as_str().to_string()),
                        payment_method: Set(new_order.payment_method),
                        shipping_address: Set(new_order
                            .shipping_address
                            .as_ref()
                            .map(to_json)
                            .transpose()?),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;
                    let order = Self::model_to_order(model)?;

                    if paid_with_coins {
                        insert_transaction(
                            c,
                            Self::ledger_entry(
                                &order,
                                TransactionType::Purchase,
                                order.total_amount,
                                format!("Order #{}", order.id),
                            ),
                        )
                        .await?;
                    }
                    Ok(order)
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, RepoError> {
        let model = order::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        Self::model_to_order(model)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>, RepoError> {
        let mut select = order::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(order::Column::UserId.eq(user_id.0));
        }
        if let Some(status) = query.status {
            select = select.filter(order::Column::Status.eq(status.as_str()));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_desc(order::Column::CreatedAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        let items = models
            .into_iter()
            .map(Self::model_to_order)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn transition(
        &self,
        id: OrderId,
        transition: OrderTransition,
    ) -> Result<(Order, Notification), LedgerError> {
        let res = self
            .db
            .transaction::<_, (Order, Notification), LedgerError>(|c| {
                Box::pin(async move {
                    let model = order::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    let mut order = Self::model_to_order(model)?;
                    if order.status != transition.from {
                        return Err(LedgerError::StaleState);
                    }

                    order.status = transition.to;
                    if let Some(address) = transition.shipping_address {
                        order.shipping_address = Some(address);
                    }
                    order.updated_at = Utc::now();

                    let res = order::Entity::update_many()
                        .col_expr(order::Column::Status, Expr::value(order.status.as_str()))
                        .col_expr(
                            order::Column::ShippingAddress,
                            Expr::value(order.shipping_address.as_ref().map(to_json).transpose()?),
                        )
                        .col_expr(order::Column::UpdatedAt, Expr::value(order.updated_at))
                        .filter(order::Column::Id.eq(id.0))
                        .filter(order::Column::Status.eq(transition.from.as_str()))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    if res.rows_affected == 0 {
                        return Err(LedgerError::StaleState);
                    }

                    if let Some(amount) = transition.refund {
                        adjust_coins(c, order.user_id, amount).await?;
                        insert_transaction(
                            c,
                            Self::ledger_entry(
                                &order,
                                TransactionType::Refund,
                                amount,
                                format!("Refund for cancelled order #{}", order.id),
                            ),
                        )
                        .await?;
                    }

                    let notification = store_draft(c, transition.notification).await?;
                    Ok((order, notification))
                })
            })
            .await;
        flatten_transaction(res)
    }
}

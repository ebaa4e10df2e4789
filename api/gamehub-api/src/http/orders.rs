use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gamehub_app::{
    domain::{
        OrderId, UserId,
        order::{OrderItem, OrderQuery, OrderStatus, ShippingAddress},
    },
    workflow::order::place::OrderRequest,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::{PageParams, Path, Query, ValidJson, parse_enum},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_own).post(place_order))
        .route("/admin/all", get(list_all))
        .route("/{id}", get(get_own))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/confirm", post(confirm_order))
        .route("/{id}/ship", post(ship_order))
        .route("/{id}/deliver", post(deliver_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderFilter {
    status: Option<String>,
    user_id: Option<UserId>,
}

impl OrderFilter {
    fn query(&self, page: &PageParams) -> Result<OrderQuery, ServiceError> {
        Ok(OrderQuery {
            user_id: self.user_id,
            status: parse_enum(self.status.as_deref(), OrderStatus::parse, "status")?,
            pagination: page.pagination(),
        })
    }
}

async fn list_own(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Value>, ServiceError> {
    let orders = app
        .app
        .order_query_use_case
        .list_own(&user, filter.query(&page)?)
        .await?;
    Ok(page.respond("orders", orders))
}

async fn list_all(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Value>, ServiceError> {
    let orders = app
        .app
        .order_query_use_case
        .list_all(&user, filter.query(&page)?)
        .await?;
    Ok(page.respond("orders", orders))
}

async fn get_own(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ServiceError> {
    let order = app.app.order_query_use_case.get_own(&user, id).await?;
    Ok(Json(json!({ "order": order })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody {
    #[validate(length(min = 1, message = "Items are required"))]
    items: Vec<OrderItem>,
    #[validate(range(min = 1, message = "Total amount must be positive"))]
    total_amount: i64,
    #[validate(length(max = 50))]
    payment_method: Option<String>,
    shipping_address: Option<ShippingAddress>,
}

async fn place_order(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<PlaceOrderBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let order = app
        .app
        .order_place_use_case
        .place_order(
            &user,
            OrderRequest {
                items: body.items,
                total_amount: body.total_amount,
                payment_method: body.payment_method,
                shipping_address: body.shipping_address,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

async fn cancel_order(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ServiceError> {
    let order = app.app.order_place_use_case.cancel_order(&user, id).await?;
    Ok(Json(json!({
        "message": "Order cancelled successfully",
        "order": order,
    })))
}

async fn confirm_order(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ServiceError> {
    let order = app.app.order_fulfil_use_case.confirm_order(&user, id).await?;
    Ok(Json(json!({
        "message": "Order confirmed successfully",
        "order": order,
    })))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ShipBody {
    #[validate(length(max = 100))]
    tracking_number: Option<String>,
}

async fn ship_order(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<OrderId>,
    body: Option<Json<ShipBody>>,
) -> Result<Json<Value>, ServiceError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()?;
    let order = app
        .app
        .order_fulfil_use_case
        .ship_order(&user, id, body.tracking_number)
        .await?;
    Ok(Json(json!({
        "message": "Order shipped successfully",
        "order": order,
    })))
}

async fn deliver_order(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ServiceError> {
    let order = app.app.order_fulfil_use_case.deliver_order(&user, id).await?;
    Ok(Json(json!({
        "message": "Order delivered successfully",
        "order": order,
    })))
}

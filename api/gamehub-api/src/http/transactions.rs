use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gamehub_app::domain::{
    TransactionId, UserId,
    ledger::{TransactionQuery, TransactionStatus, TransactionType},
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
        .route("/", get(list_own))
        .route("/deposit", post(request_deposit))
        .route("/withdrawal", post(request_withdrawal))
        .route("/admin/all", get(list_all))
        .route("/{id}", get(get_own))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionFilter {
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    status: Option<String>,
    user_id: Option<UserId>,
}

impl TransactionFilter {
    fn query(&self, page: &PageParams) -> Result<TransactionQuery, ServiceError> {
        Ok(TransactionQuery {
            user_id: self.user_id,
            status: parse_enum(self.status.as_deref(), TransactionStatus::parse, "status")?,
            transaction_type: parse_enum(
                self.transaction_type.as_deref(),
                TransactionType::parse,
                "type",
            )?,
            pagination: page.pagination(),
        })
    }
}

async fn list_own(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Value>, ServiceError> {
    let transactions = app
        .app
        .transaction_query_use_case
        .list_own(&user, filter.query(&page)?)
        .await?;
    Ok(page.respond("transactions", transactions))
}

async fn get_own(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TransactionId>,
) -> Result<Json<Value>, ServiceError> {
    let transaction = app
        .app
        .transaction_query_use_case
        .get_own(&user, id)
        .await?;
    Ok(Json(json!({ "transaction": transaction })))
}

async fn list_all(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Value>, ServiceError> {
    let transactions = app
        .app
        .transaction_query_use_case
        .list_all(&user, filter.query(&page)?)
        .await?;
    Ok(page.respond("transactions", transactions))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DepositBody {
    #[validate(range(min = 1, message = "Amount must be a positive integer"))]
    amount: i64,
    #[validate(length(max = 50))]
    payment_method: Option<String>,
}

async fn request_deposit(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<DepositBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let transaction = app
        .app
        .transaction_request_use_case
        .request_deposit(&user, body.amount, body.payment_method)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Deposit request created. Awaiting admin approval.",
            "transaction": transaction,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct WithdrawalBody {
    #[validate(range(min = 1, message = "Amount must be a positive integer"))]
    amount: i64,
    #[validate(length(max = 50))]
    withdrawal_method: Option<String>,
}

async fn request_withdrawal(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<WithdrawalBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let transaction = app
        .app
        .transaction_request_use_case
        .request_withdrawal(&user, body.amount, body.withdrawal_method)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Withdrawal request created. Awaiting admin approval.",
            "transaction": transaction,
        })),
    ))
}

async fn approve(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TransactionId>,
) -> Result<Json<Value>, ServiceError> {
    let transaction = app
        .app
        .transaction_settle_use_case
        .approve(&user, id)
        .await?;
    Ok(Json(json!({
        "message": "Transaction approved successfully",
        "transaction": transaction,
    })))
}

#[derive(Debug, Default, Deserialize, Validate)]
struct RejectBody {
    #[validate(length(max = 500))]
    reason: Option<String>,
}

async fn reject(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TransactionId>,
    body: Option<Json<RejectBody>>,
) -> Result<Json<Value>, ServiceError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()?;
    let transaction = app
        .app
        .transaction_settle_use_case
        .reject(&user, id, body.reason)
        .await?;
    Ok(Json(json!({
        "message": "Transaction rejected",
        "transaction": transaction,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parses_enums() {
        let filter = TransactionFilter {
            transaction_type: Some("DEPOSIT".to_string()),
            status: Some("PENDING".to_string()),
            user_id: None,
        };
        let page = PageParams {
            page: Some(2),
            limit: Some(10),
        };
        let query = filter.query(&page).unwrap();
        assert_eq!(query.transaction_type, Some(TransactionType::Deposit));
        assert_eq!(query.status, Some(TransactionStatus::Pending));
        assert_eq!(query.pagination.offset, Some(10));

        let bad = TransactionFilter {
            transaction_type: Some("GIFT".to_string()),
            status: None,
            user_id: None,
        };
        assert!(bad.query(&page).is_err());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let body: DepositBody = serde_json::from_value(json!({ "amount": 0 })).unwrap();
        assert!(body.validate().is_err());
    }
}

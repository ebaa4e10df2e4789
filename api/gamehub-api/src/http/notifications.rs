use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use gamehub_app::{
    domain::{NotificationId, notification::NotificationType},
    workflow::notification::inbox::InboxFilter,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::{PageParams, Path, Query, parse_enum},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/count", get(counts))
        .route("/read-all", post(mark_all_read))
        .route("/clear-all", delete(clear))
        .route("/{id}", delete(remove))
        .route("/{id}/read", post(mark_read))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboxParams {
    #[serde(rename = "type")]
    notification_type: Option<String>,
    is_read: Option<bool>,
}

async fn list(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<InboxParams>,
) -> Result<Json<Value>, ServiceError> {
    let notifications = app
        .app
        .notification_inbox_use_case
        .list(
            &user,
            InboxFilter {
                notification_type: parse_enum(
                    params.notification_type.as_deref(),
                    NotificationType::parse,
                    "type",
                )?,
                is_read: params.is_read,
                pagination: page.pagination(),
            },
        )
        .await?;
    Ok(page.respond("notifications", notifications))
}

async fn counts(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let counts = app.app.notification_inbox_use_case.counts(&user).await?;
    Ok(Json(json!({
        "unreadCount": counts.unread,
        "totalCount": counts.total,
    })))
}

async fn mark_read(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<NotificationId>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .notification_inbox_use_case
        .mark_read(&user, id)
        .await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

async fn mark_all_read(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let updated = app
        .app
        .notification_inbox_use_case
        .mark_all_read(&user)
        .await?;
    Ok(Json(json!({
        "message": "All notifications marked as read",
        "count": updated,
    })))
}

async fn remove(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<NotificationId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.notification_inbox_use_case.delete(&user, id).await?;
    Ok(Json(json!({ "message": "Notification deleted successfully" })))
}

async fn clear(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let removed = app.app.notification_inbox_use_case.clear(&user).await?;
    Ok(Json(json!({
        "message": "All notifications cleared",
        "count": removed,
    })))
}

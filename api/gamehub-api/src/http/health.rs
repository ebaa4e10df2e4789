use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health(State(app): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": app.started_at.elapsed().as_secs_f64(),
    }))
}

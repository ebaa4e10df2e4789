use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use gamehub_app::{
    domain::{
        MatchId, TournamentId, UserId,
        r#match::{MatchQuery, MatchResult, MatchStatus, MatchUpdate, ParticipantResult},
    },
    workflow::r#match::manage::MatchDraft,
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
        .route("/", get(list_matches).post(create_match))
        .route("/{id}", get(get_match).put(update_match).delete(delete_match))
        .route("/{id}/participants", get(list_participants))
        .route("/{id}/result", post(submit_result))
        .route("/{id}/start", post(start_match))
        .route("/{id}/cancel", post(cancel_match))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchFilter {
    status: Option<String>,
    game: Option<String>,
    tournament_id: Option<TournamentId>,
}

async fn list_matches(
    State(app): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<MatchFilter>,
) -> Result<Json<Value>, ServiceError> {
    let matches = app
        .app
        .match_query_use_case
        .list_matches(MatchQuery {
            status: parse_enum(filter.status.as_deref(), MatchStatus::parse, "status")?,
            game: filter.game.filter(|g| !g.trim().is_empty()),
            tournament_id: filter.tournament_id,
            pagination: page.pagination(),
        })
        .await?;
    Ok(page.respond("matches", matches))
}

async fn get_match(
    State(app): State<AppState>,
    Path(id): Path<MatchId>,
) -> Result<Json<Value>, ServiceError> {
    let details = app.app.match_query_use_case.get_match(id).await?;
    Ok(Json(json!({ "match": details })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateMatchBody {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    title: String,
    tournament_id: Option<TournamentId>,
    #[validate(length(min = 1, max = 50, message = "Game is required"))]
    game: String,
    #[validate(range(min = 1, message = "Round must be a positive integer"))]
    round: Option<i32>,
    scheduled_at: Option<DateTime<Utc>>,
    #[serde(alias = "participants")]
    #[validate(length(min = 2, message = "At least 2 participants are required"))]
    participant_ids: Vec<UserId>,
}

async fn create_match(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<CreateMatchBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let created = app
        .app
        .match_manage_use_case
        .create_match(
            &user,
            MatchDraft {
                title: body.title,
                tournament_id: body.tournament_id,
                game: body.game,
                round: body.round,
                scheduled_at: body.scheduled_at,
                participants: body.participant_ids,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Match created successfully",
            "match": created,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateMatchBody {
    #[validate(length(min = 1, max = 100))]
    title: Option<String>,
    #[validate(length(min = 1, max = 50))]
    game: Option<String>,
    #[validate(range(min = 1))]
    round: Option<i32>,
    status: Option<MatchStatus>,
    scheduled_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    screenshots: Option<Vec<String>>,
}

async fn update_match(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<MatchId>,
    ValidJson(body): ValidJson<UpdateMatchBody>,
) -> Result<Json<Value>, ServiceError> {
    let updated = app
        .app
        .match_manage_use_case
        .update_match(
            &user,
            id,
            MatchUpdate {
                title: body.title,
                game: body.game,
                round: body.round,
                status: body.status,
                scheduled_at: body.scheduled_at,
                started_at: body.started_at,
                ended_at: body.ended_at,
                screenshots: body.screenshots,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Match updated successfully",
        "match": updated,
    })))
}

async fn delete_match(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<MatchId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.match_manage_use_case.delete_match(&user, id).await?;
    Ok(Json(json!({ "message": "Match deleted successfully" })))
}

async fn list_participants(
    State(app): State<AppState>,
    Auth(_): Auth,
    Path(id): Path<MatchId>,
) -> Result<Json<Value>, ServiceError> {
    let participants = app.app.match_query_use_case.list_participants(id).await?;
    Ok(Json(json!({ "participants": participants })))
}

#[derive(Debug, Deserialize, Validate)]
struct ResultBody {
    #[validate(length(min = 1, message = "Results are required"))]
    results: Vec<ParticipantResult>,
}

async fn submit_result(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<MatchId>,
    ValidJson(body): ValidJson<ResultBody>,
) -> Result<Json<Value>, ServiceError> {
    if body.results.iter().any(|r| r.position < 1) {
        return Err(ServiceError::BadRequest(
            "Positions must start at 1".to_string(),
        ));
    }
    let details = app
        .app
        .match_result_use_case
        .submit_result(&user, id, MatchResult(body.results))
        .await?;
    Ok(Json(json!({
        "message": "Match result submitted successfully",
        "match": details,
    })))
}

async fn start_match(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<MatchId>,
) -> Result<Json<Value>, ServiceError> {
    let started = app.app.match_manage_use_case.start_match(&user, id).await?;
    Ok(Json(json!({
        "message": "Match started successfully",
        "match": started,
    })))
}

async fn cancel_match(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<MatchId>,
) -> Result<Json<Value>, ServiceError> {
    let cancelled = app.app.match_manage_use_case.cancel_match(&user, id).await?;
    Ok(Json(json!({
        "message": "Match cancelled successfully",
        "match": cancelled,
    })))
}

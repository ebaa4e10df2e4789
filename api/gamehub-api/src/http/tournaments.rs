use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use gamehub_app::{
    domain::{
        TournamentId,
        tournament::{TournamentFormat, TournamentQuery, TournamentStatus, TournamentUpdate},
    },
    workflow::tournament::manage::TournamentDraft,
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
        .route("/", get(list_tournaments).post(create_tournament))
        .route(
            "/{id}",
            get(get_tournament)
                .put(update_tournament)
                .delete(delete_tournament),
        )
        .route("/{id}/join", post(join_tournament))
        .route("/{id}/leave", post(leave_tournament))
        .route("/{id}/participants", get(list_participants))
        .route("/{id}/matches", get(list_matches))
        .route("/{id}/start", post(start_tournament))
        .route("/{id}/cancel", post(cancel_tournament))
}

#[derive(Debug, Deserialize)]
struct TournamentFilter {
    status: Option<String>,
    game: Option<String>,
}

async fn list_tournaments(
    State(app): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<TournamentFilter>,
) -> Result<Json<Value>, ServiceError> {
    let tournaments = app
        .app
        .tournament_query_use_case
        .list_tournaments(TournamentQuery {
            status: parse_enum(filter.status.as_deref(), TournamentStatus::parse, "status")?,
            game: filter.game.filter(|g| !g.trim().is_empty()),
            pagination: page.pagination(),
        })
        .await?;
    Ok(page.respond("tournaments", tournaments))
}

async fn get_tournament(
    State(app): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let tournament = app.app.tournament_query_use_case.get_tournament(id).await?;
    Ok(Json(json!({ "tournament": tournament })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTournamentBody {
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    title: String,
    #[validate(length(max = 1000))]
    description: Option<String>,
    #[validate(length(max = 5000))]
    rules: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Game is required"))]
    game: String,
    format: TournamentFormat,
    #[validate(range(min = 2, max = 1000, message = "Max participants must be 2-1000"))]
    max_participants: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Entry fee must be non-negative"))]
    entry_fee: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Prize pool must be non-negative"))]
    prize_pool: i64,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
}

async fn create_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<CreateTournamentBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let tournament = app
        .app
        .tournament_manage_use_case
        .create_tournament(
            &user,
            TournamentDraft {
                title: body.title,
                description: body.description,
                rules: body.rules,
                game: body.game,
                format: body.format,
                max_participants: body.max_participants,
                entry_fee: body.entry_fee,
                prize_pool: body.prize_pool,
                start_date: body.start_date,
                end_date: body.end_date,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Tournament created successfully",
            "tournament": tournament,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateTournamentBody {
    #[validate(length(min = 3, max = 100))]
    title: Option<String>,
    #[validate(length(max = 1000))]
    description: Option<String>,
    #[validate(length(max = 5000))]
    rules: Option<String>,
    #[validate(length(min = 1, max = 50))]
    game: Option<String>,
    format: Option<TournamentFormat>,
    #[validate(range(min = 2, max = 1000))]
    max_participants: Option<i32>,
    #[validate(range(min = 0))]
    entry_fee: Option<i64>,
    #[validate(range(min = 0))]
    prize_pool: Option<i64>,
    status: Option<TournamentStatus>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

async fn update_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
    ValidJson(body): ValidJson<UpdateTournamentBody>,
) -> Result<Json<Value>, ServiceError> {
    let tournament = app
        .app
        .tournament_manage_use_case
        .update_tournament(
            &user,
            id,
            TournamentUpdate {
                title: body.title,
                description: body.description,
                rules: body.rules,
                game: body.game,
                format: body.format,
                max_participants: body.max_participants,
                entry_fee: body.entry_fee,
                prize_pool: body.prize_pool,
                status: body.status,
                start_date: body.start_date,
                end_date: body.end_date,
                banner: None,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Tournament updated successfully",
        "tournament": tournament,
    })))
}

async fn delete_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .tournament_manage_use_case
        .delete_tournament(&user, id)
        .await?;
    Ok(Json(json!({ "message": "Tournament deleted successfully" })))
}

async fn join_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let participant = app
        .app
        .tournament_participation_use_case
        .join_tournament(&user, id)
        .await?;
    Ok(Json(json!({
        "message": "Successfully joined tournament",
        "participant": participant,
    })))
}

async fn leave_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .tournament_participation_use_case
        .leave_tournament(&user, id)
        .await?;
    Ok(Json(json!({ "message": "Successfully left tournament" })))
}

async fn list_participants(
    State(app): State<AppState>,
    Auth(_): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let participants = app
        .app
        .tournament_query_use_case
        .list_participants(id)
        .await?;
    Ok(Json(json!({ "participants": participants })))
}

async fn list_matches(
    State(app): State<AppState>,
    Auth(_): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let matches = app.app.tournament_query_use_case.list_matches(id).await?;
    Ok(Json(json!({ "matches": matches })))
}

async fn start_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let tournament = app
        .app
        .tournament_manage_use_case
        .start_tournament(&user, id)
        .await?;
    Ok(Json(json!({
        "message": "Tournament started successfully",
        "tournament": tournament,
    })))
}

async fn cancel_tournament(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TournamentId>,
) -> Result<Json<Value>, ServiceError> {
    let tournament = app
        .app
        .tournament_manage_use_case
        .cancel_tournament(&user, id)
        .await?;
    Ok(Json(json!({
        "message": "Tournament cancelled successfully",
        "tournament": tournament,
    })))
}

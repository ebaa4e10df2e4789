use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gamehub_app::domain::{
    TeamId, UserId,
    team::{NewTeam, TeamQuery, TeamUpdate},
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::{PageParams, Path, Query, ValidJson},
    http::team_name_rule,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/mine", get(my_team))
        .route("/{id}", get(get_team).put(update_team).delete(delete_team))
        .route("/{id}/join", post(join_team))
        .route("/{id}/leave", post(leave_team))
        .route("/{id}/members", get(list_members))
        .route("/{id}/invite", post(invite))
        .route("/{id}/kick/{user_id}", post(kick_member))
        .route("/{id}/promote/{user_id}", post(promote_member))
}

#[derive(Debug, Deserialize)]
struct TeamFilter {
    search: Option<String>,
}

async fn list_teams(
    State(app): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<TeamFilter>,
) -> Result<Json<Value>, ServiceError> {
    let teams = app
        .app
        .team_query_use_case
        .list_teams(TeamQuery {
            search: filter.search.filter(|s| !s.trim().is_empty()),
            pagination: page.pagination(),
        })
        .await?;
    Ok(page.respond("teams", teams))
}

async fn get_team(
    State(app): State<AppState>,
    Path(id): Path<TeamId>,
) -> Result<Json<Value>, ServiceError> {
    let team = app.app.team_query_use_case.get_team(id).await?;
    Ok(Json(json!({ "team": team })))
}

async fn my_team(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let team = app.app.team_query_use_case.team_of(user.id).await?;
    Ok(Json(json!({ "team": team })))
}

fn default_max_members() -> i32 {
    5
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTeamBody {
    #[validate(
        length(min = 3, max = 50, message = "Team name must be 3-50 characters"),
        custom(function = "team_name_rule")
    )]
    name: String,
    #[validate(length(max = 500))]
    description: Option<String>,
    #[serde(default = "default_max_members")]
    #[validate(range(min = 2, max = 20, message = "Max members must be 2-20"))]
    max_members: i32,
}

async fn create_team(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<CreateTeamBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let team = app
        .app
        .team_manage_use_case
        .create_team(
            &user,
            NewTeam {
                name: body.name.trim().to_string(),
                description: body.description,
                max_members: body.max_members,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Team created successfully",
            "team": team,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateTeamBody {
    #[validate(length(min = 3, max = 50), custom(function = "team_name_rule"))]
    name: Option<String>,
    #[validate(length(max = 500))]
    description: Option<String>,
    #[validate(range(min = 2, max = 20))]
    max_members: Option<i32>,
}

async fn update_team(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TeamId>,
    ValidJson(body): ValidJson<UpdateTeamBody>,
) -> Result<Json<Value>, ServiceError> {
    let team = app
        .app
        .team_manage_use_case
        .update_team(
            &user,
            id,
            TeamUpdate {
                name: body.name.map(|n| n.trim().to_string()),
                description: body.description,
                max_members: body.max_members,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Team updated successfully",
        "team": team,
    })))
}

async fn delete_team(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TeamId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.team_manage_use_case.delete_team(&user, id).await?;
    Ok(Json(json!({ "message": "Team deleted successfully" })))
}

async fn join_team(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TeamId>,
) -> Result<Json<Value>, ServiceError> {
    let member = app.app.team_membership_use_case.join_team(&user, id).await?;
    Ok(Json(json!({
        "message": "Successfully joined team",
        "member": member,
    })))
}

async fn leave_team(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TeamId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.team_membership_use_case.leave_team(&user, id).await?;
    Ok(Json(json!({ "message": "Successfully left team" })))
}

async fn list_members(
    State(app): State<AppState>,
    Auth(_): Auth,
    Path(id): Path<TeamId>,
) -> Result<Json<Value>, ServiceError> {
    let members = app.app.team_query_use_case.list_members(id).await?;
    Ok(Json(json!({ "members": members })))
}

#[derive(Debug, Deserialize, Validate)]
struct InviteBody {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
}

async fn invite(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<TeamId>,
    ValidJson(body): ValidJson<InviteBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .team_manage_use_case
        .invite(&user, id, body.username.trim())
        .await?;
    Ok(Json(json!({ "message": "Invitation sent successfully" })))
}

async fn kick_member(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path((id, member)): Path<(TeamId, UserId)>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .team_membership_use_case
        .kick_member(&user, id, member)
        .await?;
    Ok(Json(json!({ "message": "Member kicked successfully" })))
}

async fn promote_member(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path((id, member)): Path<(TeamId, UserId)>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .team_membership_use_case
        .promote_member(&user, id, member)
        .await?;
    Ok(Json(json!({ "message": "Member promoted to leader successfully" })))
}

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gamehub_app::domain::{
    RewardId,
    reward::{NewReward, RewardQuery, RewardRequirements, RewardType, RewardUpdate},
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
        .route("/", get(list_rewards).post(create_reward))
        .route("/user/available", get(available_rewards))
        .route("/user/claimed", get(claimed_rewards))
        .route("/user/counts", get(reward_counts))
        .route(
            "/{id}",
            get(get_reward).put(update_reward).delete(delete_reward),
        )
        .route("/{id}/claim", post(claim_reward))
}

#[derive(Debug, Deserialize)]
struct RewardFilter {
    #[serde(rename = "type")]
    reward_type: Option<String>,
    /// `false` lists inactive rewards too.
    active: Option<bool>,
}

async fn list_rewards(
    State(app): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<RewardFilter>,
) -> Result<Json<Value>, ServiceError> {
    let rewards = app
        .app
        .reward_query_use_case
        .list_rewards(RewardQuery {
            active_only: filter.active.unwrap_or(true),
            reward_type: parse_enum(filter.reward_type.as_deref(), RewardType::parse, "type")?,
            pagination: page.pagination(),
        })
        .await?;
    Ok(page.respond("rewards", rewards))
}

async fn get_reward(
    State(app): State<AppState>,
    Path(id): Path<RewardId>,
) -> Result<Json<Value>, ServiceError> {
    let reward = app.app.reward_query_use_case.get_reward(id).await?;
    Ok(Json(json!({ "reward": reward })))
}

async fn available_rewards(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let rewards = app.app.reward_query_use_case.available_rewards(&user).await?;
    Ok(Json(json!({ "rewards": rewards })))
}

async fn claimed_rewards(
    State(app): State<AppState>,
    Auth(user): Auth,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ServiceError> {
    let claimed = app
        .app
        .reward_query_use_case
        .claimed_rewards(&user, page.pagination())
        .await?;
    Ok(page.respond("rewards", claimed))
}

async fn reward_counts(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let counts = app.app.reward_query_use_case.reward_counts(&user).await?;
    Ok(Json(json!(counts)))
}

async fn claim_reward(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<RewardId>,
) -> Result<Json<Value>, ServiceError> {
    let claimed = app.app.reward_claim_use_case.claim_reward(&user, id).await?;
    Ok(Json(json!({
        "message": "Reward claimed successfully",
        "userReward": claimed,
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateRewardBody {
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    title: String,
    #[validate(length(max = 500))]
    description: Option<String>,
    #[serde(rename = "type")]
    reward_type: RewardType,
    #[validate(range(min = 0, message = "Value must be non-negative"))]
    value: i64,
    requirements: Option<RewardRequirements>,
}

async fn create_reward(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<CreateRewardBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let reward = app
        .app
        .reward_manage_use_case
        .create_reward(
            &user,
            NewReward {
                title: body.title,
                description: body.description,
                reward_type: body.reward_type,
                value: body.value,
                requirements: body.requirements,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Reward created successfully",
            "reward": reward,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateRewardBody {
    #[validate(length(min = 3, max = 100))]
    title: Option<String>,
    #[validate(length(max = 500))]
    description: Option<String>,
    #[serde(rename = "type")]
    reward_type: Option<RewardType>,
    #[validate(range(min = 0))]
    value: Option<i64>,
    requirements: Option<RewardRequirements>,
    is_active: Option<bool>,
}

async fn update_reward(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<RewardId>,
    ValidJson(body): ValidJson<UpdateRewardBody>,
) -> Result<Json<Value>, ServiceError> {
    let reward = app
        .app
        .reward_manage_use_case
        .update_reward(
            &user,
            id,
            RewardUpdate {
                title: body.title,
                description: body.description,
                reward_type: body.reward_type,
                value: body.value,
                requirements: body.requirements,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Reward updated successfully",
        "reward": reward,
    })))
}

async fn delete_reward(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<RewardId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.reward_manage_use_case.delete_reward(&user, id).await?;
    Ok(Json(json!({ "message": "Reward deleted successfully" })))
}

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use gamehub_app::{
    domain::{
        GameProfileId, SortOrder, UserId,
        game_profile::{GameProfileInput, GameProfileUpdate},
        user::{Role, UserQuery, UserSortBy},
    },
    workflow::user::{
        admin::{AdminNewUser, AdminUserUpdate},
        profile::ProfileChanges,
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::{PageParams, Path, Query, ValidJson, image_field, parse_enum},
    http::{country_rule, password_rule, username_rule},
    views::{PublicProfileView, PublicUserView, UserView},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/profile", put(update_profile))
        .route("/upload-avatar", post(upload_avatar))
        .route("/avatar", delete(delete_avatar))
        .route("/me/games", get(list_games).post(save_game))
        .route(
            "/me/games/{profile_id}",
            put(update_game).delete(delete_game),
        )
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/ban", post(ban_user))
        .route("/{id}/unban", post(unban_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFilter {
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

fn sort_by(raw: Option<&str>) -> Result<UserSortBy, ServiceError> {
    match raw {
        None | Some("createdAt") => Ok(UserSortBy::CreatedAt),
        Some("username") => Ok(UserSortBy::Username),
        Some("level") => Ok(UserSortBy::Level),
        Some("experience") => Ok(UserSortBy::Experience),
        Some(other) => Err(ServiceError::BadRequest(format!("Invalid sortBy {}", other))),
    }
}

fn sort_order(raw: Option<&str>) -> Result<SortOrder, ServiceError> {
    match raw {
        None | Some("desc") => Ok(SortOrder::Descending),
        Some("asc") => Ok(SortOrder::Ascending),
        Some(other) => Err(ServiceError::BadRequest(format!("Invalid sortOrder {}", other))),
    }
}

async fn list_users(
    State(app): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Value>, ServiceError> {
    let users = app
        .app
        .user_query_use_case
        .list_users(UserQuery {
            search: filter.search.filter(|s| !s.trim().is_empty()),
            sort_by: sort_by(filter.sort_by.as_deref())?,
            sort_order: sort_order(filter.sort_order.as_deref())?,
            pagination: page.pagination(),
        })
        .await?;
    Ok(page.respond("users", users.map(PublicUserView::from)))
}

async fn get_user(
    State(app): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Value>, ServiceError> {
    let profile = app.app.user_query_use_case.get_profile(id).await?;
    Ok(Json(json!({ "user": PublicProfileView::from(profile) })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ProfileBody {
    #[validate(length(min = 1, max = 50))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    last_name: Option<String>,
    #[validate(length(min = 3, max = 30), custom(function = "username_rule"))]
    gamer_tag: Option<String>,
    #[validate(length(max = 500))]
    bio: Option<String>,
    #[validate(custom(function = "country_rule"))]
    country: Option<String>,
    #[validate(length(max = 64))]
    timezone: Option<String>,
}

async fn update_profile(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<ProfileBody>,
) -> Result<Json<Value>, ServiceError> {
    let updated = app
        .app
        .user_profile_use_case
        .update_profile(
            user.id,
            ProfileChanges {
                first_name: body.first_name,
                last_name: body.last_name,
                gamer_tag: body.gamer_tag,
                bio: body.bio,
                country: body.country.map(|c| c.to_uppercase()),
                timezone: body.timezone,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserView::from(updated),
    })))
}

async fn upload_avatar(
    State(app): State<AppState>,
    Auth(user): Auth,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ServiceError> {
    let upload = image_field(multipart?, "avatar").await?;
    let (updated, image) = app
        .app
        .user_profile_use_case
        .upload_avatar(user.id, upload)
        .await?;
    Ok(Json(json!({
        "message": "Avatar uploaded successfully",
        "user": UserView::from(updated),
        "imageUrl": image.url,
        "publicId": image.public_id,
    })))
}

async fn delete_avatar(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    app.app.user_profile_use_case.delete_avatar(user.id).await?;
    Ok(Json(json!({ "message": "Avatar deleted successfully" })))
}

async fn list_games(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let games = &app.app.user_game_profile_use_case;
    let profiles = games.list_game_profiles(user.id).await?;
    Ok(Json(json!({
        "gameProfiles": profiles,
        "supportedGames": games.supported_games(),
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct GameProfileBody {
    #[validate(length(min = 1, max = 50))]
    game_id: String,
    #[validate(length(min = 1, max = 50))]
    game_name: String,
    #[serde(alias = "gameUID")]
    #[validate(length(min = 1, max = 50))]
    game_uid: String,
    #[validate(length(min = 1, max = 50))]
    in_game_name: String,
}

async fn save_game(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<GameProfileBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let profile = app
        .app
        .user_game_profile_use_case
        .save_game_profile(
            user.id,
            GameProfileInput {
                game_id: body.game_id,
                game_name: body.game_name,
                game_uid: body.game_uid,
                in_game_name: body.in_game_name,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Game profile saved successfully",
            "gameProfile": profile,
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct GameProfileUpdateBody {
    #[serde(alias = "gameUID")]
    #[validate(length(min = 1, max = 50))]
    game_uid: Option<String>,
    #[validate(length(min = 1, max = 50))]
    in_game_name: Option<String>,
    is_primary: Option<bool>,
}

async fn update_game(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(profile_id): Path<GameProfileId>,
    ValidJson(body): ValidJson<GameProfileUpdateBody>,
) -> Result<Json<Value>, ServiceError> {
    let profile = app
        .app
        .user_game_profile_use_case
        .update_game_profile(
            user.id,
            profile_id,
            GameProfileUpdate {
                game_uid: body.game_uid,
                in_game_name: body.in_game_name,
                is_primary: body.is_primary,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Game profile updated successfully",
        "gameProfile": profile,
    })))
}

async fn delete_game(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(profile_id): Path<GameProfileId>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .user_game_profile_use_case
        .delete_game_profile(user.id, profile_id)
        .await?;
    Ok(Json(json!({ "message": "Game profile deleted successfully" })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody {
    #[validate(email(message = "Valid email is required"))]
    email: String,
    #[validate(length(min = 3, max = 30), custom(function = "username_rule"))]
    username: String,
    #[validate(custom(function = "password_rule"))]
    password: String,
    #[validate(length(min = 1, max = 50))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    last_name: Option<String>,
    role: Option<String>,
}

async fn create_user(
    State(app): State<AppState>,
    Auth(actor): Auth,
    ValidJson(body): ValidJson<CreateUserBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let role = parse_enum(body.role.as_deref(), Role::parse, "role")?.unwrap_or(Role::User);
    let created = app
        .app
        .user_admin_use_case
        .create_user(
            &actor,
            AdminNewUser {
                email: body.email.trim().to_lowercase(),
                username: body.username,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                role,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": UserView::from(created),
        })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateUserBody {
    role: Option<String>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
}

async fn update_user(
    State(app): State<AppState>,
    Auth(actor): Auth,
    Path(id): Path<UserId>,
    ValidJson(body): ValidJson<UpdateUserBody>,
) -> Result<Json<Value>, ServiceError> {
    let updated = app
        .app
        .user_admin_use_case
        .update_user(
            &actor,
            id,
            AdminUserUpdate {
                role: parse_enum(body.role.as_deref(), Role::parse, "role")?,
                is_active: body.is_active,
                is_verified: body.is_verified,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "User updated successfully",
        "user": UserView::from(updated),
    })))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    permanent: bool,
}

async fn delete_user(
    State(app): State<AppState>,
    Auth(actor): Auth,
    Path(id): Path<UserId>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .user_admin_use_case
        .delete_user(&actor, id, params.permanent)
        .await?;
    let message = if params.permanent {
        "User permanently deleted"
    } else {
        "User deleted successfully"
    };
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Default, Deserialize)]
struct BanBody {
    reason: Option<String>,
}

async fn ban_user(
    State(app): State<AppState>,
    Auth(actor): Auth,
    Path(id): Path<UserId>,
    body: Option<Json<BanBody>>,
) -> Result<Json<Value>, ServiceError> {
    let reason = body.and_then(|Json(body)| body.reason);
    app.app.user_admin_use_case.ban_user(&actor, id, reason).await?;
    Ok(Json(json!({ "message": "User banned successfully" })))
}

async fn unban_user(
    State(app): State<AppState>,
    Auth(actor): Auth,
    Path(id): Path<UserId>,
) -> Result<Json<Value>, ServiceError> {
    app.app.user_admin_use_case.unban_user(&actor, id).await?;
    Ok(Json(json!({ "message": "User unbanned successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_params() {
        assert_eq!(sort_by(None).unwrap(), UserSortBy::CreatedAt);
        assert_eq!(sort_by(Some("level")).unwrap(), UserSortBy::Level);
        assert!(sort_by(Some("coins")).is_err());
        assert_eq!(sort_order(Some("asc")).unwrap(), SortOrder::Ascending);
        assert!(sort_order(Some("up")).is_err());
    }

    #[test]
    fn test_profile_body_rules() {
        let body: ProfileBody = serde_json::from_value(json!({
            "bio": "x".repeat(501),
            "country": "Nepal",
        }))
        .unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("bio"));
        assert!(errors.field_errors().contains_key("country"));
    }
}

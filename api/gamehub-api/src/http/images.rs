use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::{delete, get, post},
};
use gamehub_app::{
    domain::{MatchId, TeamId, TournamentId},
    ports::image_storage::ImageTransform,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::{Path, Query, image_field, image_fields},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transform/{*public_id}", get(transform_url))
        .route("/team/{team_id}/logo", post(upload_team_logo))
        .route("/tournament/{tournament_id}/banner", post(upload_tournament_banner))
        .route("/match/{match_id}/screenshots", post(upload_match_screenshots))
        .route("/{*public_id}", delete(delete_image))
}

#[derive(Debug, Default, Deserialize)]
struct TransformParams {
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<String>,
    format: Option<String>,
}

impl From<TransformParams> for ImageTransform {
    fn from(p: TransformParams) -> Self {
        ImageTransform {
            width: p.width,
            height: p.height,
            quality: p.quality,
            format: p.format,
        }
    }
}

async fn transform_url(
    State(app): State<AppState>,
    Path(public_id): Path<String>,
    Query(params): Query<TransformParams>,
) -> Result<Json<Value>, ServiceError> {
    let url = app
        .app
        .image_use_case
        .transform_url(&public_id, &params.into())?;
    Ok(Json(json!({ "url": url })))
}

async fn upload_team_logo(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(team_id): Path<TeamId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ServiceError> {
    let upload = image_field(multipart?, "logo").await?;
    let (team, image) = app
        .app
        .image_use_case
        .upload_team_logo(&user, team_id, upload)
        .await?;
    Ok(Json(json!({
        "message": "Team logo uploaded successfully",
        "team": team,
        "imageUrl": image.url,
        "publicId": image.public_id,
    })))
}

async fn upload_tournament_banner(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(tournament_id): Path<TournamentId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ServiceError> {
    let upload = image_field(multipart?, "banner").await?;
    let (tournament, uploaded) = app
        .app
        .image_use_case
        .upload_tournament_banner(&user, tournament_id, upload)
        .await?;
    Ok(Json(json!({
        "message": "Tournament banner uploaded successfully",
        "tournament": tournament,
        "imageUrl": uploaded.image.url,
        "publicId": uploaded.image.public_id,
        "optimizedUrls": uploaded.optimized_urls,
    })))
}

async fn upload_match_screenshots(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(match_id): Path<MatchId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ServiceError> {
    let uploads = image_fields(multipart?, "screenshots").await?;
    let images = app
        .app
        .image_use_case
        .upload_match_screenshots(&user, match_id, uploads)
        .await?;
    Ok(Json(json!({
        "message": "Screenshots uploaded successfully",
        "images": images,
    })))
}

async fn delete_image(
    State(app): State<AppState>,
    Auth(user): Auth,
    Path(public_id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    app.app.image_use_case.delete_image(&user, &public_id).await?;
    Ok(Json(json!({ "message": "Image deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_params() {
        let params: TransformParams =
            serde_json::from_value(json!({ "width": 300, "quality": "auto" })).unwrap();
        let transform = ImageTransform::from(params);
        assert_eq!(transform.width, Some(300));
        assert_eq!(transform.height, None);
        assert_eq!(transform.quality.as_deref(), Some("auto"));
    }
}

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
};
use gamehub_app::{
    domain::{Page, Pagination},
    ports::image_storage::ImageUpload,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use validator::Validate;

use crate::error::ServiceError;

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServiceError))]
pub struct Query<T>(pub T);

/// A JSON body that passed its `validator` rules.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Pagination::DEFAULT_LIMIT)
            .clamp(1, Pagination::MAX_LIMIT)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.page(), self.limit())
    }

    /// Wraps a page as `{ <key>: [...], pagination: {...} }`.
    pub fn respond<T: Serialize>(&self, key: &str, page: Page<T>) -> Json<serde_json::Value> {
        let limit = self.limit() as u64;
        Json(json!({
            key: page.items,
            "pagination": {
                "page": self.page(),
                "limit": limit,
                "total": page.total,
                "totalPages": page.total.div_ceil(limit),
            }
        }))
    }
}

/// Collects every file sent under `field`.
pub async fn image_fields(
    mut multipart: Multipart,
    field: &str,
) -> Result<Vec<ImageUpload>, ServiceError> {
    let mut uploads = Vec::new();
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let content_type = part.content_type().unwrap_or_default().to_string();
        let data = part.bytes().await?;
        uploads.push(ImageUpload {
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(uploads)
}

/// The first file sent under `field`.
pub async fn image_field(multipart: Multipart, field: &str) -> Result<ImageUpload, ServiceError> {
    image_fields(multipart, field)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::BadRequest("No image file provided".to_string()))
}

pub fn parse_enum<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
) -> Result<Option<T>, ServiceError> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| ServiceError::BadRequest(format!("Invalid {}", what))),
    }
}

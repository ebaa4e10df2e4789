use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use gamehub_app::domain::user::User;

use crate::{AppState, error::ServiceError};

/// The active user behind the request's bearer token.
pub struct Auth(pub User);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ServiceError::Unauthorized("Access token required".to_string()))?;
        let user = state
            .app
            .account_authenticate_use_case
            .authenticate(bearer.token())
            .await?;
        Ok(Auth(user))
    }
}

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gamehub_app::workflow::account::{AuthSession, register::Registration};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::Auth,
    error::ServiceError,
    extract::ValidJson,
    http::{password_rule, username_rule},
    views::UserView,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}

fn session_body(message: &str, session: AuthSession) -> Json<Value> {
    Json(json!({
        "message": message,
        "user": UserView::from(session.user),
        "accessToken": session.tokens.access_token,
        "refreshToken": session.tokens.refresh_token,
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    #[validate(email(message = "Valid email is required"))]
    email: String,
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3-30 characters"),
        custom(function = "username_rule")
    )]
    username: String,
    #[validate(custom(function = "password_rule"))]
    password: String,
    #[validate(length(min = 1, max = 50))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    last_name: Option<String>,
}

async fn register(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let session = app
        .app
        .account_register_use_case
        .register(Registration {
            email: body.email.trim().to_lowercase(),
            username: body.username,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        session_body(
            "Registration successful. Please check your email to verify your account.",
            session,
        ),
    ))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginBody {
    #[validate(email(message = "Valid email is required"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

async fn login(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<LoginBody>,
) -> Result<Json<Value>, ServiceError> {
    let session = app
        .app
        .account_session_use_case
        .login(&body.email.trim().to_lowercase(), &body.password)
        .await?;
    Ok(session_body("Login successful", session))
}

#[derive(Debug, Deserialize, Validate)]
struct TokenBody {
    #[serde(default)]
    token: String,
}

async fn verify_email(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<TokenBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .account_verification_use_case
        .verify_email(&body.token)
        .await?;
    Ok(Json(json!({ "message": "Email verified successfully!" })))
}

#[derive(Debug, Deserialize, Validate)]
struct EmailBody {
    #[validate(email(message = "Valid email is required"))]
    email: String,
}

async fn resend_verification(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<EmailBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .account_verification_use_case
        .resend_verification(&body.email.trim().to_lowercase())
        .await?;
    Ok(Json(json!({ "message": "Verification email sent" })))
}

async fn forgot_password(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<EmailBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .account_password_use_case
        .forgot_password(&body.email.trim().to_lowercase())
        .await?;
    Ok(Json(json!({
        "message": "If the email exists, a reset link has been sent"
    })))
}

#[derive(Debug, Deserialize, Validate)]
struct ResetPasswordBody {
    #[validate(length(min = 1, message = "Reset token is required"))]
    token: String,
    #[validate(custom(function = "password_rule"))]
    password: String,
}

async fn reset_password(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<ResetPasswordBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .account_password_use_case
        .reset_password(&body.token, &body.password)
        .await?;
    Ok(Json(json!({ "message": "Password reset successful" })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    refresh_token: String,
}

async fn refresh_token(
    State(app): State<AppState>,
    ValidJson(body): ValidJson<RefreshBody>,
) -> Result<Json<Value>, ServiceError> {
    let session = app
        .app
        .account_session_use_case
        .refresh(&body.refresh_token)
        .await?;
    Ok(Json(json!({
        "accessToken": session.tokens.access_token,
        "refreshToken": session.tokens.refresh_token,
    })))
}

async fn logout(State(app): State<AppState>, Auth(user): Auth) -> Json<Value> {
    app.app.account_session_use_case.logout(user.id);
    Json(json!({ "message": "Logout successful" }))
}

async fn me(Auth(user): Auth) -> Json<Value> {
    Json(json!({ "user": UserView::from(user) }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody {
    #[validate(length(min = 1, message = "Current password is required"))]
    current_password: String,
    #[validate(custom(function = "password_rule"))]
    new_password: String,
}

async fn change_password(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<ChangePasswordBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .account_password_use_case
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

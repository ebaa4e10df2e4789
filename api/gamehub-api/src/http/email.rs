use axum::{Json, Router, extract::State, routing::post};
use gamehub_app::{domain::mail::TournamentInvitation, workflow::email::outreach::TestTemplate};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{AppState, auth::Auth, error::ServiceError, extract::ValidJson};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/test-config", post(test_config))
        .route("/test-send", post(test_send))
        .route("/tournament-invitation", post(tournament_invitation))
}

async fn test_config(
    State(app): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ServiceError> {
    let valid = app.app.email_outreach_use_case.test_config(&user).await?;
    let message = if valid {
        "Email configuration is valid"
    } else {
        "Email configuration failed"
    };
    Ok(Json(json!({ "message": message, "isValid": valid })))
}

fn default_template() -> String {
    "welcome".to_string()
}

#[derive(Debug, Deserialize, Validate)]
struct TestSendBody {
    #[serde(default)]
    #[validate(length(max = 254))]
    to: String,
    #[serde(default = "default_template")]
    template: String,
}

async fn test_send(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<TestSendBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .email_outreach_use_case
        .test_send(&user, body.to.trim(), TestTemplate::parse(&body.template))
        .await?;
    Ok(Json(json!({ "message": "Test email sent successfully" })))
}

/// Required fields default to empty so their absence is reported as a 400 by the use case.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct InvitationBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    tournament_name: String,
    game: Option<String>,
    start_date: Option<String>,
    entry_fee: Option<i64>,
    prize_pool: Option<i64>,
    max_participants: Option<i32>,
}

async fn tournament_invitation(
    State(app): State<AppState>,
    Auth(user): Auth,
    ValidJson(body): ValidJson<InvitationBody>,
) -> Result<Json<Value>, ServiceError> {
    app.app
        .email_outreach_use_case
        .send_tournament_invitation(
            &user,
            body.email.trim(),
            body.username.trim(),
            TournamentInvitation {
                tournament_name: body.tournament_name,
                game: body.game,
                start_date: body.start_date,
                entry_fee: body.entry_fee,
                prize_pool: body.prize_pool,
                max_participants: body.max_participants,
            },
        )
        .await?;
    Ok(Json(json!({ "message": "Tournament invitation sent successfully" })))
}

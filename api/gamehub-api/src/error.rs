use std::sync::LazyLock;

use axum::{
    Json,
    extract::{
        Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gamehub_app::{
    domain::permission::AccessDenied,
    workflow::{
        account::AccountError, email::EmailError, image::ImageError, r#match::MatchError,
        notification::NotificationError, order::OrderError, reward::RewardError, team::TeamError,
        tournament::TournamentError, transaction::TransactionError, user::UserError,
    },
};
use serde_json::json;

static DEVELOPMENT: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("GAMEHUB_ENV")
        .map(|env| env == "development")
        .unwrap_or(false)
});

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The payload is only shown to clients in development.
    #[error("Internal server error")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ServiceError::Internal(details) if !details.is_empty() => Some(details.clone()),
            _ => None,
        }
    }

    fn internal() -> Self {
        ServiceError::Internal(String::new())
    }
}

/// Carried on error responses so [`error_envelope`] can fill in the request path.
#[derive(Debug, Clone)]
struct ErrorBody(serde_json::Value);

fn envelope(status: StatusCode, message: String, details: Option<String>) -> Response {
    let mut body = json!({
        "message": message,
        "statusCode": status.as_u16(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "path": serde_json::Value::Null,
    });
    if *DEVELOPMENT && let Some(details) = details {
        body["details"] = json!(details);
    }
    let mut response = (status, Json(body.clone())).into_response();
    response.extensions_mut().insert(ErrorBody(body));
    response
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Some(details) = self.details() {
            log::error!("Request failed: {}", details);
        }
        envelope(status, self.to_string(), self.details())
    }
}

/// Rewrites error envelopes produced further down with the path of the request.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<ErrorBody>() {
        Some(ErrorBody(mut body)) => {
            body["path"] = json!(path);
            let status = response.status();
            (status, Json(body)).into_response()
        }
        None => response,
    }
}

pub async fn not_found(uri: Uri) -> ServiceError {
    ServiceError::NotFound(format!("Not found - {}", uri.path()))
}

impl From<AccessDenied> for ServiceError {
    fn from(e: AccessDenied) -> Self {
        match e {
            AccessDenied::AccountInactive => ServiceError::Unauthorized(e.to_string()),
            AccessDenied::InsufficientPermissions => ServiceError::Forbidden(e.to_string()),
        }
    }
}

impl From<AccountError> for ServiceError {
    fn from(e: AccountError) -> Self {
        let message = e.to_string();
        match e {
            AccountError::EmailTaken | AccountError::UsernameTaken => {
                ServiceError::Conflict(message)
            }
            AccountError::InvalidCredentials
            | AccountError::AccountDeactivated
            | AccountError::InvalidToken
            | AccountError::InvalidRefreshToken => ServiceError::Unauthorized(message),
            AccountError::MissingVerificationToken
            | AccountError::InvalidVerificationToken
            | AccountError::AlreadyVerified
            | AccountError::InvalidResetToken
            | AccountError::WrongPassword => ServiceError::BadRequest(message),
            AccountError::UserNotFound => ServiceError::NotFound(message),
            AccountError::EmailDelivery => ServiceError::Internal(message),
            AccountError::Internal => ServiceError::internal(),
        }
    }
}

impl From<UserError> for ServiceError {
    fn from(e: UserError) -> Self {
        let message = e.to_string();
        match e {
            UserError::Access(e) => e.into(),
            UserError::NotFound | UserError::GameProfileNotFound => ServiceError::NotFound(message),
            UserError::EmailTaken | UserError::UsernameTaken | UserError::GamerTagTaken => {
                ServiceError::Conflict(message)
            }
            UserError::UnsupportedGame | UserError::InvalidImage(_) => {
                ServiceError::BadRequest(message)
            }
            UserError::ImageUpload => ServiceError::Internal(message),
            UserError::Internal => ServiceError::internal(),
        }
    }
}

impl From<TournamentError> for ServiceError {
    fn from(e: TournamentError) -> Self {
        let message = e.to_string();
        match e {
            TournamentError::Access(e) => e.into(),
            TournamentError::NotFound | TournamentError::NotParticipant => {
                ServiceError::NotFound(message)
            }
            TournamentError::RegistrationClosed
            | TournamentError::Full
            | TournamentError::InvalidTransition { .. } => ServiceError::BadRequest(message),
            TournamentError::AlreadyJoined => ServiceError::Conflict(message),
            TournamentError::Internal => ServiceError::internal(),
        }
    }
}

impl From<TeamError> for ServiceError {
    fn from(e: TeamError) -> Self {
        let message = e.to_string();
        match e {
            TeamError::Access(e) => e.into(),
            TeamError::NotFound
            | TeamError::UserNotFound
            | TeamError::NotMember
            | TeamError::TargetNotMember => ServiceError::NotFound(message),
            TeamError::AlreadyInTeam => ServiceError::Conflict(message),
            TeamError::Full
            | TeamError::MustTransferLeadership
            | TeamError::CannotKickSelf
            | TeamError::AlreadyLeader => ServiceError::BadRequest(message),
            TeamError::NotLeader(_) => ServiceError::Forbidden(message),
            TeamError::Internal => ServiceError::internal(),
        }
    }
}

impl From<MatchError> for ServiceError {
    fn from(e: MatchError) -> Self {
        let message = e.to_string();
        match e {
            MatchError::Access(e) => e.into(),
            MatchError::NotFound | MatchError::TournamentNotFound | MatchError::UnknownParticipant => {
                ServiceError::NotFound(message)
            }
            MatchError::NotEnoughParticipants
            | MatchError::DuplicateParticipant
            | MatchError::AlreadyFinished(_)
            | MatchError::NotScheduled
            | MatchError::ResultParticipantMismatch
            | MatchError::EmptyResult => ServiceError::BadRequest(message),
            MatchError::NotAParticipant => ServiceError::Forbidden(message),
            MatchError::Internal => ServiceError::internal(),
        }
    }
}

impl From<TransactionError> for ServiceError {
    fn from(e: TransactionError) -> Self {
        let message = e.to_string();
        match e {
            TransactionError::Access(e) => e.into(),
            TransactionError::NotFound => ServiceError::NotFound(message),
            TransactionError::InvalidAmount
            | TransactionError::InsufficientBalance
            | TransactionError::NotPending => ServiceError::BadRequest(message),
            TransactionError::Internal => ServiceError::internal(),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        let message = e.to_string();
        match e {
            OrderError::Access(e) => e.into(),
            OrderError::NotFound => ServiceError::NotFound(message),
            OrderError::NoItems
            | OrderError::InvalidTotal
            | OrderError::InsufficientCoins
            | OrderError::InvalidTransition(_) => ServiceError::BadRequest(message),
            OrderError::Internal => ServiceError::internal(),
        }
    }
}

impl From<RewardError> for ServiceError {
    fn from(e: RewardError) -> Self {
        let message = e.to_string();
        match e {
            RewardError::Access(e) => e.into(),
            RewardError::NotFound | RewardError::Unavailable | RewardError::UserNotFound => {
                ServiceError::NotFound(message)
            }
            RewardError::AlreadyClaimed => ServiceError::Conflict(message),
            RewardError::Unmet(_) => ServiceError::BadRequest(message),
            RewardError::Internal => ServiceError::internal(),
        }
    }
}

impl From<NotificationError> for ServiceError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::NotFound => ServiceError::NotFound(e.to_string()),
            NotificationError::Internal => ServiceError::internal(),
        }
    }
}

impl From<ImageError> for ServiceError {
    fn from(e: ImageError) -> Self {
        let message = e.to_string();
        match e {
            ImageError::Access(e) => e.into(),
            ImageError::Invalid(_)
            | ImageError::NoFile
            | ImageError::TooManyFiles
            | ImageError::MissingPublicId => ServiceError::BadRequest(message),
            ImageError::NotTeamLeader | ImageError::NotMatchParticipant => {
                ServiceError::Forbidden(message)
            }
            ImageError::NotFound(_) | ImageError::ImageNotFound => ServiceError::NotFound(message),
            ImageError::UploadFailed(_) | ImageError::DeleteFailed => {
                ServiceError::Internal(message)
            }
            ImageError::Internal => ServiceError::internal(),
        }
    }
}

impl From<EmailError> for ServiceError {
    fn from(e: EmailError) -> Self {
        let message = e.to_string();
        match e {
            EmailError::Access(e) => e.into(),
            EmailError::MissingRecipient | EmailError::MissingInvitationFields => {
                ServiceError::BadRequest(message)
            }
            EmailError::SendFailed(_) => ServiceError::Internal(message),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(e: JsonRejection) -> Self {
        ServiceError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(e: PathRejection) -> Self {
        ServiceError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(e: QueryRejection) -> Self {
        ServiceError::BadRequest(e.body_text())
    }
}

impl From<MultipartRejection> for ServiceError {
    fn from(e: MultipartRejection) -> Self {
        ServiceError::BadRequest(e.body_text())
    }
}

impl From<MultipartError> for ServiceError {
    fn from(e: MultipartError) -> Self {
        ServiceError::BadRequest(e.body_text())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServiceError::BadRequest(format!("Validation failed: {}", e))
    }
}

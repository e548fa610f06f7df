//! HTTP API over the engine.
//!
//! Callers identify themselves with an `x-user-id` header carrying their user
//! UUID. Moderator operations live under `/moderation` and take no caller.

mod handlers;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use deedquest_core::{Engine, ErrorKind, MediaUpload};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub const USER_HEADER: &str = "x-user-id";

pub fn create_router(engine: Engine) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Users
        .route("/users", post(handlers::register_user))
        .route("/users/me", get(handlers::current_user))
        .route("/users/me/progress", get(handlers::level_progress))
        .route("/users/me/level-up", post(handlers::level_up))
        .route("/users/me/pending", get(handlers::my_pending))
        // Activities
        .route("/activities", post(handlers::create_pending_activity))
        .route("/activities/{id}", get(handlers::get_activity))
        .route("/activities/{id}/reviews", post(handlers::review_activity))
        .route("/activities/{id}/puzzle-answers", post(handlers::answer_puzzle))
        .route(
            "/activities/{id}/challenge-answers",
            get(handlers::list_challenge_answers).post(handlers::answer_to_challenge),
        )
        .route(
            "/challenge-answers/{id}/confirm",
            post(handlers::confirm_challenge_answer),
        )
        .route(
            "/activities/{id}/attendances",
            get(handlers::list_attendances).post(handlers::attend_happening),
        )
        .route(
            "/activities/{id}/attendances/confirm",
            post(handlers::confirm_attendance),
        )
        .route("/activities/{id}/completion", post(handlers::complete_happening))
        // Moderation
        .route("/moderation/pending", get(handlers::list_pending))
        .route(
            "/moderation/pending/{id}",
            post(handlers::resolve_pending_activity),
        )
        .route(
            "/moderation/challenge-answers/{id}/approve",
            post(handlers::approve_challenge_answer),
        )
        .route(
            "/moderation/happenings/{id}/completion",
            post(handlers::approve_happening_completion),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(engine)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or malformed x-user-id header")]
    MissingUser,

    #[error("invalid media payload: {0}")]
    BadMedia(#[from] base64::DecodeError),

    #[error(transparent)]
    Engine(#[from] deedquest_core::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingUser => StatusCode::UNAUTHORIZED,
            Self::BadMedia(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = json!({
            "error": self.to_string(),
            "retryable": self.retryable(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The calling user, taken from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(CurrentUser)
            .ok_or(ApiError::MissingUser)
    }
}

/// A file embedded in a JSON body as base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub data: String,
}

impl MediaPayload {
    pub fn encode(file_name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: STANDARD.encode(bytes),
        }
    }
}

impl TryFrom<MediaPayload> for MediaUpload {
    type Error = ApiError;

    fn try_from(payload: MediaPayload) -> Result<Self, Self::Error> {
        Ok(MediaUpload {
            bytes: STANDARD.decode(payload.data.as_bytes())?,
            file_name: payload.file_name,
            content_type: payload.content_type,
        })
    }
}

pub(crate) fn decode_media(files: Vec<MediaPayload>) -> ApiResult<Vec<MediaUpload>> {
    files.into_iter().map(MediaUpload::try_from).collect()
}

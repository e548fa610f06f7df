//! Request handlers. Each one unpacks the request and calls a single engine
//! operation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use deedquest_core::models::{
    ActivityType, ActivityWithMedia, Attendance, ChallengeAnswer,
    ChallengeAnswerWithMedia, ChallengeResolution, CreatePendingActivityInput,
    HappeningSettlement, LevelProgress, Media, PendingActivity, PuzzleAnswer, RegisterUserInput,
    Resolution, ReviewOutcome, ReviewType, User, UserProfile,
};
use deedquest_core::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{decode_media, ApiResult, CurrentUser, MediaPayload};

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

// === Users ===

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Identity-provider id. A fresh one is generated when absent.
    pub id: Option<Uuid>,
    pub email: String,
}

/// POST /users
pub async fn register_user(
    State(engine): State<Engine>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let input = RegisterUserInput {
        id: req.id.unwrap_or_else(Uuid::new_v4),
        email: req.email,
    };
    let user = engine.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/me
pub async fn current_user(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(engine.get_user(user_id)?))
}

/// GET /users/me/progress
pub async fn level_progress(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<LevelProgress>> {
    Ok(Json(engine.level_progress(user_id)?))
}

#[derive(Debug, Deserialize)]
pub struct LevelUpRequest {
    pub activity_type: ActivityType,
}

/// POST /users/me/level-up
pub async fn level_up(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<LevelUpRequest>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(engine.level_up(user_id, req.activity_type).await?))
}

/// GET /users/me/pending
pub async fn my_pending(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<PendingActivity>>> {
    Ok(Json(engine.list_user_pending(user_id)?))
}

// === Activities ===

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    #[serde(flatten)]
    pub input: CreatePendingActivityInput,
    #[serde(default)]
    pub files: Vec<MediaPayload>,
}

/// POST /activities
pub async fn create_pending_activity(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateActivityRequest>,
) -> ApiResult<(StatusCode, Json<PendingActivity>)> {
    let files = decode_media(req.files)?;
    let pending = engine
        .create_pending_activity(user_id, req.input, files)
        .await?;
    Ok((StatusCode::CREATED, Json(pending)))
}

/// GET /activities/{id}
pub async fn get_activity(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ActivityWithMedia>> {
    Ok(Json(engine.get_activity(id)?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub review_type: ReviewType,
}

/// POST /activities/{id}/reviews
pub async fn review_activity(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<ReviewOutcome>> {
    Ok(Json(
        engine.review_activity(id, user_id, req.review_type).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct PuzzleAnswerRequest {
    pub answer: String,
}

/// POST /activities/{id}/puzzle-answers
pub async fn answer_puzzle(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PuzzleAnswerRequest>,
) -> ApiResult<(StatusCode, Json<PuzzleAnswer>)> {
    let solved = engine.answer_puzzle(id, user_id, &req.answer).await?;
    Ok((StatusCode::CREATED, Json(solved)))
}

// === Challenges ===

#[derive(Debug, Deserialize)]
pub struct ChallengeAnswerRequest {
    pub description: String,
    #[serde(default)]
    pub files: Vec<MediaPayload>,
}

/// GET /activities/{id}/challenge-answers
pub async fn list_challenge_answers(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChallengeAnswerWithMedia>>> {
    Ok(Json(engine.list_challenge_answers(id)?))
}

/// POST /activities/{id}/challenge-answers
pub async fn answer_to_challenge(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChallengeAnswerRequest>,
) -> ApiResult<Json<ChallengeAnswerWithMedia>> {
    let files = decode_media(req.files)?;
    Ok(Json(
        engine
            .answer_to_challenge(id, user_id, &req.description, files)
            .await?,
    ))
}

/// POST /challenge-answers/{id}/confirm
pub async fn confirm_challenge_answer(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(answer_id): Path<Uuid>,
) -> ApiResult<Json<ChallengeAnswer>> {
    Ok(Json(
        engine.confirm_challenge_answer(answer_id, user_id).await?,
    ))
}

// === Happenings ===

#[derive(Debug, Deserialize)]
pub struct AttendRequest {
    pub attend: bool,
}

#[derive(Debug, Serialize)]
pub struct AttendResponse {
    pub attending: bool,
    pub attendance: Option<Attendance>,
}

/// GET /activities/{id}/attendances
pub async fn list_attendances(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Attendance>>> {
    Ok(Json(engine.list_attendances(id)?))
}

/// POST /activities/{id}/attendances
pub async fn attend_happening(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AttendRequest>,
) -> ApiResult<Json<AttendResponse>> {
    let attendance = engine.attend_happening(id, user_id, req.attend).await?;
    Ok(Json(AttendResponse {
        attending: attendance.is_some(),
        attendance,
    }))
}

/// POST /activities/{id}/attendances/confirm
pub async fn confirm_attendance(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Attendance>> {
    Ok(Json(engine.confirm_attendance(id, user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub files: Vec<MediaPayload>,
}

/// POST /activities/{id}/completion
pub async fn complete_happening(
    State(engine): State<Engine>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CompletionRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Media>>)> {
    let files = decode_media(req.files)?;
    let staged = engine.complete_happening(id, user_id, files).await?;
    Ok((StatusCode::ACCEPTED, Json(staged)))
}

// === Moderation ===

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub approve: bool,
}

/// GET /moderation/pending
pub async fn list_pending(State(engine): State<Engine>) -> ApiResult<Json<Vec<PendingActivity>>> {
    Ok(Json(engine.list_pending_activities()?))
}

/// POST /moderation/pending/{id}
pub async fn resolve_pending_activity(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<Resolution>> {
    Ok(Json(engine.resolve_pending_activity(id, req.approve).await?))
}

/// POST /moderation/challenge-answers/{id}/approve
pub async fn approve_challenge_answer(
    State(engine): State<Engine>,
    Path(answer_id): Path<Uuid>,
) -> ApiResult<Json<ChallengeResolution>> {
    Ok(Json(engine.approve_challenge_answer(answer_id).await?))
}

/// POST /moderation/happenings/{id}/completion
pub async fn approve_happening_completion(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<HappeningSettlement>> {
    Ok(Json(
        engine.approve_happening_completion(id, req.approve).await?,
    ))
}

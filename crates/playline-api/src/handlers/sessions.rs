//! Session and event-submission handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use playline_models::{InteractionEvent, SessionToken, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::extract::{MaybeSessionIdentity, SessionIdentity};
use crate::metrics;
use crate::state::AppState;

/// Response for user-session issuance.
#[derive(Serialize)]
pub struct UserSessionResponse {
    #[serde(rename = "userSession")]
    pub user_session: String,
}

/// Issue (or echo back) an anonymous user-session identity.
///
/// Clients persist the returned id and send it as `X-User-Session` on every
/// subsequent call; repeating the call with that header is idempotent.
pub async fn create_user_session(
    State(state): State<AppState>,
    MaybeSessionIdentity(existing): MaybeSessionIdentity,
) -> ApiResult<Json<UserSessionResponse>> {
    let id = state.ingest.ensure_user_session(existing).await?;
    Ok(Json(UserSessionResponse {
        user_session: id.to_string(),
    }))
}

/// Request body for opening an interaction session.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[serde(rename = "videoId")]
    #[validate(length(min = 1, max = 128))]
    pub video_id: String,
}

/// Response carrying the freshly issued session token.
#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub token: String,
}

/// Open an interaction session bound to a video and the calling user.
pub async fn create_session(
    State(state): State<AppState>,
    SessionIdentity(user_session): SessionIdentity,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<Json<CreateSessionResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let token = state
        .ingest
        .open_session(VideoId::from_string(request.video_id), user_session)
        .await?;
    metrics::record_session_opened();

    Ok(Json(CreateSessionResponse {
        token: token.to_string(),
    }))
}

/// Request body for event submission: raw wire tuples.
#[derive(Debug, Deserialize)]
pub struct SubmitEventsRequest {
    pub interactions: Vec<InteractionEvent>,
}

/// Plain acknowledgement.
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: &'static str,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: "ok" }
    }
}

/// Append submitted events to a session.
///
/// Fails with 404 for an unknown token and 403 for a token owned by a
/// different user session.
pub async fn submit_events(
    State(state): State<AppState>,
    SessionIdentity(user_session): SessionIdentity,
    Path(token): Path<String>,
    Json(request): Json<SubmitEventsRequest>,
) -> ApiResult<Json<OkResponse>> {
    let token = SessionToken::from_string(token);
    state
        .ingest
        .record_events(&token, &user_session, &request.interactions)
        .await?;
    metrics::record_events_recorded(request.interactions.len() as u64);

    Ok(Json(OkResponse::ok()))
}

//! Admin handlers: MCA upload, session import/export, key check, reset.
//!
//! Every admin request except the key check is authenticated by an
//! HMAC-SHA256 signature of the raw request body, passed in the `s` query
//! parameter. Bodies are taken as raw bytes so the signature covers exactly
//! what was sent, then parsed.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use playline_firestore::FirestoreError;
use playline_models::{InteractionSession, McaAnnotation, McaKind, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::sessions::OkResponse;
use crate::security::verify_signature;
use crate::state::AppState;

/// Signature query parameter.
#[derive(Debug, Deserialize)]
pub struct SignatureQuery {
    pub s: Option<String>,
}

fn verify_admin(state: &AppState, query: &SignatureQuery, body: &[u8]) -> ApiResult<()> {
    let signature = query
        .s
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("missing request signature"))?;
    if !verify_signature(&state.secret_key, body, signature) {
        return Err(ApiError::unauthorized("bad request signature"));
    }
    Ok(())
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid body: {e}")))
}

// ============================================================================
// MCA Upload
// ============================================================================

/// MCA upload/delete request body.
#[derive(Debug, Deserialize, Validate)]
pub struct McaUploadRequest {
    #[serde(rename = "videoId")]
    #[validate(length(min = 1, max = 128))]
    pub video_id: String,

    #[serde(rename = "mcaName")]
    #[validate(length(min = 1, max = 64))]
    pub mca_name: String,

    #[serde(rename = "mcaType")]
    pub mca_type: Option<McaKind>,

    #[serde(rename = "mcaData")]
    pub mca_data: Option<Vec<f64>>,

    #[serde(rename = "mcaWeight", default = "default_weight")]
    pub mca_weight: f64,

    #[serde(default)]
    pub delete: bool,
}

fn default_weight() -> f64 {
    1.0
}

/// Upsert or unset one named annotation on a video.
pub async fn post_mca(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
    body: Bytes,
) -> ApiResult<Json<OkResponse>> {
    verify_admin(&state, &query, &body)?;

    let request: McaUploadRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let video_id = VideoId::from_string(request.video_id);
    if request.delete {
        state
            .annotations
            .unset(&video_id, &request.mca_name)
            .await?;
    } else {
        let kind = request
            .mca_type
            .ok_or_else(|| ApiError::bad_request("mcaType is required"))?;
        let data = request
            .mca_data
            .ok_or_else(|| ApiError::bad_request("mcaData is required"))?;
        let annotation = McaAnnotation::new(kind, data, request.mca_weight);
        state
            .annotations
            .upsert(&video_id, &request.mca_name, &annotation)
            .await?;
    }

    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Session Import/Export
// ============================================================================

/// Admin command over a video's interaction sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminCommand {
    Download,
    Upload,
    Delete,
}

/// Session import/export request body.
#[derive(Debug, Deserialize)]
pub struct AdminInteractionsRequest {
    #[serde(rename = "videoId")]
    pub video_id: String,

    pub cmd: AdminCommand,

    /// Session documents to import (upload only).
    pub data: Option<Vec<InteractionSession>>,
}

/// Sessions skipped during an upload, by reason.
#[derive(Debug, Default, Serialize)]
pub struct SkippedSessions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,

    #[serde(rename = "wrong_videoid", skip_serializing_if = "Vec::is_empty")]
    pub wrong_video_id: Vec<String>,
}

impl SkippedSessions {
    fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.wrong_video_id.is_empty()
    }
}

/// Upload acknowledgement with any skipped sessions.
#[derive(Serialize)]
pub struct UploadResponse {
    pub ok: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkippedSessions>,
}

/// Download, upload, or bulk-delete a video's interaction sessions.
pub async fn admin_interactions(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    verify_admin(&state, &query, &body)?;

    let request: AdminInteractionsRequest = parse_body(&body)?;
    let video_id = VideoId::from_string(request.video_id);

    match request.cmd {
        AdminCommand::Download => {
            let sessions = state.sessions.find_by_video(&video_id).await?;
            Ok(Json(sessions).into_response())
        }

        AdminCommand::Upload => {
            let sessions = request
                .data
                .ok_or_else(|| ApiError::bad_request("data is required for upload"))?;

            let mut skipped = SkippedSessions::default();
            for session in &sessions {
                if session.video_id != video_id {
                    skipped.wrong_video_id.push(session.id.to_string());
                    continue;
                }
                match state.sessions.import(session).await {
                    Ok(()) => {}
                    Err(FirestoreError::AlreadyExists(_)) => {
                        skipped.duplicates.push(session.id.to_string());
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            info!(
                video_id = %video_id,
                imported = sessions.len() - skipped.duplicates.len() - skipped.wrong_video_id.len(),
                "Imported interaction sessions"
            );

            Ok(Json(UploadResponse {
                ok: "ok",
                skipped: (!skipped.is_empty()).then_some(skipped),
            })
            .into_response())
        }

        AdminCommand::Delete => {
            state.sessions.delete_by_video(&video_id).await?;
            Ok(Json(OkResponse::ok()).into_response())
        }
    }
}

// ============================================================================
// Key Check and Reset
// ============================================================================

/// Key check request body.
#[derive(Debug, Deserialize)]
pub struct TestKeyRequest {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub sig: String,
}

/// Key check response: `ok` is `"ok"` when the signature matched.
#[derive(Serialize)]
pub struct TestKeyResponse {
    pub ok: &'static str,
}

/// Verify a caller-computed signature against the server key.
///
/// Lets an administrator confirm a key rollout without mutating anything.
pub async fn test_key(
    State(state): State<AppState>,
    Json(request): Json<TestKeyRequest>,
) -> Json<TestKeyResponse> {
    let ok = verify_signature(&state.secret_key, request.msg.as_bytes(), &request.sig);
    Json(TestKeyResponse {
        ok: if ok { "ok" } else { "no" },
    })
}

/// Reset acknowledgement with deletion counts.
#[derive(Serialize)]
pub struct ResetResponse {
    pub ok: &'static str,
    pub deleted_sessions: u32,
    pub deleted_user_sessions: u32,
}

/// Wholesale data reset: every interaction session and user session.
pub async fn reset_all(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
    body: Bytes,
) -> ApiResult<Json<ResetResponse>> {
    verify_admin(&state, &query, &body)?;

    let deleted_sessions = state.sessions.delete_all().await?;
    let deleted_user_sessions = state.users.delete_all().await?;
    info!(deleted_sessions, deleted_user_sessions, "Wholesale data reset");

    Ok(Json(ResetResponse {
        ok: "ok",
        deleted_sessions,
        deleted_user_sessions,
    }))
}

//! Aggregate read handler.

use axum::extract::{Path, State};
use axum::Json;

use playline_models::{AggregateSummary, VideoId};

use crate::error::ApiResult;
use crate::extract::MaybeSessionIdentity;
use crate::metrics;
use crate::state::AppState;

/// Serve the cross-session aggregate for a video.
///
/// Anonymous callers get the full aggregate with an empty `myLikes`; an
/// unknown video yields an empty summary rather than an error.
pub async fn get_aggregate(
    State(state): State<AppState>,
    MaybeSessionIdentity(user_session): MaybeSessionIdentity,
    Path(video_id): Path<String>,
) -> ApiResult<Json<AggregateSummary>> {
    let video_id = VideoId::from_string(video_id);
    let summary = state
        .aggregate
        .aggregate(&video_id, user_session.as_ref())
        .await?;
    metrics::record_aggregate_served();

    Ok(Json(summary))
}

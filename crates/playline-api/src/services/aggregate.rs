//! Cross-session aggregation over the store.
//!
//! Completes the pure fold from `playline-core` with the requesting user's
//! like ledger and the video's MCA annotations. Nothing is cached: every
//! request reads fresh and recomputes, which is fine for a read endpoint
//! whose per-video event volume is modest.

use tracing::debug;

use playline_core::{aggregate_sessions, AggregateOptions};
use playline_firestore::{AnnotationRepository, InteractionSessionRepository, UserSessionRepository};
use playline_models::{AggregateSummary, UserSessionId, VideoId};

use crate::error::ApiResult;

/// Read-side service producing per-video aggregate summaries.
#[derive(Clone)]
pub struct AggregateService {
    sessions: InteractionSessionRepository,
    users: UserSessionRepository,
    annotations: AnnotationRepository,
    options: AggregateOptions,
}

impl AggregateService {
    pub fn new(
        sessions: InteractionSessionRepository,
        users: UserSessionRepository,
        annotations: AnnotationRepository,
        options: AggregateOptions,
    ) -> Self {
        Self {
            sessions,
            users,
            annotations,
            options,
        }
    }

    /// Aggregate every recorded session for `video_id`.
    ///
    /// An unknown video yields an empty summary, and an absent or unknown
    /// user session just means `my_likes` is empty; neither is an error.
    pub async fn aggregate(
        &self,
        video_id: &VideoId,
        user_session: Option<&UserSessionId>,
    ) -> ApiResult<AggregateSummary> {
        let sessions = self.sessions.find_by_video(video_id).await?;
        let rollup =
            aggregate_sessions(sessions.iter().map(|s| s.events.as_slice()), &self.options);

        let my_likes = match user_session {
            Some(id) => self
                .users
                .get(id)
                .await?
                .map(|user| user.likes_for(video_id).to_vec())
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let mca = self.annotations.fetch(video_id).await?;

        debug!(
            video_id = %video_id,
            num_sessions = rollup.num_sessions,
            annotations = mca.len(),
            "Computed aggregate"
        );

        Ok(AggregateSummary {
            num_sessions: rollup.num_sessions,
            playbacks: rollup.playbacks,
            liked_points: rollup.liked_points,
            tagged_points: rollup.tagged_points,
            my_likes,
            mca,
        })
    }
}

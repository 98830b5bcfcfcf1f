//! Write-side service: session issuance and event recording.

use tracing::info;

use playline_firestore::{FirestoreError, InteractionSessionRepository, UserSessionRepository};
use playline_models::{
    EventKind, InteractionEvent, InteractionSession, SessionToken, TaggedPoint, UserSession,
    UserSessionId, VideoId,
};

use crate::error::{ApiError, ApiResult};

/// Service handling session creation and event submission.
#[derive(Clone)]
pub struct IngestService {
    sessions: InteractionSessionRepository,
    users: UserSessionRepository,
}

impl IngestService {
    pub fn new(sessions: InteractionSessionRepository, users: UserSessionRepository) -> Self {
        Self { sessions, users }
    }

    /// Resolve the caller's user session, minting a fresh one when absent.
    ///
    /// An existing identity is returned as-is; creation races on a fresh id
    /// are harmless since ids are random and the new ledger is empty.
    pub async fn ensure_user_session(
        &self,
        existing: Option<UserSessionId>,
    ) -> ApiResult<UserSessionId> {
        if let Some(id) = existing {
            return Ok(id);
        }

        let user = UserSession::new(UserSessionId::new());
        match self.users.create(&user).await {
            Ok(()) | Err(FirestoreError::AlreadyExists(_)) => {
                info!(user_session = %user.id, "Issued new user session");
                Ok(user.id)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open an interaction session for a video on behalf of a user session.
    pub async fn open_session(
        &self,
        video_id: VideoId,
        user_session: UserSessionId,
    ) -> ApiResult<SessionToken> {
        let session = InteractionSession::new(video_id, user_session);
        self.sessions.create(&session).await?;
        Ok(session.id)
    }

    /// Append raw events to a session and mirror likes/tags into the owning
    /// user session's durable per-video ledgers.
    ///
    /// An unknown token and a token owned by someone else are distinct
    /// failures (not-found vs. forbidden), never silently dropped.
    pub async fn record_events(
        &self,
        token: &SessionToken,
        user_session: &UserSessionId,
        events: &[InteractionEvent],
    ) -> ApiResult<()> {
        let session = self
            .sessions
            .get(token)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("unknown session token: {token}")))?;

        if session.user_session != *user_session {
            return Err(ApiError::forbidden(
                "session token belongs to a different user session",
            ));
        }

        self.sessions.append_events(&session, events).await?;

        let likes: Vec<f64> = events
            .iter()
            .filter(|e| e.kind == EventKind::Like)
            .map(|e| e.media_time)
            .collect();
        let tags: Vec<TaggedPoint> = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Tag(tag) => Some(TaggedPoint::new(e.media_time, tag.clone())),
                _ => None,
            })
            .collect();

        if !likes.is_empty() {
            self.users
                .append_likes(user_session, &session.video_id, &likes)
                .await?;
        }
        if !tags.is_empty() {
            self.users
                .append_tags(user_session, &session.video_id, &tags)
                .await?;
        }

        Ok(())
    }
}

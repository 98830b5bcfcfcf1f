//! Interaction-session and user-session documents.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::TaggedPoint;
use crate::event::InteractionEvent;
use crate::ids::{SessionToken, UserSessionId, VideoId};

/// One client's viewing session against one video.
///
/// Events are append-only in arrival order; sorting into replay order
/// happens at read time and never mutates the stored list. The JSON field
/// names match the historical persisted layout, so admin export/import
/// round-trips old data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InteractionSession {
    /// Opaque session token.
    #[serde(rename = "_id")]
    pub id: SessionToken,

    /// Video the session was recorded against.
    #[serde(rename = "videoId")]
    pub video_id: VideoId,

    /// Owning user session.
    #[serde(rename = "userSession")]
    pub user_session: UserSessionId,

    /// Creation timestamp.
    #[serde(rename = "ts")]
    pub created_at: DateTime<Utc>,

    /// Raw events in arrival order. Duplicates are preserved.
    #[serde(rename = "interactions", default)]
    pub events: Vec<InteractionEvent>,
}

impl InteractionSession {
    /// Open a fresh session with a new random token and no events.
    pub fn new(video_id: VideoId, user_session: UserSessionId) -> Self {
        Self {
            id: SessionToken::new(),
            video_id,
            user_session,
            created_at: Utc::now(),
            events: Vec::new(),
        }
    }
}

/// A browser/client's durable anonymous identity.
///
/// Accumulates per-video like and tag ledgers across all of that client's
/// interaction sessions. The maps are lazily-initialized append targets: a
/// video key appears the first time something is recorded for it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserSession {
    /// Opaque identifier, mirrored client-side.
    #[serde(rename = "_id")]
    pub id: UserSessionId,

    /// Liked media-time points per video id.
    #[serde(default)]
    pub likes: HashMap<String, Vec<f64>>,

    /// Tagged points per video id.
    #[serde(default)]
    pub tags: HashMap<String, Vec<TaggedPoint>>,

    /// Creation timestamp.
    #[serde(rename = "ts")]
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    /// A fresh, empty ledger for the given identity.
    pub fn new(id: UserSessionId) -> Self {
        Self {
            id,
            likes: HashMap::new(),
            tags: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// This user's likes for a video; empty if none were ever recorded.
    pub fn likes_for(&self, video_id: &VideoId) -> &[f64] {
        self.likes
            .get(video_id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = InteractionSession::new("vid-1".into(), UserSessionId::new());
        assert!(session.events.is_empty());
        assert_eq!(session.video_id.as_str(), "vid-1");
    }

    #[test]
    fn test_session_serializes_with_legacy_keys() {
        let session = InteractionSession::new("vid-1".into(), "user-1".into());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["_id"], session.id.as_str());
        assert_eq!(json["videoId"], "vid-1");
        assert_eq!(json["userSession"], "user-1");
        assert!(json["interactions"].as_array().unwrap().is_empty());
        assert!(json.get("ts").is_some());
    }

    #[test]
    fn test_likes_for_missing_video_is_empty() {
        let user = UserSession::new(UserSessionId::new());
        assert!(user.likes_for(&"nope".into()).is_empty());
    }
}

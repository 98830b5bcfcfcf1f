//! Typed repository for user-session documents.
//!
//! Persisted layout (`userSessions/{id}`):
//! - `likes`: map of videoId -> double array
//! - `tags`: map of videoId -> array of `[mediaTime, tag]` tuples
//! - `ts`: timestamp
//!
//! The `likes`/`tags` maps are lazily-initialized append targets: patching
//! a nested path creates the document and the video entry on first use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use playline_models::{TaggedPoint, UserSession, UserSessionId, VideoId};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::sessions::delete_collection;
use crate::types::{field_path, Document, FromFirestoreValue, ToFirestoreValue, Value};

const COLLECTION: &str = "userSessions";

/// Repository for durable anonymous user sessions.
#[derive(Clone)]
pub struct UserSessionRepository {
    client: FirestoreClient,
}

impl UserSessionRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Persist a fresh, empty ledger.
    pub async fn create(&self, user: &UserSession) -> FirestoreResult<()> {
        self.client
            .create_document(COLLECTION, user.id.as_str(), user_to_fields(user))
            .await?;
        info!(user_session = %user.id, "Created user session");
        Ok(())
    }

    /// Fetch a user session; unknown ids are `None`.
    pub async fn get(&self, id: &UserSessionId) -> FirestoreResult<Option<UserSession>> {
        let doc = self.client.get_document(COLLECTION, id.as_str()).await?;
        Ok(doc.map(|d| document_to_user(&d, id)))
    }

    /// Append liked points to the user's per-video ledger.
    pub async fn append_likes(
        &self,
        id: &UserSessionId,
        video_id: &VideoId,
        points: &[f64],
    ) -> FirestoreResult<()> {
        let existing = self
            .get(id)
            .await?
            .and_then(|u| u.likes.get(video_id.as_str()).cloned())
            .unwrap_or_default();

        let mut combined = existing;
        combined.extend_from_slice(points);

        let mut per_video = HashMap::new();
        per_video.insert(video_id.as_str().to_string(), combined.to_firestore_value());
        let mut fields = HashMap::new();
        fields.insert("likes".to_string(), Value::map(per_video));

        self.client
            .patch_document(
                COLLECTION,
                id.as_str(),
                fields,
                Some(vec![field_path(&["likes", video_id.as_str()])]),
            )
            .await?;
        Ok(())
    }

    /// Append tagged points to the user's per-video ledger.
    pub async fn append_tags(
        &self,
        id: &UserSessionId,
        video_id: &VideoId,
        points: &[TaggedPoint],
    ) -> FirestoreResult<()> {
        let mut combined = self
            .get(id)
            .await?
            .and_then(|u| u.tags.get(video_id.as_str()).cloned())
            .unwrap_or_default();
        combined.extend_from_slice(points);

        let mut per_video = HashMap::new();
        per_video.insert(
            video_id.as_str().to_string(),
            Value::array(combined.iter().map(tagged_point_to_value).collect()),
        );
        let mut fields = HashMap::new();
        fields.insert("tags".to_string(), Value::map(per_video));

        self.client
            .patch_document(
                COLLECTION,
                id.as_str(),
                fields,
                Some(vec![field_path(&["tags", video_id.as_str()])]),
            )
            .await?;
        Ok(())
    }

    /// Delete every user session (wholesale reset).
    pub async fn delete_all(&self) -> FirestoreResult<u32> {
        delete_collection(&self.client, COLLECTION).await
    }
}

// ============================================================================
// Document Mapping
// ============================================================================

fn user_to_fields(user: &UserSession) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("likes".to_string(), user.likes.to_firestore_value());
    fields.insert(
        "tags".to_string(),
        Value::map(
            user.tags
                .iter()
                .map(|(video, points)| {
                    (
                        video.clone(),
                        Value::array(points.iter().map(tagged_point_to_value).collect()),
                    )
                })
                .collect(),
        ),
    );
    fields.insert("ts".to_string(), user.created_at.to_firestore_value());
    fields
}

fn document_to_user(doc: &Document, id: &UserSessionId) -> UserSession {
    let likes = doc
        .field("likes")
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(video, v)| Some((video.clone(), Vec::from_firestore_value(v)?)))
                .collect()
        })
        .unwrap_or_default();

    let tags = doc
        .field("tags")
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(video, v)| {
                    let points = v
                        .as_array()?
                        .iter()
                        .filter_map(tagged_point_from_value)
                        .collect();
                    Some((video.clone(), points))
                })
                .collect()
        })
        .unwrap_or_default();

    let created_at = doc
        .field("ts")
        .and_then(DateTime::<Utc>::from_firestore_value)
        .unwrap_or_default();

    UserSession {
        id: id.clone(),
        likes,
        tags,
        created_at,
    }
}

fn tagged_point_to_value(point: &TaggedPoint) -> Value {
    Value::array(vec![
        Value::DoubleValue(point.media_time),
        Value::StringValue(point.tag.clone()),
    ])
}

fn tagged_point_from_value(value: &Value) -> Option<TaggedPoint> {
    let parts = value.as_array()?;
    if parts.len() != 2 {
        return None;
    }
    Some(TaggedPoint {
        media_time: f64::from_firestore_value(&parts[0])?,
        tag: String::from_firestore_value(&parts[1])?,
    })
}

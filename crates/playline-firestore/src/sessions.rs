//! Typed repository for interaction-session documents.
//!
//! Persisted layout (`interactionSessions/{token}`):
//! - `videoId`: string
//! - `userSession`: string
//! - `ts`: timestamp
//! - `interactions`: array of `[timestamp, typeString, mediaTime,
//!   lastMediaTime]` tuples in arrival order

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use playline_models::{EventKind, InteractionEvent, InteractionSession, SessionToken, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

const COLLECTION: &str = "interactionSessions";

/// Page size for wholesale deletion sweeps.
const DELETE_PAGE_SIZE: u32 = 300;

/// Repository for interaction sessions.
#[derive(Clone)]
pub struct InteractionSessionRepository {
    client: FirestoreClient,
}

impl InteractionSessionRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Persist a freshly opened session.
    pub async fn create(&self, session: &InteractionSession) -> FirestoreResult<()> {
        self.client
            .create_document(COLLECTION, session.id.as_str(), session_to_fields(session))
            .await?;
        info!(token = %session.id, video_id = %session.video_id, "Created interaction session");
        Ok(())
    }

    /// Fetch one session by token.
    pub async fn get(&self, token: &SessionToken) -> FirestoreResult<Option<InteractionSession>> {
        let doc = self.client.get_document(COLLECTION, token.as_str()).await?;
        match doc {
            Some(d) => Ok(Some(document_to_session(&d, token)?)),
            None => Ok(None),
        }
    }

    /// Append raw events to a previously fetched session.
    ///
    /// The write replaces the `interactions` field with the session's known
    /// events plus the new ones. Duplicate tuples are preserved; overlapping
    /// appends from the same client are not coordinated beyond the store's
    /// per-call atomicity.
    pub async fn append_events(
        &self,
        session: &InteractionSession,
        new_events: &[InteractionEvent],
    ) -> FirestoreResult<()> {
        let combined: Vec<Value> = session
            .events
            .iter()
            .chain(new_events)
            .map(event_to_value)
            .collect();

        let mut fields = HashMap::new();
        fields.insert("interactions".to_string(), Value::array(combined));

        self.client
            .patch_document(
                COLLECTION,
                session.id.as_str(),
                fields,
                Some(vec!["interactions".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Every session recorded against a video, in store order.
    pub async fn find_by_video(
        &self,
        video_id: &VideoId,
    ) -> FirestoreResult<Vec<InteractionSession>> {
        let query = StructuredQuery::collection_equals(
            COLLECTION,
            "videoId",
            video_id.as_str().to_firestore_value(),
        );
        let docs = self.client.run_query(query).await?;

        let mut sessions = Vec::with_capacity(docs.len());
        for doc in docs {
            let Some(token) = doc.doc_id().map(SessionToken::from_string) else {
                continue;
            };
            match document_to_session(&doc, &token) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    warn!(token = %token, error = %e, "Skipping unparseable interaction session");
                }
            }
        }
        Ok(sessions)
    }

    /// Import a full session document (admin upload).
    ///
    /// A token collision surfaces as `AlreadyExists` so the caller can
    /// report the duplicate instead of overwriting recorded data.
    pub async fn import(&self, session: &InteractionSession) -> FirestoreResult<()> {
        self.client
            .create_document(COLLECTION, session.id.as_str(), session_to_fields(session))
            .await?;
        Ok(())
    }

    /// Delete every session recorded against a video. Returns the count.
    pub async fn delete_by_video(&self, video_id: &VideoId) -> FirestoreResult<u32> {
        let query = StructuredQuery::collection_equals(
            COLLECTION,
            "videoId",
            video_id.as_str().to_firestore_value(),
        );
        let docs = self.client.run_query(query).await?;

        let mut deleted = 0;
        for doc in docs {
            if let Some(id) = doc.doc_id() {
                self.client.delete_document(COLLECTION, id).await?;
                deleted += 1;
            }
        }
        info!(video_id = %video_id, deleted, "Deleted interaction sessions for video");
        Ok(deleted)
    }

    /// Delete every session in the store (wholesale reset).
    pub async fn delete_all(&self) -> FirestoreResult<u32> {
        delete_collection(&self.client, COLLECTION).await
    }
}

/// Sweep-delete a whole collection, page by page.
pub(crate) async fn delete_collection(
    client: &FirestoreClient,
    collection: &str,
) -> FirestoreResult<u32> {
    let mut deleted = 0;
    loop {
        let page = client
            .list_documents(collection, Some(DELETE_PAGE_SIZE), None)
            .await?;
        let docs = page.documents.unwrap_or_default();
        if docs.is_empty() {
            return Ok(deleted);
        }
        for doc in docs {
            if let Some(id) = doc.doc_id() {
                client.delete_document(collection, id).await?;
                deleted += 1;
            }
        }
    }
}

// ============================================================================
// Document Mapping
// ============================================================================

fn session_to_fields(session: &InteractionSession) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "videoId".to_string(),
        session.video_id.as_str().to_firestore_value(),
    );
    fields.insert(
        "userSession".to_string(),
        session.user_session.as_str().to_firestore_value(),
    );
    fields.insert("ts".to_string(), session.created_at.to_firestore_value());
    fields.insert(
        "interactions".to_string(),
        Value::array(session.events.iter().map(event_to_value).collect()),
    );
    fields
}

fn document_to_session(
    doc: &Document,
    token: &SessionToken,
) -> FirestoreResult<InteractionSession> {
    let video_id = doc
        .field("videoId")
        .and_then(String::from_firestore_value)
        .ok_or_else(|| {
            FirestoreError::invalid_response(format!("session {} has no videoId", token))
        })?;
    let user_session = doc
        .field("userSession")
        .and_then(String::from_firestore_value)
        .ok_or_else(|| {
            FirestoreError::invalid_response(format!("session {} has no userSession", token))
        })?;
    let created_at = doc
        .field("ts")
        .and_then(DateTime::<Utc>::from_firestore_value)
        .unwrap_or_default();

    let events = doc
        .field("interactions")
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| {
            let event = event_from_value(v);
            if event.is_none() {
                warn!(token = %token, "Dropping malformed event tuple");
            }
            event
        })
        .collect();

    Ok(InteractionSession {
        id: token.clone(),
        video_id: VideoId::from_string(video_id),
        user_session: user_session.into(),
        created_at,
        events,
    })
}

pub(crate) fn event_to_value(event: &InteractionEvent) -> Value {
    Value::array(vec![
        Value::DoubleValue(event.timestamp),
        Value::StringValue(event.kind.wire_name().into_owned()),
        Value::DoubleValue(event.media_time),
        Value::DoubleValue(event.last_media_time),
    ])
}

pub(crate) fn event_from_value(value: &Value) -> Option<InteractionEvent> {
    let parts = value.as_array()?;
    if parts.len() != 4 {
        return None;
    }
    Some(InteractionEvent {
        timestamp: f64::from_firestore_value(&parts[0])?,
        kind: EventKind::parse(&String::from_firestore_value(&parts[1])?),
        media_time: f64::from_firestore_value(&parts[2])?,
        last_media_time: f64::from_firestore_value(&parts[3])?,
    })
}

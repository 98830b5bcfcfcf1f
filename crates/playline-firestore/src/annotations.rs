//! The MCA store accessor: per-video annotation records.
//!
//! Persisted layout (`mca/{videoId}`): one field per annotation, keyed
//! `"mca-" + name`, holding `{type: "curve"|"point", data: double array,
//! weight: double}`. The prefix namespaces annotations so other fields can
//! coexist on the same record; readers get bare names back.

use std::collections::HashMap;

use tracing::{info, warn};

use playline_models::{McaAnnotation, McaKind, VideoId};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::{field_path, Document, FromFirestoreValue, ToFirestoreValue, Value};

const COLLECTION: &str = "mca";

/// Storage key prefix for annotation fields.
pub const ANNOTATION_FIELD_PREFIX: &str = "mca-";

/// Repository for per-video MCA annotations.
#[derive(Clone)]
pub struct AnnotationRepository {
    client: FirestoreClient,
}

impl AnnotationRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// All annotations for a video, keyed by bare name.
    ///
    /// A missing record is an empty mapping, never an error. Fields outside
    /// the annotation namespace are ignored.
    pub async fn fetch(&self, video_id: &VideoId) -> FirestoreResult<HashMap<String, McaAnnotation>> {
        let doc = self
            .client
            .get_document(COLLECTION, video_id.as_str())
            .await?;

        let Some(doc) = doc else {
            return Ok(HashMap::new());
        };
        Ok(document_to_annotations(&doc))
    }

    /// Set one named annotation without disturbing its siblings.
    pub async fn upsert(
        &self,
        video_id: &VideoId,
        name: &str,
        annotation: &McaAnnotation,
    ) -> FirestoreResult<()> {
        let key = storage_key(name);
        let mut fields = HashMap::new();
        fields.insert(key.clone(), annotation_to_value(annotation));

        self.client
            .patch_document(
                COLLECTION,
                video_id.as_str(),
                fields,
                Some(vec![field_path(&[&key])]),
            )
            .await?;
        info!(video_id = %video_id, name, "Stored MCA annotation");
        Ok(())
    }

    /// Remove one named annotation without disturbing its siblings.
    pub async fn unset(&self, video_id: &VideoId, name: &str) -> FirestoreResult<()> {
        let key = storage_key(name);
        // Masked path with no corresponding field clears it.
        self.client
            .patch_document(
                COLLECTION,
                video_id.as_str(),
                HashMap::new(),
                Some(vec![field_path(&[&key])]),
            )
            .await?;
        info!(video_id = %video_id, name, "Removed MCA annotation");
        Ok(())
    }
}

fn storage_key(name: &str) -> String {
    format!("{ANNOTATION_FIELD_PREFIX}{name}")
}

// ============================================================================
// Document Mapping
// ============================================================================

fn document_to_annotations(doc: &Document) -> HashMap<String, McaAnnotation> {
    let Some(fields) = doc.fields.as_ref() else {
        return HashMap::new();
    };

    let mut annotations = HashMap::new();
    for (key, value) in fields {
        let Some(name) = key.strip_prefix(ANNOTATION_FIELD_PREFIX) else {
            continue;
        };
        match annotation_from_value(value) {
            Some(annotation) => {
                annotations.insert(name.to_string(), annotation);
            }
            None => warn!(key, "Skipping malformed MCA annotation field"),
        }
    }
    annotations
}

fn annotation_to_value(annotation: &McaAnnotation) -> Value {
    let mut fields = HashMap::new();
    fields.insert(
        "type".to_string(),
        annotation.kind.as_str().to_firestore_value(),
    );
    fields.insert("data".to_string(), annotation.data.to_firestore_value());
    fields.insert("weight".to_string(), annotation.weight.to_firestore_value());
    Value::map(fields)
}

fn annotation_from_value(value: &Value) -> Option<McaAnnotation> {
    let fields = value.as_map()?;
    let kind: McaKind = String::from_firestore_value(fields.get("type")?)?
        .parse()
        .ok()?;
    let data = Vec::from_firestore_value(fields.get("data")?)?;
    let weight = fields
        .get("weight")
        .and_then(f64::from_firestore_value)
        .unwrap_or(1.0);
    Some(McaAnnotation { kind, data, weight })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> McaAnnotation {
        McaAnnotation::new(McaKind::Curve, vec![0.0, 0.5, 1.0], 2.0)
    }

    #[test]
    fn test_prefix_is_stripped_on_read() {
        let mut fields = HashMap::new();
        fields.insert("mca-curveA".to_string(), annotation_to_value(&curve()));
        let doc = Document::new(fields);

        let annotations = document_to_annotations(&doc);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations["curveA"], curve());
    }

    #[test]
    fn test_non_annotation_fields_are_ignored() {
        let mut fields = HashMap::new();
        fields.insert("mca-a".to_string(), annotation_to_value(&curve()));
        fields.insert("owner".to_string(), Value::StringValue("admin".into()));
        let doc = Document::new(fields);

        let annotations = document_to_annotations(&doc);
        assert_eq!(annotations.len(), 1);
        assert!(annotations.contains_key("a"));
    }

    #[test]
    fn test_annotation_value_round_trip() {
        let annotation = McaAnnotation::new(McaKind::Point, vec![10.0, 20.0], 1.0);
        assert_eq!(
            annotation_from_value(&annotation_to_value(&annotation)),
            Some(annotation)
        );
    }

    #[test]
    fn test_missing_weight_defaults_to_one() {
        let mut fields = HashMap::new();
        fields.insert("type".to_string(), Value::StringValue("point".into()));
        fields.insert("data".to_string(), vec![1.0f64].to_firestore_value());
        let annotation = annotation_from_value(&Value::map(fields)).unwrap();
        assert_eq!(annotation.weight, 1.0);
    }
}

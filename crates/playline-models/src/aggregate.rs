//! Aggregate summary types returned to clients.

use std::collections::HashMap;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::mca::McaAnnotation;

/// One continuous stretch of watched video, in media-time seconds.
///
/// Encoded on the wire as a 2-element array `[start, end]`. `start <= end`
/// is assumed for well-behaved clients but not enforced; reconstruction
/// passes through whatever the event stream implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackInterval {
    pub start: f64,
    pub end: f64,
}

impl PlaybackInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl Serialize for PlaybackInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.end).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlaybackInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Self { start, end })
    }
}

impl JsonSchema for PlaybackInterval {
    fn schema_name() -> String {
        "PlaybackInterval".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <(f64, f64)>::json_schema(gen)
    }
}

/// A tagged moment: media-time point plus the tag label.
///
/// Encoded on the wire as `[mediaTime, tag]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPoint {
    pub media_time: f64,
    pub tag: String,
}

impl TaggedPoint {
    pub fn new(media_time: f64, tag: impl Into<String>) -> Self {
        Self {
            media_time,
            tag: tag.into(),
        }
    }
}

impl Serialize for TaggedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.media_time, &self.tag).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TaggedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (media_time, tag) = <(f64, String)>::deserialize(deserializer)?;
        Ok(Self { media_time, tag })
    }
}

impl JsonSchema for TaggedPoint {
    fn schema_name() -> String {
        "TaggedPoint".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <(f64, String)>::json_schema(gen)
    }
}

/// Cross-session aggregate for one video, as served to clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    /// Number of interaction sessions recorded against the video, counting
    /// sessions that yielded no playback intervals.
    pub num_sessions: u32,

    /// Reconstructed playback intervals, one inner list per contributing
    /// session. Overlaps across sessions are preserved, not merged.
    pub playbacks: Vec<Vec<PlaybackInterval>>,

    /// Liked media-time points flattened across all sessions.
    pub liked_points: Vec<f64>,

    /// Tagged media-time points flattened across all sessions.
    pub tagged_points: Vec<TaggedPoint>,

    /// The requesting user's own accumulated likes for this video.
    pub my_likes: Vec<f64>,

    /// Administrator-supplied annotations, keyed by bare annotation name.
    pub mca: HashMap<String, McaAnnotation>,
}

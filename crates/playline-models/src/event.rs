//! Interaction events and their legacy wire encoding.
//!
//! Clients submit events as 4-element JSON arrays
//! `[timestamp, typeString, mediaTime, lastMediaTime]`. The type string is
//! decoded into [`EventKind`] exactly once at this boundary; the rest of the
//! backend never re-inspects raw strings.

use std::borrow::Cow;
use std::cmp::Ordering;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Wire prefix carrying the tag name as a suffix of the type string.
const TAG_PREFIX: &str = "TAG_";

/// Kind of viewer interaction.
///
/// Unrecognized type strings are preserved as [`EventKind::Unknown`] and
/// round-trip unchanged, so old servers can store events from newer players.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Playback started (or restarted).
    Playing,
    /// Playback paused.
    Paused,
    /// Periodic playback-progress heartbeat.
    Tick,
    /// The viewer liked the current moment.
    Like,
    /// The viewer tagged the current moment with a named label.
    Tag(String),
    /// Unrecognized event type, kept verbatim.
    Unknown(String),
}

impl EventKind {
    /// Decode a wire type string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PLAYING" => EventKind::Playing,
            "PAUSED" => EventKind::Paused,
            "TICK" => EventKind::Tick,
            "LIKE" => EventKind::Like,
            _ => match raw.strip_prefix(TAG_PREFIX) {
                Some(tag) => EventKind::Tag(tag.to_string()),
                None => EventKind::Unknown(raw.to_string()),
            },
        }
    }

    /// The wire type string. `Tag("intro")` encodes as `"TAG_intro"`.
    pub fn wire_name(&self) -> Cow<'_, str> {
        match self {
            EventKind::Playing => Cow::Borrowed("PLAYING"),
            EventKind::Paused => Cow::Borrowed("PAUSED"),
            EventKind::Tick => Cow::Borrowed("TICK"),
            EventKind::Like => Cow::Borrowed("LIKE"),
            EventKind::Tag(tag) => Cow::Owned(format!("{TAG_PREFIX}{tag}")),
            EventKind::Unknown(raw) => Cow::Borrowed(raw),
        }
    }
}

/// One recorded viewer interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    /// Wall-clock seconds at which the client recorded the event.
    pub timestamp: f64,
    /// Decoded event kind.
    pub kind: EventKind,
    /// Playback position (seconds) at the moment of the event.
    pub media_time: f64,
    /// Most recent playback position known to the client when the event
    /// fired. May lag `media_time` on play/pause transitions; closing an
    /// interval uses this, not the transition's own `media_time`.
    pub last_media_time: f64,
}

impl InteractionEvent {
    pub fn new(timestamp: f64, kind: EventKind, media_time: f64, last_media_time: f64) -> Self {
        Self {
            timestamp,
            kind,
            media_time,
            last_media_time,
        }
    }

    /// Total order used when replaying a session's events.
    ///
    /// Events sort ascending by `(timestamp, typeString, mediaTime,
    /// lastMediaTime)`, the wire tuple in its natural order. The type string
    /// is the tie-breaker, so a `Tag` compares as its full `TAG_*` name.
    pub fn replay_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .total_cmp(&other.timestamp)
            .then_with(|| self.kind.wire_name().cmp(&other.kind.wire_name()))
            .then_with(|| self.media_time.total_cmp(&other.media_time))
            .then_with(|| self.last_media_time.total_cmp(&other.last_media_time))
    }
}

impl Serialize for InteractionEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            self.timestamp,
            self.kind.wire_name(),
            self.media_time,
            self.last_media_time,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InteractionEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (timestamp, raw_kind, media_time, last_media_time) =
            <(f64, String, f64, f64)>::deserialize(deserializer)?;
        Ok(Self {
            timestamp,
            kind: EventKind::parse(&raw_kind),
            media_time,
            last_media_time,
        })
    }
}

impl JsonSchema for InteractionEvent {
    fn schema_name() -> String {
        "InteractionEvent".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <(f64, String, f64, f64)>::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(EventKind::parse("PLAYING"), EventKind::Playing);
        assert_eq!(EventKind::parse("PAUSED"), EventKind::Paused);
        assert_eq!(EventKind::parse("TICK"), EventKind::Tick);
        assert_eq!(EventKind::parse("LIKE"), EventKind::Like);
    }

    #[test]
    fn test_parse_tag_strips_prefix() {
        assert_eq!(
            EventKind::parse("TAG_funny"),
            EventKind::Tag("funny".to_string())
        );
        // An empty tag name is allowed; it just labels the point with "".
        assert_eq!(EventKind::parse("TAG_"), EventKind::Tag(String::new()));
    }

    #[test]
    fn test_parse_unknown_round_trips() {
        let kind = EventKind::parse("SEEKED");
        assert_eq!(kind, EventKind::Unknown("SEEKED".to_string()));
        assert_eq!(kind.wire_name(), "SEEKED");
    }

    #[test]
    fn test_wire_format_round_trip() {
        let json = r#"[12.5,"TAG_intro",3.25,3.0]"#;
        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.timestamp, 12.5);
        assert_eq!(event.kind, EventKind::Tag("intro".to_string()));
        assert_eq!(event.media_time, 3.25);
        assert_eq!(event.last_media_time, 3.0);
        assert_eq!(serde_json::to_string(&event).unwrap(), json);
    }

    #[test]
    fn test_replay_order_breaks_ties_on_type_string() {
        // Same timestamp: LIKE < PAUSED < PLAYING < TAG_* < TICK, the
        // natural byte order of the wire strings.
        let like = InteractionEvent::new(1.0, EventKind::Like, 0.0, 0.0);
        let paused = InteractionEvent::new(1.0, EventKind::Paused, 0.0, 0.0);
        let playing = InteractionEvent::new(1.0, EventKind::Playing, 0.0, 0.0);
        let tag = InteractionEvent::new(1.0, EventKind::Tag("a".into()), 0.0, 0.0);
        let tick = InteractionEvent::new(1.0, EventKind::Tick, 0.0, 0.0);

        assert_eq!(like.replay_cmp(&paused), Ordering::Less);
        assert_eq!(paused.replay_cmp(&playing), Ordering::Less);
        assert_eq!(playing.replay_cmp(&tag), Ordering::Less);
        assert_eq!(tag.replay_cmp(&tick), Ordering::Less);
    }

    #[test]
    fn test_replay_order_is_timestamp_first() {
        let earlier = InteractionEvent::new(1.0, EventKind::Tick, 99.0, 99.0);
        let later = InteractionEvent::new(2.0, EventKind::Like, 0.0, 0.0);
        assert_eq!(earlier.replay_cmp(&later), Ordering::Less);
    }
}

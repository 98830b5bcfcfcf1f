//! Playback reconstruction from a single session's event stream.
//!
//! The input is an unordered, possibly-duplicated, possibly-gapped list of
//! events as one client recorded them. The output is the sequence of
//! continuous playback intervals the client actually watched, plus the liked
//! and tagged points, all derived in one pass over the events in replay
//! order.

use playline_models::{EventKind, InteractionEvent, PlaybackInterval, TaggedPoint};

/// Slack multiplier for skip inference on heartbeat events.
///
/// A `TICK` is treated as a seek/skip when elapsed wall time times this
/// factor is still smaller than the media-time jump since the previous
/// event. Heartbeats are the only periodic signal, so a seek performed
/// outside explicit play/pause bracketing can only be inferred from an
/// implausible media-time jump; 30 tolerates playback-rate variation up to
/// 30x without false positives.
pub const SKIP_SLACK_FACTOR: f64 = 30.0;

/// Result of reconstructing one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Disjoint playback intervals in the order they closed.
    pub intervals: Vec<PlaybackInterval>,
    /// Liked media-time points in replay order.
    pub liked_points: Vec<f64>,
    /// Tagged media-time points in replay order.
    pub tagged_points: Vec<TaggedPoint>,
}

/// Trailing context from the previously replayed event.
struct PrevEvent {
    timestamp: f64,
    media_time: f64,
    last_media_time: f64,
}

/// Reconstruct playback intervals and derived signals from raw events.
///
/// The events are replayed in the total order defined by
/// [`InteractionEvent::replay_cmp`]; the input slice itself is never
/// reordered, deduplicated, or otherwise mutated. Duplicate events are
/// replayed twice. Unknown event kinds are skipped, but still become the
/// previous-event context for skip detection.
pub fn reconstruct(events: &[InteractionEvent]) -> Reconstruction {
    let mut ordered: Vec<&InteractionEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.replay_cmp(b));

    let mut out = Reconstruction::default();
    // Media time at which the currently open interval started; None while
    // paused (or before the first PLAYING).
    let mut cur_start: Option<f64> = None;
    let mut prev: Option<PrevEvent> = None;

    for event in ordered {
        match &event.kind {
            EventKind::Like => out.liked_points.push(event.media_time),
            EventKind::Tag(tag) => out
                .tagged_points
                .push(TaggedPoint::new(event.media_time, tag.clone())),
            EventKind::Playing => {
                // Back-to-back PLAYING without an intervening PAUSED is an
                // implicit restart: close the open interval first.
                if let Some(start) = cur_start {
                    out.intervals
                        .push(PlaybackInterval::new(start, event.last_media_time));
                }
                cur_start = Some(event.media_time);
            }
            EventKind::Paused => {
                if let Some(start) = cur_start.take() {
                    out.intervals
                        .push(PlaybackInterval::new(start, event.last_media_time));
                }
            }
            EventKind::Tick => {
                // A heartbeat that jumped implausibly far in media time is an
                // inferred seek: end the interval at the previous position and
                // reopen at the new one. The first event of a session can
                // never be a skip boundary.
                if let Some(p) = &prev {
                    let elapsed = event.timestamp - p.timestamp;
                    let jumped = event.media_time - p.media_time;
                    if elapsed * SKIP_SLACK_FACTOR < jumped {
                        if let Some(start) = cur_start {
                            out.intervals
                                .push(PlaybackInterval::new(start, p.media_time));
                            cur_start = Some(event.media_time);
                        }
                    }
                }
            }
            EventKind::Unknown(_) => {}
        }

        prev = Some(PrevEvent {
            timestamp: event.timestamp,
            media_time: event.media_time,
            last_media_time: event.last_media_time,
        });
    }

    // Session ended (or last known state) while still nominally playing:
    // close the final interval at the last reported position.
    if let (Some(start), Some(p)) = (cur_start, &prev) {
        out.intervals
            .push(PlaybackInterval::new(start, p.last_media_time));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(timestamp: f64, kind: &str, media_time: f64, last_media_time: f64) -> InteractionEvent {
        InteractionEvent::new(
            timestamp,
            EventKind::parse(kind),
            media_time,
            last_media_time,
        )
    }

    fn intervals(events: &[InteractionEvent]) -> Vec<(f64, f64)> {
        reconstruct(events)
            .intervals
            .iter()
            .map(|i| (i.start, i.end))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let rec = reconstruct(&[]);
        assert_eq!(rec, Reconstruction::default());
    }

    #[test]
    fn test_play_pause_closes_interval() {
        let events = vec![ev(0.0, "PLAYING", 10.0, 10.0), ev(5.0, "PAUSED", 20.0, 20.0)];
        assert_eq!(intervals(&events), vec![(10.0, 20.0)]);
    }

    #[test]
    fn test_pause_closes_at_last_media_time_not_own_position() {
        // The PAUSED event's own media_time may already reflect a seek; the
        // interval must end at last_media_time.
        let events = vec![
            ev(0.0, "PLAYING", 10.0, 10.0),
            ev(5.0, "PAUSED", 50.0, 15.0),
        ];
        assert_eq!(intervals(&events), vec![(10.0, 15.0)]);
    }

    #[test]
    fn test_paused_without_open_interval_is_noop() {
        let events = vec![ev(0.0, "PAUSED", 5.0, 5.0), ev(1.0, "PAUSED", 5.0, 5.0)];
        assert!(intervals(&events).is_empty());
    }

    #[test]
    fn test_consecutive_paused_is_idempotent() {
        let events = vec![
            ev(0.0, "PLAYING", 0.0, 0.0),
            ev(3.0, "PAUSED", 3.0, 3.0),
            ev(4.0, "PAUSED", 3.0, 3.0),
        ];
        assert_eq!(intervals(&events), vec![(0.0, 3.0)]);
    }

    #[test]
    fn test_implicit_restart_on_back_to_back_playing() {
        let events = vec![ev(0.0, "PLAYING", 0.0, 0.0), ev(1.0, "PLAYING", 5.0, 5.0)];
        // First interval closes at the second event's last_media_time; the
        // reopened interval closes at session end.
        assert_eq!(intervals(&events), vec![(0.0, 5.0), (5.0, 5.0)]);
    }

    #[test]
    fn test_open_interval_closes_at_session_end() {
        let events = vec![ev(0.0, "PLAYING", 2.0, 2.0), ev(4.0, "TICK", 6.0, 6.0)];
        assert_eq!(intervals(&events), vec![(2.0, 6.0)]);
    }

    #[test]
    fn test_skip_detected_on_implausible_jump() {
        let events = vec![
            ev(0.0, "PLAYING", 0.0, 0.0),
            ev(1.0, "TICK", 0.0, 0.0),
            ev(2.0, "TICK", 100.0, 100.0),
        ];
        // 1s elapsed * 30 = 30 < 100 jumped: interval ends at the previous
        // position, playback reopens at 100 and closes at session end.
        assert_eq!(intervals(&events), vec![(0.0, 0.0), (100.0, 100.0)]);
    }

    #[test]
    fn test_no_false_skip_during_normal_playback() {
        let events = vec![ev(0.0, "PLAYING", 0.0, 0.0), ev(1.0, "TICK", 1.0, 1.0)];
        assert_eq!(intervals(&events), vec![(0.0, 1.0)]);
    }

    #[test]
    fn test_tick_as_first_event_never_skips() {
        let events = vec![ev(0.0, "TICK", 500.0, 500.0)];
        assert!(intervals(&events).is_empty());
    }

    #[test]
    fn test_skip_without_open_interval_changes_nothing() {
        let events = vec![
            ev(0.0, "TICK", 0.0, 0.0),
            ev(1.0, "TICK", 100.0, 100.0),
        ];
        assert!(intervals(&events).is_empty());
    }

    #[test]
    fn test_backward_jump_is_not_a_skip() {
        // Rewinding makes the media-time delta negative; never a skip.
        let events = vec![
            ev(0.0, "PLAYING", 50.0, 50.0),
            ev(1.0, "TICK", 51.0, 51.0),
            ev(2.0, "TICK", 3.0, 3.0),
        ];
        assert_eq!(intervals(&events), vec![(50.0, 3.0)]);
    }

    #[test]
    fn test_likes_and_tags_collected_in_replay_order() {
        let events = vec![
            ev(5.0, "LIKE", 42.0, 42.0),
            ev(1.0, "TAG_funny", 10.0, 10.0),
            ev(3.0, "LIKE", 20.0, 20.0),
        ];
        let rec = reconstruct(&events);
        assert_eq!(rec.liked_points, vec![20.0, 42.0]);
        assert_eq!(rec.tagged_points, vec![TaggedPoint::new(10.0, "funny")]);
        assert!(rec.intervals.is_empty());
    }

    #[test]
    fn test_likes_do_not_disturb_playback_state() {
        let events = vec![
            ev(0.0, "PLAYING", 0.0, 0.0),
            ev(1.0, "LIKE", 1.0, 1.0),
            ev(2.0, "PAUSED", 2.0, 2.0),
        ];
        let rec = reconstruct(&events);
        assert_eq!(rec.liked_points, vec![1.0]);
        assert_eq!(rec.intervals, vec![PlaybackInterval::new(0.0, 2.0)]);
    }

    #[test]
    fn test_unknown_events_are_ignored_but_advance_context() {
        // The unknown event's position becomes the skip-detection baseline:
        // the following TICK sees no implausible jump from it.
        let events = vec![
            ev(0.0, "PLAYING", 0.0, 0.0),
            ev(10.0, "BUFFERING", 99.0, 99.0),
            ev(11.0, "TICK", 100.0, 100.0),
        ];
        assert_eq!(intervals(&events), vec![(0.0, 100.0)]);
    }

    #[test]
    fn test_duplicate_events_are_replayed_twice() {
        let events = vec![
            ev(1.0, "LIKE", 7.0, 7.0),
            ev(1.0, "LIKE", 7.0, 7.0),
        ];
        assert_eq!(reconstruct(&events).liked_points, vec![7.0, 7.0]);
    }

    #[test]
    fn test_output_is_permutation_invariant() {
        let ordered = vec![
            ev(0.0, "PLAYING", 0.0, 0.0),
            ev(1.0, "TICK", 1.0, 1.0),
            ev(2.0, "LIKE", 2.0, 2.0),
            ev(3.0, "PAUSED", 3.0, 3.0),
            ev(4.0, "PLAYING", 10.0, 10.0),
            ev(5.0, "TAG_end", 11.0, 11.0),
        ];
        let expected = reconstruct(&ordered);

        let mut reversed = ordered.clone();
        reversed.reverse();
        assert_eq!(reconstruct(&reversed), expected);

        let mut interleaved = Vec::new();
        for pair in ordered.chunks(2).rev() {
            interleaved.extend_from_slice(pair);
        }
        assert_eq!(reconstruct(&interleaved), expected);
    }

    #[test]
    fn test_input_order_is_not_mutated() {
        let events = vec![ev(2.0, "PAUSED", 3.0, 3.0), ev(0.0, "PLAYING", 1.0, 1.0)];
        let before = events.clone();
        let _ = reconstruct(&events);
        assert_eq!(events, before);
    }

    #[test]
    fn test_malformed_interval_passes_through() {
        // A client reporting an end before the start is preserved as-is;
        // validation is a consumer concern.
        let events = vec![
            ev(0.0, "PLAYING", 30.0, 30.0),
            ev(5.0, "PAUSED", 4.0, 4.0),
        ];
        assert_eq!(intervals(&events), vec![(30.0, 4.0)]);
    }
}

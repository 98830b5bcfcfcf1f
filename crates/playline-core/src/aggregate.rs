//! Cross-session aggregation fold.
//!
//! Combines per-session reconstructions into one rollup for a video. The
//! fold composes pure [`reconstruct`] return values; nothing is accumulated
//! through shared mutable parameters.

use playline_models::{InteractionEvent, PlaybackInterval, TaggedPoint};

use crate::reconstruct::reconstruct;

/// Whether a session that reconstructed to zero playback intervals still
/// contributes an (empty) entry to the per-session `playbacks` list.
///
/// Historical deployments disagreed on this, so it is an explicit
/// configuration choice rather than an accident of the fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroIntervalPolicy {
    /// Sessions without intervals are left out of `playbacks` entirely.
    #[default]
    Omit,
    /// Every session contributes an entry, empty or not, so `playbacks`
    /// indexes line up with session count.
    KeepEmpty,
}

/// Options controlling the aggregation fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    pub zero_interval_policy: ZeroIntervalPolicy,
}

/// Rollup of every interaction session recorded against one video.
///
/// `num_sessions` counts all sessions, including those that produced no
/// intervals; liked and tagged points are flattened across sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRollup {
    pub num_sessions: u32,
    pub playbacks: Vec<Vec<PlaybackInterval>>,
    pub liked_points: Vec<f64>,
    pub tagged_points: Vec<TaggedPoint>,
}

/// Reconstruct every session and fold the results into one rollup.
///
/// Interval lists from different sessions are kept side by side; overlaps
/// across sessions are intentionally preserved, not clipped or merged.
pub fn aggregate_sessions<'a, I>(event_lists: I, options: &AggregateOptions) -> SessionRollup
where
    I: IntoIterator<Item = &'a [InteractionEvent]>,
{
    let mut rollup = SessionRollup::default();

    for events in event_lists {
        let rec = reconstruct(events);
        rollup.num_sessions += 1;
        rollup.liked_points.extend(rec.liked_points);
        rollup.tagged_points.extend(rec.tagged_points);

        if !rec.intervals.is_empty()
            || options.zero_interval_policy == ZeroIntervalPolicy::KeepEmpty
        {
            rollup.playbacks.push(rec.intervals);
        }
    }

    rollup
}

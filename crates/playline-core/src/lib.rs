//! The algorithmic core of the Playline backend.
//!
//! Two pure, synchronous computations:
//! - [`reconstruct`]: turn one session's raw event list into playback
//!   intervals plus liked/tagged point lists.
//! - [`aggregate_sessions`]: fold reconstructions from every session of a
//!   video into one rollup.
//!
//! Nothing here performs I/O or holds state between calls; storage and HTTP
//! concerns live in the surrounding crates.

pub mod aggregate;
pub mod reconstruct;

pub use aggregate::{aggregate_sessions, AggregateOptions, SessionRollup, ZeroIntervalPolicy};
pub use reconstruct::{reconstruct, Reconstruction, SKIP_SLACK_FACTOR};

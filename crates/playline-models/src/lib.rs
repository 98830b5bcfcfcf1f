//! Shared data models for the Playline backend.
//!
//! This crate provides:
//! - Interaction events and their legacy wire encoding
//! - Interaction-session and user-session documents
//! - MCA (most common annotation) records
//! - The aggregate summary returned to clients

pub mod aggregate;
pub mod event;
pub mod ids;
pub mod mca;
pub mod session;

pub use aggregate::{AggregateSummary, PlaybackInterval, TaggedPoint};
pub use event::{EventKind, InteractionEvent};
pub use ids::{SessionToken, UserSessionId, VideoId};
pub use mca::{McaAnnotation, McaKind, ParseMcaKindError};
pub use session::{InteractionSession, UserSession};

//! Firestore REST API client and typed repositories.
//!
//! This crate provides:
//! - Typed repositories for interaction sessions, user sessions, and
//!   per-video annotation records
//! - Service account authentication via gcp_auth, with emulator support
//! - Merge updates, field unsetting, and retry logic

pub mod annotations;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod sessions;
pub mod token_cache;
pub mod types;
pub mod users;

pub use annotations::AnnotationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use sessions::InteractionSessionRepository;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
pub use users::UserSessionRepository;

//! Axum HTTP API server.
//!
//! This crate provides:
//! - Session issuance and event submission endpoints
//! - The per-video aggregate endpoint
//! - Signature-authenticated admin endpoints (MCA upload, session
//!   import/export, wholesale reset)
//! - Rate limiting, security headers, and Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{AggregateService, IngestService};
pub use state::AppState;

//! Business logic services.

pub mod aggregate;
pub mod ingest;

pub use aggregate::AggregateService;
pub use ingest::IngestService;

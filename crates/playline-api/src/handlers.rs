//! Request handlers.

pub mod admin;
pub mod aggregate;
pub mod health;
pub mod sessions;

pub use admin::*;
pub use aggregate::*;
pub use health::*;
pub use sessions::*;

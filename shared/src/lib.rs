//! Shared types for memorial-cloud
//!
//! Common types used across crates: error codes and API responses,
//! domain models, request/pagination types, validation and utilities.

pub mod error;
pub mod models;
pub mod request;
pub mod util;
pub mod validation;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

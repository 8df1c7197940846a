//! Data models
//!
//! Shared between memorial-cloud and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID strings, all `*_at` timestamps are Unix milliseconds.

pub mod activity;
pub mod family;
pub mod genealogy;
pub mod heritage;
pub mod memorial;
pub mod privacy;
pub mod reminder;
pub mod user;

// Re-exports
pub use activity::*;
pub use family::*;
pub use genealogy::*;
pub use heritage::*;
pub use memorial::*;
pub use privacy::*;
pub use reminder::*;
pub use user::*;

//! memorial-cloud: memorial and family graph backend
//!
//! - Access Evaluator: who may see or change a memorial or family
//! - Privacy Controller: privacy levels, grants, blacklist, access requests
//! - Family Graph Manager: families, membership, invitations, genealogy, heritage
//! - Activity Ledger: family activity feed and collective worship

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;

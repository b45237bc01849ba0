//! HTTP request handlers organized by domain

pub mod advisor;
pub mod ledger;
pub mod status;

// Re-export all handlers for use in router
pub use advisor::*;
pub use ledger::*;
pub use status::*;

//! Service Module
//!
//! Business logic layer for the server.
//! Services sit between the HTTP handlers and the engine/scheduler adapter.

pub mod jobs;

// Re-export for convenience
pub use jobs as jobs_service;

//! Core domain types
//!
//! This module contains the field schema and the record types produced by the
//! aggregation engine. These types are shared between the HTTP service (which
//! serializes them) and the CLI (which deserializes and renders them).

pub mod field;
pub mod job;
pub mod queue;
pub mod resources;

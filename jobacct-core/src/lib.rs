//! jobacct Core
//!
//! Core types and the aggregation engine for scheduler job accounting.
//!
//! This crate contains:
//! - Domain types: field schema, job records, queue entries
//! - The engine: canonicalizers, parser, merger, deriver, driver
//! - Ports: the traits an adapter implements to feed the engine
//! - DTOs: payloads shared by the HTTP service and its clients

pub mod aggregate;
pub mod billing;
pub mod canonical;
pub mod derive;
pub mod domain;
pub mod dto;
pub mod error;
pub mod merge;
pub mod nodelist;
pub mod parser;
pub mod ports;
pub mod session;

pub use aggregate::{Aggregator, MalformedLinePolicy, aggregate_text};
pub use error::{AccountingError, InvalidJobId, ParseError, SourceError};

//! Data models for the query service.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{DatabaseType, masked_connection_string};
pub use query::{CandidateQuery, Provenance, QueryResponse, Question, ResultSet};
pub use schema::{EnumType, Relationship, SchemaColumn, SchemaDescription};

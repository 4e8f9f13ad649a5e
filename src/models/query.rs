//! Query-related data models.
//!
//! This module defines the request, intermediate and result types that flow
//! through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A natural-language question about the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
}

impl Question {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// The question with surrounding whitespace removed.
    pub fn text(&self) -> &str {
        self.question.trim()
    }
}

/// Where a candidate statement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Fixed keyword-driven template
    Heuristic,
    /// Produced by the generative backend
    Generated,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single SQL statement proposed by a translator; not yet safe to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub sql: String,
    pub provenance: Provenance,
}

impl CandidateQuery {
    pub fn new(sql: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            sql: sql.into(),
            provenance,
        }
    }

    pub fn heuristic(sql: impl Into<String>) -> Self {
        Self::new(sql, Provenance::Heuristic)
    }

    pub fn generated(sql: impl Into<String>) -> Self {
        Self::new(sql, Provenance::Generated)
    }
}

/// Tabular query result. Each row holds one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Successful answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResponse {
    pub fn new(sql: impl Into<String>, result: ResultSet) -> Self {
        Self {
            sql: sql.into(),
            columns: result.columns,
            rows: result.rows,
        }
    }
}

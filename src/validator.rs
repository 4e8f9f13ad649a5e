//! Lexical safety screen for candidate statements.
//!
//! Every candidate, whichever translator produced it, passes through
//! [`validate`] before it can reach the executor. [`ValidatedQuery`] can only
//! be constructed here, so the executor's signature enforces the ordering.
//!
//! The screen is a blocklist over the lower-cased text. It does not parse SQL:
//! a statement that avoids every marker is accepted even if it is not a plain
//! `SELECT`.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{CandidateQuery, Provenance};
use tracing::warn;

/// Verbs that may not appear unless an identifier character follows them.
pub const FORBIDDEN_VERBS: &[&str] = &["drop", "insert", "update", "delete", "alter"];

/// Comment introducers.
pub const COMMENT_MARKERS: &[&str] = &["--", "/*"];

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Empty,
    StatementSeparator,
    Comment(&'static str),
    ForbiddenVerb(&'static str),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty statement"),
            Self::StatementSeparator => f.write_str("multiple statements (';')"),
            Self::Comment(marker) => write!(f, "comment marker '{}'", marker),
            Self::ForbiddenVerb(verb) => write!(f, "forbidden keyword '{}'", verb),
        }
    }
}

/// A candidate that passed the safety screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    candidate: CandidateQuery,
}

impl ValidatedQuery {
    /// The statement, exactly as the translator produced it.
    pub fn sql(&self) -> &str {
        &self.candidate.sql
    }

    pub fn provenance(&self) -> Provenance {
        self.candidate.provenance
    }
}

/// Screen a candidate. On success the statement is returned unchanged.
pub fn validate(candidate: CandidateQuery) -> PipelineResult<ValidatedQuery> {
    match find_violation(&candidate.sql) {
        None => Ok(ValidatedQuery { candidate }),
        Some(violation) => {
            warn!(
                sql = %candidate.sql,
                provenance = %candidate.provenance,
                reason = %violation,
                "Rejected unsafe SQL"
            );
            Err(PipelineError::unsafe_query(candidate.sql, violation.to_string()))
        }
    }
}

/// Return the first rule the statement breaks, if any.
pub fn find_violation(sql: &str) -> Option<Violation> {
    let lower = sql.to_lowercase();
    let body = lower.trim_end();

    if body.trim_start().is_empty() {
        return Some(Violation::Empty);
    }

    // One trailing terminator is allowed.
    let body = body.strip_suffix(';').unwrap_or(body);
    if body.contains(';') || body.trim().is_empty() {
        return Some(Violation::StatementSeparator);
    }

    if let Some(marker) = COMMENT_MARKERS.iter().find(|m| lower.contains(**m)) {
        return Some(Violation::Comment(*marker));
    }

    FORBIDDEN_VERBS
        .iter()
        .find(|verb| contains_verb(&lower, verb))
        .map(|verb| Violation::ForbiddenVerb(*verb))
}

/// True if `verb` occurs without an identifier character right after it.
///
/// Whitespace, a quote, a parenthesis or the end of the text all end the verb,
/// so `update"Invoice"` is a hit while `"updatedAt"` is not.
fn contains_verb(text: &str, verb: &str) -> bool {
    text.match_indices(verb).any(|(idx, _)| {
        !text[idx + verb.len()..]
            .chars()
            .next()
            .is_some_and(is_identifier_char)
    })
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

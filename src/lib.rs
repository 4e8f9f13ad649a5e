//! AskDB Server Library
//!
//! Answers natural-language questions about an invoice database: the question
//! is translated to a single read-only SQL statement, screened, executed, and
//! the tabular result returned.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod transport;
pub mod translate;
pub mod validator;

pub use config::Config;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use pipeline::{CancelHandle, CancelToken, Pipeline};

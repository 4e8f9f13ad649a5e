//! Question answering pipeline.
//!
//! One request runs four steps in order: describe the schema, translate the
//! question, validate the candidate, execute it. The first failure ends the
//! request. Every blocking step is bounded by its timeout and races the
//! request's [`CancelToken`].

pub mod cancel;

pub use cancel::{CancelHandle, CancelToken};

use crate::config::Config;
use crate::db::{DbPool, QueryExecutor, SchemaInspector};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{QueryResponse, Question};
use crate::translate::Translator;
use crate::validator;
use std::future::Future;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Per-step time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Schema inspection, including acquiring a connection
    pub connect: Duration,
    /// Generative backend round trip
    pub backend: Duration,
    /// Statement execution
    pub query: Duration,
}

impl Timeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            connect: config.connect_timeout_duration(),
            backend: config.backend_timeout_duration(),
            query: config.query_timeout_duration(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Long-lived, immutable request processor. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Pipeline {
    pool: DbPool,
    inspector: SchemaInspector,
    translator: Translator,
    executor: QueryExecutor,
    timeouts: Timeouts,
}

impl Pipeline {
    pub fn new(
        pool: DbPool,
        inspector: SchemaInspector,
        translator: Translator,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            pool,
            inspector,
            executor: QueryExecutor::new(timeouts.query),
            translator,
            timeouts,
        }
    }

    /// Build the pool, translator and executor from configuration.
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        let pool = DbPool::from_config(config)?;
        let translator = Translator::from_config(config)?;
        Ok(Self::new(
            pool,
            SchemaInspector::invoice_domain(),
            translator,
            Timeouts::from_config(config),
        ))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Close the database pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Answer a question under a fresh request id.
    pub async fn answer(
        &self,
        question: &Question,
        cancel: &CancelToken,
    ) -> PipelineResult<QueryResponse> {
        self.answer_with_id(Uuid::new_v4(), question, cancel).await
    }

    /// Answer a question, tagging all log events with `request_id`.
    pub async fn answer_with_id(
        &self,
        request_id: Uuid,
        question: &Question,
        cancel: &CancelToken,
    ) -> PipelineResult<QueryResponse> {
        let span = info_span!("query", request_id = %request_id);
        self.run(question, cancel).instrument(span).await
    }

    async fn run(&self, question: &Question, cancel: &CancelToken) -> PipelineResult<QueryResponse> {
        let text = question.text();
        if text.is_empty() {
            return Err(PipelineError::invalid_input("question must not be empty"));
        }
        info!(question = %text, strategy = self.translator.strategy_name(), "Question received");

        if cancel.is_cancelled() {
            return Err(PipelineError::cancelled("schema inspection"));
        }

        let schema = guarded(
            "schema inspection",
            cancel,
            self.timeouts.connect,
            || {
                PipelineError::connection(
                    format!(
                        "Schema inspection timed out after {} seconds",
                        self.timeouts.connect.as_secs()
                    ),
                    "Check that the database is reachable",
                )
            },
            self.inspector.describe_schema(&self.pool),
        )
        .await?;
        debug!(schema = %schema, "Schema described");

        let candidate = guarded(
            "translation",
            cancel,
            self.timeouts.backend,
            || {
                PipelineError::backend(format!(
                    "Completion timed out after {} seconds",
                    self.timeouts.backend.as_secs()
                ))
            },
            self.translator.translate(question, &schema),
        )
        .await?;
        info!(sql = %candidate.sql, provenance = %candidate.provenance, "Generated SQL");

        let validated = validator::validate(candidate)?;

        // The executor applies the query timeout itself.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::cancelled("execution")),
            result = self.executor.execute(&validated, &self.pool) => result,
        }?;
        info!(rows = result.row_count(), "Returning rows");

        Ok(QueryResponse::new(validated.sql(), result))
    }
}

/// Run `fut` under `limit`, failing early if the request is cancelled.
async fn guarded<T, F>(
    operation: &'static str,
    cancel: &CancelToken,
    limit: Duration,
    on_timeout: impl FnOnce() -> PipelineError,
    fut: F,
) -> PipelineResult<T>
where
    F: Future<Output = PipelineResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::cancelled(operation)),
        result = tokio::time::timeout(limit, fut) => match result {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        },
    }
}

//! Query execution engine.
//!
//! Runs a [`ValidatedQuery`] as raw text on one pooled connection and decodes
//! the full result into a [`ResultSet`].
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules
//! (`postgres`, `sqlite`). Both acquire a connection, fetch every row under the
//! query timeout and fall back to describing the statement when no rows come
//! back, so an empty result still reports its columns.
//!
//! The connection is a `PoolConnection` guard and returns to the pool when it
//! drops, on success, error and timeout alike.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{PipelineError, PipelineResult};
use crate::models::ResultSet;
use crate::validator::ValidatedQuery;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    query_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Execute a validated statement and return every row.
    ///
    /// Fails with `Connection` when no connection can be acquired and with
    /// `Execution` for anything that goes wrong once the statement is sent.
    pub async fn execute(&self, query: &ValidatedQuery, pool: &DbPool) -> PipelineResult<ResultSet> {
        let start = Instant::now();
        let sql = query.sql();

        debug!(
            sql = %sql,
            timeout_secs = self.query_timeout.as_secs(),
            "Executing query"
        );

        let result = match pool {
            DbPool::Postgres(p) => postgres::fetch_result(p, sql, self.query_timeout).await?,
            DbPool::SQLite(p) => sqlite::fetch_result(p, sql, self.query_timeout).await?,
        };

        debug!(
            rows = result.row_count(),
            columns = result.columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );
        Ok(result)
    }
}

/// Build a result set from decoded rows, or from described columns when empty.
fn build_result<R: RowToJson>(rows: Vec<R>, described: Option<Vec<String>>) -> ResultSet {
    let columns = match rows.first() {
        Some(row) => row.column_names(),
        None => described.unwrap_or_default(),
    };
    let rows = rows.iter().map(RowToJson::to_json_values).collect();
    ResultSet { columns, rows }
}

/// Errors after the statement was sent are execution failures, even when the
/// connection dropped underneath it.
fn execution_error(err: sqlx::Error) -> PipelineError {
    match PipelineError::from(err) {
        err @ PipelineError::Execution { .. } => err,
        other => PipelineError::execution(other.to_string(), None),
    }
}

fn timeout_error(timeout: Duration) -> PipelineError {
    PipelineError::execution(
        format!("Query timed out after {} seconds", timeout.as_secs()),
        None,
    )
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.

mod postgres {
    use super::*;
    use sqlx::{Column, Executor, PgPool};

    pub async fn fetch_result(
        pool: &PgPool,
        sql: &str,
        query_timeout: Duration,
    ) -> PipelineResult<ResultSet> {
        let mut conn = pool.acquire().await?;

        let rows = match timeout(query_timeout, (&mut *conn).fetch_all(sql)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(execution_error(e)),
            Err(_) => return Err(timeout_error(query_timeout)),
        };

        let described = if rows.is_empty() {
            let describe = timeout(query_timeout, (&mut *conn).describe(sql))
                .await
                .map_err(|_| timeout_error(query_timeout))?
                .map_err(execution_error)?;
            Some(describe.columns().iter().map(|c| c.name().to_string()).collect())
        } else {
            None
        };

        Ok(build_result(rows, described))
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Column, Executor, SqlitePool};

    pub async fn fetch_result(
        pool: &SqlitePool,
        sql: &str,
        query_timeout: Duration,
    ) -> PipelineResult<ResultSet> {
        let mut conn = pool.acquire().await?;

        let rows = match timeout(query_timeout, (&mut *conn).fetch_all(sql)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(execution_error(e)),
            Err(_) => return Err(timeout_error(query_timeout)),
        };

        let described = if rows.is_empty() {
            let describe = timeout(query_timeout, (&mut *conn).describe(sql))
                .await
                .map_err(|_| timeout_error(query_timeout))?
                .map_err(execution_error)?;
            Some(describe.columns().iter().map(|c| c.name().to_string()).collect())
        } else {
            None
        };

        Ok(build_result(rows, described))
    }
}

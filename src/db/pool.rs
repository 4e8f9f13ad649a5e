//! Connection pool management.
//!
//! This module provides connection pooling using database-specific pools
//! (PgPool, SqlitePool) to ensure full type support. Pooling itself is left to
//! sqlx; the service only sizes the pool and bounds the acquire time.

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{DatabaseType, masked_connection_string};
use sqlx::{
    PgPool, SqlitePool, postgres::PgConnectOptions, postgres::PgPoolOptions,
    sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Database-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Create a pool from the process configuration.
    ///
    /// The pool connects lazily: an unreachable database is reported by the
    /// first request that needs it, not at startup.
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        let url = config.database_url()?;
        let db_type = config.database_type()?;
        Self::connect_lazy(
            url,
            db_type,
            config.max_connections,
            config.connect_timeout_duration(),
        )
    }

    /// Create a lazily connecting pool for the given URL.
    pub fn connect_lazy(
        url: &str,
        db_type: DatabaseType,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> PipelineResult<Self> {
        info!(
            db_type = %db_type,
            url = %masked_connection_string(url),
            "Creating database pool"
        );

        let pool = match db_type {
            DatabaseType::PostgreSQL => {
                let options = PgConnectOptions::from_str(url).map_err(|e| {
                    PipelineError::configuration(format!("Invalid PostgreSQL URL: {}", e))
                })?;
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections.max(1))
                    .acquire_timeout(acquire_timeout)
                    .connect_lazy_with(options);
                DbPool::Postgres(pool)
            }
            DatabaseType::SQLite => {
                let options = SqliteConnectOptions::from_str(url).map_err(|e| {
                    PipelineError::configuration(format!("Invalid SQLite URL: {}", e))
                })?;
                // A single connection keeps in-memory databases coherent.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(acquire_timeout)
                    .connect_lazy_with(options);
                DbPool::SQLite(pool)
            }
        };

        debug!(db_type = %db_type, "Database pool created");
        Ok(pool)
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
        }
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::Postgres(_) => DatabaseType::PostgreSQL,
            DbPool::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

impl From<PgPool> for DbPool {
    fn from(pool: PgPool) -> Self {
        DbPool::Postgres(pool)
    }
}

impl From<SqlitePool> for DbPool {
    fn from(pool: SqlitePool) -> Self {
        DbPool::SQLite(pool)
    }
}

//! Schema introspection module.
//!
//! Reads the live column list of the connected database and pairs it with the
//! known relationships to build a [`SchemaDescription`].
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Database-specific implementations are in their respective
//! submodules (postgres, sqlite), each returning columns in the same order:
//! table name, then declaration order.

use crate::db::pool::DbPool;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Relationship, SchemaColumn, SchemaDescription};
use tracing::debug;

/// Schema inspector for database introspection.
#[derive(Debug, Clone)]
pub struct SchemaInspector {
    relationships: Vec<Relationship>,
}

impl SchemaInspector {
    /// Create an inspector that reports the given relationships alongside the
    /// introspected columns.
    pub fn new(relationships: Vec<Relationship>) -> Self {
        Self { relationships }
    }

    /// Inspector for the invoice schema.
    pub fn invoice_domain() -> Self {
        Self::new(Relationship::invoice_domain())
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Describe the live schema.
    ///
    /// Any failure, whether connecting or querying the catalogs, is reported
    /// as a connection error.
    pub async fn describe_schema(&self, pool: &DbPool) -> PipelineResult<SchemaDescription> {
        let columns = match pool {
            DbPool::Postgres(p) => postgres::list_columns(p).await,
            DbPool::SQLite(p) => sqlite::list_columns(p).await,
        }
        .map_err(PipelineError::introspection)?;

        debug!(
            columns = columns.len(),
            relationships = self.relationships.len(),
            "Described schema"
        );
        Ok(SchemaDescription::new(columns, self.relationships.clone()))
    }
}

impl Default for SchemaInspector {
    fn default() -> Self {
        Self::invoice_domain()
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        /// Public-schema columns, skipping the ORM's migration bookkeeping tables.
        pub const LIST_COLUMNS: &str = r#"
            SELECT
                table_name::text AS table_name,
                column_name::text AS column_name,
                data_type::text AS data_type,
                udt_name::text AS udt_name
            FROM information_schema.columns
            WHERE table_schema = 'public'
            AND table_name NOT LIKE '\_prisma%'
            ORDER BY table_name, ordinal_position
            "#;

        pub const LIST_ENUM_LABELS: &str = r#"
            SELECT
                t.typname::text AS type_name,
                e.enumlabel::text AS label
            FROM pg_enum e
            JOIN pg_type t ON e.enumtypid = t.oid
            ORDER BY t.typname, e.enumsortorder
            "#;

        pub const USER_DEFINED: &str = "USER-DEFINED";
    }

    pub mod sqlite {
        pub const LIST_COLUMNS: &str = r#"
            SELECT
                m.name AS table_name,
                p.name AS column_name,
                p.type AS data_type
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type = 'table'
            AND m.name NOT LIKE 'sqlite\_%' ESCAPE '\'
            AND m.name NOT LIKE '\_prisma%' ESCAPE '\'
            ORDER BY m.name, p.cid
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};
    use std::collections::HashMap;

    pub async fn list_columns(pool: &PgPool) -> Result<Vec<SchemaColumn>, sqlx::Error> {
        let enums = list_enum_labels(pool).await?;
        let rows = sqlx::query(queries::postgres::LIST_COLUMNS)
            .fetch_all(pool)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let table_name: String = row.try_get("table_name")?;
            let column_name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let udt_name: String = row.try_get("udt_name")?;

            let column = SchemaColumn::new(table_name, column_name, data_type);
            columns.push(resolve_enum(column, &udt_name, &enums));
        }

        debug!(count = columns.len(), enums = enums.len(), "Listed PostgreSQL columns");
        Ok(columns)
    }

    /// Enum labels keyed by type name, each in declared sort order.
    async fn list_enum_labels(pool: &PgPool) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
        let rows = sqlx::query(queries::postgres::LIST_ENUM_LABELS)
            .fetch_all(pool)
            .await?;

        let mut enums: HashMap<String, Vec<String>> = HashMap::new();
        for row in &rows {
            let type_name: String = row.try_get("type_name")?;
            let label: String = row.try_get("label")?;
            enums.entry(type_name).or_default().push(label);
        }
        Ok(enums)
    }

    /// Attach enum labels to a user-defined column. Non-enum user-defined
    /// columns keep their reported type.
    pub(super) fn resolve_enum(
        column: SchemaColumn,
        udt_name: &str,
        enums: &HashMap<String, Vec<String>>,
    ) -> SchemaColumn {
        if column.data_type != queries::postgres::USER_DEFINED {
            return column;
        }
        match enums.get(udt_name) {
            Some(labels) => column.with_enum(udt_name, labels.clone()),
            None => column,
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_columns(pool: &SqlitePool) -> Result<Vec<SchemaColumn>, sqlx::Error> {
        let rows = sqlx::query(queries::sqlite::LIST_COLUMNS)
            .fetch_all(pool)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let table_name: String = row.try_get("table_name")?;
            let column_name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            columns.push(SchemaColumn::new(table_name, column_name, data_type));
        }

        debug!(count = columns.len(), "Listed SQLite columns");
        Ok(columns)
    }
}

//! Shared fixtures for integration tests.
#![allow(dead_code)]

use askdb_server::db::DbPool;
use askdb_server::error::PipelineResult;
use askdb_server::llm::CompletionBackend;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const INVOICE_SCHEMA: &[&str] = &[
    r#"CREATE TABLE "Vendor" (id TEXT PRIMARY KEY, name TEXT NOT NULL, email TEXT)"#,
    r#"CREATE TABLE "Customer" (id TEXT PRIMARY KEY, name TEXT NOT NULL)"#,
    r#"CREATE TABLE "Invoice" (
        id TEXT PRIMARY KEY,
        "invoiceNumber" TEXT NOT NULL,
        "vendorId" TEXT NOT NULL REFERENCES "Vendor"(id),
        "customerId" TEXT REFERENCES "Customer"(id),
        "issueDate" TEXT NOT NULL,
        "dueDate" TEXT NOT NULL,
        "totalAmount" REAL NOT NULL,
        status TEXT NOT NULL
    )"#,
    r#"CREATE TABLE "LineItem" (id TEXT PRIMARY KEY, "invoiceId" TEXT NOT NULL, description TEXT, amount REAL)"#,
    r#"CREATE TABLE "Payment" (id TEXT PRIMARY KEY, "invoiceId" TEXT NOT NULL, amount REAL, "paidAt" TEXT)"#,
    r#"CREATE TABLE "_prisma_migrations" (id TEXT PRIMARY KEY, checksum TEXT)"#,
];

/// A file-backed SQLite database with the invoice tables, all empty.
pub struct TestDb {
    pub dir: TempDir,
    pub pool: SqlitePool,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("invoices.db"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        for statement in INVOICE_SCHEMA {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        Self { dir, pool }
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql).execute(&self.pool).await.unwrap();
    }

    pub async fn seed_invoices(&self) {
        self.exec(r#"INSERT INTO "Vendor" (id, name) VALUES ('v1', 'Acme'), ('v2', 'Globex'), ('v3', 'Initech')"#)
            .await;
        self.exec(
            r#"INSERT INTO "Invoice" VALUES
            ('i1', 'INV-001', 'v1', NULL, '2024-01-01', '2024-02-01', 100.0, 'PAID'),
            ('i2', 'INV-002', 'v1', NULL, '2024-01-05', '2024-01-20', 250.0, 'OVERDUE'),
            ('i3', 'INV-003', 'v2', NULL, '2024-01-02', '2024-01-10', 75.5, 'OVERDUE'),
            ('i4', 'INV-004', 'v3', NULL, '2024-03-01', '2024-04-01', 40.0, 'PENDING')"#,
        )
        .await;
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .unwrap();
        count == 1
    }

    pub fn db_pool(&self) -> DbPool {
        DbPool::from(self.pool.clone())
    }
}

/// Backend that always answers with the same text and counts its calls.
pub struct CannedBackend {
    reply: String,
    calls: AtomicUsize,
}

impl CannedBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn complete(&self, _prompt: &str, _temperature: f32, _max_tokens: u32) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

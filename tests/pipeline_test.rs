//! End-to-end pipeline tests against file-backed SQLite databases.

mod common;

use askdb_server::db::SchemaInspector;
use askdb_server::error::{ErrorKind, PipelineError};
use askdb_server::models::Question;
use askdb_server::pipeline::{CancelHandle, CancelToken, Pipeline, Timeouts};
use askdb_server::translate::Translator;
use common::{CannedBackend, TestDb};
use serde_json::json;
use std::sync::Arc;

fn heuristic_pipeline(db: &TestDb) -> Pipeline {
    Pipeline::new(
        db.db_pool(),
        SchemaInspector::invoice_domain(),
        Translator::heuristic(),
        Timeouts::default(),
    )
}

fn generative_pipeline(db: &TestDb, backend: Arc<CannedBackend>) -> Pipeline {
    Pipeline::new(
        db.db_pool(),
        SchemaInspector::invoice_domain(),
        Translator::generative(backend, 0.1, 512),
        Timeouts::default(),
    )
}

#[tokio::test]
async fn test_count_on_empty_invoice_table() {
    let db = TestDb::new().await;
    let pipeline = heuristic_pipeline(&db);

    let response = pipeline
        .answer(&Question::new("How many invoices are there?"), &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "sql": "SELECT COUNT(*) AS count FROM \"Invoice\";",
            "columns": ["count"],
            "rows": [[0]]
        })
    );
}

#[tokio::test]
async fn test_overdue_question_lists_overdue_invoices() {
    let db = TestDb::new().await;
    db.seed_invoices().await;
    let pipeline = heuristic_pipeline(&db);

    let response = pipeline
        .answer(&Question::new("Show me overdue invoices"), &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(
        response.columns,
        vec!["id", "invoiceNumber", "vendorId", "issueDate", "dueDate", "totalAmount", "status"]
    );
    // Ordered by due date ascending
    assert_eq!(response.rows.len(), 2);
    assert_eq!(response.rows[0][0], json!("i3"));
    assert_eq!(response.rows[1][0], json!("i2"));
    assert!(response.rows.iter().all(|r| r[6] == json!("OVERDUE")));
}

#[tokio::test]
async fn test_top_vendors_by_spend() {
    let db = TestDb::new().await;
    db.seed_invoices().await;
    let pipeline = heuristic_pipeline(&db);

    let response = pipeline
        .answer(&Question::new("Who are our top vendors?"), &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(response.columns, vec!["name", "spend"]);
    assert_eq!(
        response.rows,
        vec![
            vec![json!("Acme"), json!(350.0)],
            vec![json!("Globex"), json!(75.5)],
            vec![json!("Initech"), json!(40.0)],
        ]
    );
}

#[tokio::test]
async fn test_generated_drop_is_rejected_and_never_executed() {
    let db = TestDb::new().await;
    let backend = Arc::new(CannedBackend::new("DROP TABLE \"Invoice\";"));
    let pipeline = generative_pipeline(&db, backend.clone());

    let err = pipeline
        .answer(&Question::new("Delete everything"), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsafeQuery);
    match &err {
        PipelineError::UnsafeQuery { sql, .. } => assert_eq!(sql, "DROP TABLE \"Invoice\";"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.calls(), 1);
    assert!(db.table_exists("Invoice").await);
}

#[tokio::test]
async fn test_generated_update_without_spaces_is_rejected() {
    let db = TestDb::new().await;
    db.seed_invoices().await;
    let backend = Arc::new(CannedBackend::new(r#"UPDATE"Invoice"SET"status"='PAID'"#));
    let pipeline = generative_pipeline(&db, backend);

    let err = pipeline
        .answer(&Question::new("Mark everything paid"), &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsafeQuery);

    let paid: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "Invoice" WHERE status = 'PAID'"#)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(paid, 1);
}

#[tokio::test]
async fn test_generated_statement_is_executed_verbatim() {
    let db = TestDb::new().await;
    db.seed_invoices().await;
    let sql = "SELECT COUNT(*) AS paid FROM \"Invoice\" WHERE \"status\" = 'PAID'";
    let backend = Arc::new(CannedBackend::new(format!("  {}\n", sql)));
    let pipeline = generative_pipeline(&db, backend);

    let response = pipeline
        .answer(&Question::new("How many invoices are paid?"), &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(response.sql, sql);
    assert_eq!(response.columns, vec!["paid"]);
    assert_eq!(response.rows, vec![vec![json!(1)]]);
}

#[tokio::test]
async fn test_fenced_response_fails_in_database() {
    let db = TestDb::new().await;
    let backend = Arc::new(CannedBackend::new("```sql\nSELECT 1\n```"));
    let pipeline = generative_pipeline(&db, backend);

    let err = pipeline
        .answer(&Question::new("anything"), &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[tokio::test]
async fn test_missing_table_is_execution_error() {
    let db = TestDb::new().await;
    db.exec("DROP TABLE \"Invoice\"").await;
    let pipeline = heuristic_pipeline(&db);

    let err = pipeline
        .answer(&Question::new("How many invoices?"), &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[tokio::test]
async fn test_cancelled_request_does_nothing() {
    let db = TestDb::new().await;
    let backend = Arc::new(CannedBackend::new("SELECT 1"));
    let pipeline = generative_pipeline(&db, backend.clone());

    let handle = CancelHandle::new();
    handle.cancel();
    let err = pipeline
        .answer(&Question::new("How many invoices?"), &handle.token())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_empty_question_is_invalid_input() {
    let db = TestDb::new().await;
    let backend = Arc::new(CannedBackend::new("SELECT 1"));
    let pipeline = generative_pipeline(&db, backend.clone());

    let err = pipeline
        .answer(&Question::new(""), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_closed_pool_is_connection_error() {
    let db = TestDb::new().await;
    let pipeline = heuristic_pipeline(&db);
    pipeline.close().await;

    let err = pipeline
        .answer(&Question::new("How many invoices?"), &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

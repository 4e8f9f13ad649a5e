//! Keyword-driven fallback translator.
//!
//! Used when no backend credential is configured. Each question maps to one
//! of three fixed statements; the first matching rule wins.

use crate::models::{CandidateQuery, Question};

pub const OVERDUE_INVOICES_SQL: &str = r#"SELECT id, "invoiceNumber", "vendorId", "issueDate", "dueDate", "totalAmount", status FROM "Invoice" WHERE status = 'OVERDUE' ORDER BY "dueDate" ASC;"#;

pub const TOP_VENDORS_SQL: &str = r#"SELECT v.name, SUM(i."totalAmount") AS spend FROM "Invoice" i JOIN "Vendor" v ON v.id = i."vendorId" GROUP BY v.name ORDER BY spend DESC LIMIT 5;"#;

pub const INVOICE_COUNT_SQL: &str = r#"SELECT COUNT(*) AS count FROM "Invoice";"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTranslator;

impl HeuristicTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Pick a template for the question. Never fails.
    pub fn translate(&self, question: &Question) -> CandidateQuery {
        CandidateQuery::heuristic(select_template(question.text()))
    }
}

fn select_template(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("overdue") {
        OVERDUE_INVOICES_SQL
    } else if q.contains("top") && q.contains("vendor") {
        TOP_VENDORS_SQL
    } else {
        INVOICE_COUNT_SQL
    }
}

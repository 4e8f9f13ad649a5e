//! Prompt construction for the generative translator.

use crate::models::SchemaDescription;

const PREAMBLE: &str = r#"You are a PostgreSQL expert. Generate a SQL query based on the user's question and the schema below.

CRITICAL RULES:
1. ALL table names MUST be in double quotes: "Invoice", "Vendor", "Customer", "LineItem", "Payment"
2. ALL column names MUST be in double quotes: "id", "vendorId", "totalAmount", etc.
3. InvoiceStatus enum values are UPPERCASE: 'PENDING', 'PAID', 'OVERDUE', 'PARTIAL', 'CANCELLED'
4. Only SELECT queries - no INSERT, UPDATE, DELETE, DROP, or ALTER
5. Return ONLY the SQL query - no markdown, no explanations, no formatting"#;

const EXAMPLES: &str = r#"Examples:
- SELECT COUNT(*) FROM "Invoice" WHERE "status" = 'PAID'
- SELECT "name", SUM("totalAmount") FROM "Vendor" v JOIN "Invoice" i ON v."id" = i."vendorId" GROUP BY "name""#;

/// Build the completion prompt. The question is embedded verbatim.
pub fn build_prompt(question: &str, schema: &SchemaDescription) -> String {
    format!(
        "{PREAMBLE}\n\n{schema}\n\nQuestion: {question}\n\n{EXAMPLES}\n",
        schema = schema.render()
    )
}

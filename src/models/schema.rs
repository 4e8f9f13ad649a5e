//! Schema-related data models.
//!
//! This module defines the schema description handed to the translators and
//! its stable text rendering.

use serde::Serialize;
use std::fmt;

/// Enumerated type attached to a column, with labels in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    pub name: String,
    pub labels: Vec<String>,
}

/// One column of one table in the live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaColumn {
    pub table_name: String,
    pub column_name: String,
    /// Primitive type name as reported by the database
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_type: Option<EnumType>,
}

impl SchemaColumn {
    /// Create a column with a primitive type.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type: data_type.into(),
            enum_type: None,
        }
    }

    /// Attach an enumerated type.
    pub fn with_enum(mut self, name: impl Into<String>, labels: Vec<String>) -> Self {
        self.enum_type = Some(EnumType {
            name: name.into(),
            labels,
        });
        self
    }

    pub fn is_enum(&self) -> bool {
        self.enum_type.is_some()
    }

    pub fn enum_labels(&self) -> &[String] {
        self.enum_type
            .as_ref()
            .map(|e| e.labels.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Display for SchemaColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.enum_type {
            Some(e) => write!(
                f,
                "\"{}\".\"{}\" (enum {}: {})",
                self.table_name,
                self.column_name,
                e.name,
                e.labels.join(", ")
            ),
            None => write!(
                f,
                "\"{}\".\"{}\" ({})",
                self.table_name, self.column_name, self.data_type
            ),
        }
    }
}

/// A foreign-key edge between two columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl Relationship {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }

    /// The known foreign keys of the invoice schema.
    ///
    /// These are a fixed domain fact rather than introspected, so the list
    /// does not change when constraints are added or dropped in the database.
    pub fn invoice_domain() -> Vec<Relationship> {
        vec![
            Relationship::new("Invoice", "vendorId", "Vendor", "id"),
            Relationship::new("Invoice", "customerId", "Customer", "id"),
            Relationship::new("LineItem", "invoiceId", "Invoice", "id"),
            Relationship::new("Payment", "invoiceId", "Invoice", "id"),
        ]
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\".\"{}\" -> \"{}\".\"{}\"",
            self.from_table, self.from_column, self.to_table, self.to_column
        )
    }
}

/// Schema snapshot used to build prompts.
///
/// Columns are ordered by table name, then declaration order. The rendering
/// must stay byte-stable for an unchanged schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SchemaDescription {
    pub columns: Vec<SchemaColumn>,
    pub relationships: Vec<Relationship>,
}

impl SchemaDescription {
    pub fn new(columns: Vec<SchemaColumn>, relationships: Vec<Relationship>) -> Self {
        Self {
            columns,
            relationships,
        }
    }

    /// Distinct table names in description order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for column in &self.columns {
            if names.last() != Some(&column.table_name.as_str()) {
                names.push(&column.table_name);
            }
        }
        names
    }

    /// Render the "Tables and Columns" and "Key Relationships" text block.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.columns.len() + self.relationships.len() + 3);
        lines.push("Tables and Columns:".to_string());
        for column in &self.columns {
            lines.push(format!("  {}", column));
        }

        lines.push(String::new());
        lines.push("Key Relationships:".to_string());
        for relationship in &self.relationships {
            lines.push(format!("  {}", relationship));
        }

        lines.join("\n")
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

//! Schema introspection
//!
//! Reads table and column metadata out of the SQLite catalog and renders the
//! schema block embedded in SQL-generation prompts. Rebuilt on every call;
//! nothing is cached between requests.

use crate::error::{ChatError, Result};
use crate::history::HISTORY_TABLE;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type from PRAGMA table_info (may be empty for untyped columns)
    pub declared_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// CREATE TABLE statement as stored in sqlite_master
    pub create_sql: String,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
}

/// Enumerate user tables and their column metadata.
///
/// Internal `sqlite_*` tables and the query-history table are skipped so the
/// prompt only advertises election data. Tables come back name-sorted and
/// columns in PRAGMA order, so the result is deterministic for a fixed
/// database.
pub fn introspect(conn: &Connection) -> Result<DatabaseSchema> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1 \
         ORDER BY name",
    )?;

    let table_meta = stmt
        .query_map([HISTORY_TABLE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(table_meta.len());
    for (name, create_sql) in table_meta {
        let columns = table_columns(conn, &name)?;
        tables.push(TableSchema {
            create_sql: create_sql.unwrap_or_default(),
            name,
            columns,
        });
    }

    Ok(DatabaseSchema { tables })
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnSchema>> {
    // Table names cannot be bound as parameters in PRAGMA; quote instead.
    let mut stmt = conn.prepare(&format!(
        "PRAGMA table_info({})",
        quote_identifier(table)
    ))?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnSchema {
                name: row.get::<_, String>(1)?,
                declared_type: row.get::<_, String>(2)?,
                nullable: row.get::<_, i64>(3)? == 0,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(ChatError::Schema(format!("No columns found for table: {}", table)));
    }

    Ok(columns)
}

/// Double-quote an identifier for embedding in SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl DatabaseSchema {
    /// Render the schema as the human-readable block consumed by prompts.
    pub fn to_prompt_context(&self) -> String {
        let mut context = String::from("DATABASE SCHEMA:\n\n");
        for table in &self.tables {
            context.push_str(&format!("Table: {}\n", table.name));
            context.push_str(&format!("Creation SQL:\n{}\n\n", table.create_sql));
            context.push_str("Columns:\n");
            for column in &table.columns {
                context.push_str(&format!("- {} ({})", column.name, column.declared_type));
                if column.primary_key {
                    context.push_str(" PRIMARY KEY");
                }
                if !column.nullable {
                    context.push_str(" NOT NULL");
                }
                context.push('\n');
            }
            context.push_str("\n---\n\n");
        }
        context
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

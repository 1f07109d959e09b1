//! Query executor
//!
//! Runs a generated SQL string against SQLite and returns the full result set
//! as ordered rows with named columns. Execution errors (bad syntax, tables
//! or columns the model hallucinated) propagate as `ChatError::Sql` with the
//! backend message; nothing is corrected or retried.

use crate::error::{ChatError, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Tabular result of one query; lifetime is one interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as column→value records, the shape fed to the interpreter prompt.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn records_json(&self) -> String {
        serde_json::to_string(&self.to_records()).unwrap_or_else(|_| "[]".to_string())
    }
}

pub fn execute_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    debug!("Executing SQL: {}", sql);

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ChatError::Sql(e.to_string()))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let column_count = columns.len();

    let mut rows = stmt.query([]).map_err(|e| ChatError::Sql(e.to_string()))?;
    let mut result_rows = Vec::new();
    while let Some(row) = rows.next().map_err(|e| ChatError::Sql(e.to_string()))? {
        let mut record = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row
                .get_ref(idx)
                .map_err(|e| ChatError::Sql(e.to_string()))?;
            record.push(value_ref_to_json(value));
        }
        result_rows.push(record);
    }

    debug!("Query returned {} rows", result_rows.len());

    Ok(QueryResult {
        columns,
        rows: result_rows,
    })
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE elections_2024 (constituency TEXT, party TEXT, votes INTEGER);
             INSERT INTO elections_2024 VALUES
                 ('Pune', 'X', 100),
                 ('Nagpur', 'Y', 250),
                 ('Mumbai North', NULL, 75);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn returns_columns_and_rows_in_order() {
        let conn = seeded_connection();
        let result = execute_query(
            &conn,
            "SELECT party, votes FROM elections_2024 ORDER BY votes DESC",
        )
        .unwrap();

        assert_eq!(result.columns, vec!["party", "votes"]);
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.rows[0][0], Value::String("Y".to_string()));
        assert_eq!(result.rows[0][1], Value::Number(250.into()));
        assert_eq!(result.rows[2][0], Value::Null);
    }

    #[test]
    fn aggregate_produces_single_row() {
        let conn = seeded_connection();
        let result = execute_query(&conn, "SELECT COUNT(*) AS total FROM elections_2024").unwrap();
        assert_eq!(result.columns, vec!["total"]);
        assert_eq!(result.rows, vec![vec![Value::Number(3.into())]]);
    }

    #[test]
    fn invalid_sql_surfaces_as_sql_error_with_no_rows() {
        let conn = seeded_connection();
        let err = execute_query(&conn, "SELECT nope FROM missing_table").unwrap_err();
        assert!(matches!(err, ChatError::Sql(_)));
        assert!(err.to_string().contains("missing_table"));
    }

    #[test]
    fn records_embed_column_names() {
        let conn = seeded_connection();
        let result =
            execute_query(&conn, "SELECT party, votes FROM elections_2024 WHERE party = 'X'")
                .unwrap();
        let records = result.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["party"], Value::String("X".to_string()));
        assert_eq!(records[0]["votes"], Value::Number(100.into()));
    }
}

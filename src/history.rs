//! Query history
//!
//! Every interaction (successful, rejected, or failed) is recorded in a
//! `query_history` table in the same database file. The table is created on
//! demand and hidden from schema introspection so prompts never advertise it
//! to the model.

use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const HISTORY_TABLE: &str = "query_history";

/// Outcome of one generator → executor → interpreter interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Ok,
    Rejected,
    Error,
}

impl QueryStatus {
    fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Ok => "ok",
            QueryStatus::Rejected => "rejected",
            QueryStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub question: String,
    pub sql_text: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub row_count: Option<i64>,
    pub asked_at: String,
}

pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             question TEXT NOT NULL,
             sql_text TEXT,
             status TEXT NOT NULL,
             error TEXT,
             row_count INTEGER,
             asked_at TEXT NOT NULL
         )",
        HISTORY_TABLE
    ))?;
    Ok(())
}

pub fn record(
    conn: &Connection,
    question: &str,
    sql_text: Option<&str>,
    status: QueryStatus,
    error: Option<&str>,
    row_count: Option<usize>,
) -> Result<i64> {
    ensure_schema(conn)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (question, sql_text, status, error, row_count, asked_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            HISTORY_TABLE
        ),
        params![
            question,
            sql_text,
            status.as_str(),
            error,
            row_count.map(|n| n as i64),
            Utc::now().to_rfc3339(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Recorded query history entry {} ({})", id, status.as_str());
    Ok(id)
}

/// Most recent entries, newest first.
pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>> {
    ensure_schema(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT id, question, sql_text, status, error, row_count, asked_at \
         FROM {} ORDER BY id DESC LIMIT ?1",
        HISTORY_TABLE
    ))?;

    let entries = stmt
        .query_map([limit as i64], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                question: row.get(1)?,
                sql_text: row.get(2)?,
                status: row.get(3)?,
                error: row.get(4)?,
                row_count: row.get(5)?,
                asked_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

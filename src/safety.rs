//! Query safety gate
//!
//! Two syntactic checks run before any generated SQL reaches the database:
//!
//! 1. A case-insensitive substring scan for mutating keywords. This is a
//!    plain string match, so a keyword inside a quoted literal still trips it
//!    (known false positive, kept for parity with the blacklist contract).
//! 2. A sqlparser pass requiring exactly one statement, and that statement to
//!    be a SELECT. This catches what the blacklist cannot: ALTER, ATTACH,
//!    PRAGMA, multi-statement injection. SQL that sqlparser fails to parse is
//!    let through — SQLite itself is the authority on validity and reports
//!    the real syntax error at execution time.

use crate::error::{ChatError, Result};
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use tracing::warn;

/// Keywords refused by the substring scan, matched in any letter-casing.
pub const FORBIDDEN_KEYWORDS: [&str; 4] = ["DROP", "DELETE", "UPDATE", "INSERT"];

/// Returns the first forbidden keyword found in the SQL text, if any.
pub fn find_forbidden_keyword(sql: &str) -> Option<&'static str> {
    let upper = sql.to_uppercase();
    FORBIDDEN_KEYWORDS.iter().find(|kw| upper.contains(**kw)).copied()
}

/// Parse the statement and require a single read-only SELECT.
///
/// Unparseable SQL passes this gate; execution surfaces the real error.
pub fn ensure_read_only_select(sql: &str) -> Result<()> {
    let statements = match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => {
            warn!("Generated SQL did not parse, deferring to execution: {}", e);
            return Ok(());
        }
    };

    if statements.len() != 1 {
        return Err(ChatError::Rejected(format!(
            "Expected a single SQL statement, found {}",
            statements.len()
        )));
    }

    match &statements[0] {
        Statement::Query(_) => Ok(()),
        other => Err(ChatError::Rejected(format!(
            "Only SELECT queries are allowed, found: {}",
            statement_kind(other)
        ))),
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert { .. } => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete { .. } => "DELETE",
        Statement::Drop { .. } => "DROP",
        Statement::AlterTable { .. } => "ALTER TABLE",
        Statement::CreateTable { .. } => "CREATE TABLE",
        _ => "non-SELECT statement",
    }
}

/// Run both gates. A rejection is a user-facing validation error, not an
/// execution failure.
pub fn check_query(sql: &str) -> Result<()> {
    if let Some(keyword) = find_forbidden_keyword(sql) {
        return Err(ChatError::Rejected(format!(
            "The generated query includes a restricted operation ({}). Please modify your question.",
            keyword
        )));
    }
    ensure_read_only_select(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_each_forbidden_keyword_in_any_casing() {
        assert_eq!(find_forbidden_keyword("DROP TABLE x"), Some("DROP"));
        assert_eq!(find_forbidden_keyword("drop table x"), Some("DROP"));
        assert_eq!(find_forbidden_keyword("DeLeTe FROM x"), Some("DELETE"));
        assert_eq!(find_forbidden_keyword("update x set a = 1"), Some("UPDATE"));
        assert_eq!(find_forbidden_keyword("insert into x values (1)"), Some("INSERT"));
    }

    #[test]
    fn accepts_plain_selects() {
        assert_eq!(find_forbidden_keyword("SELECT * FROM elections_2024"), None);
        assert!(check_query("SELECT party, COUNT(*) FROM elections_2024 GROUP BY party").is_ok());
    }

    #[test]
    fn keyword_inside_string_literal_still_trips_the_scan() {
        // Documented false positive of the substring blacklist.
        let sql = "SELECT * FROM elections_2024 WHERE party = 'UPDATE Party'";
        assert_eq!(find_forbidden_keyword(sql), Some("UPDATE"));
        assert!(matches!(check_query(sql), Err(ChatError::Rejected(_))));
    }

    #[test]
    fn parser_gate_rejects_what_the_blacklist_misses() {
        assert!(matches!(
            ensure_read_only_select("ALTER TABLE elections_2024 ADD COLUMN x TEXT"),
            Err(ChatError::Rejected(_))
        ));
        assert!(matches!(
            ensure_read_only_select("SELECT 1; SELECT 2"),
            Err(ChatError::Rejected(_))
        ));
    }

    #[test]
    fn parser_gate_defers_unparseable_sql_to_execution() {
        assert!(ensure_read_only_select("SELEC party FRM elections_2024").is_ok());
    }

    #[test]
    fn rejection_message_names_the_keyword() {
        let err = check_query("DROP TABLE elections_2019").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("DROP"));
        assert!(message.contains("restricted operation"));
    }
}

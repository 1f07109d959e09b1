//! Election assistant - pipeline orchestrator
//!
//! Runs one question through generator → safety gate → executor →
//! interpreter, synchronously and to completion, opening a fresh SQLite
//! connection per interaction. Every interaction is recorded in the query
//! history, including rejections and failures.

use crate::config::AppConfig;
use crate::error::{ChatError, Result};
use crate::executor::{self, QueryResult};
use crate::generator::SqlGenerator;
use crate::history::{self, QueryStatus};
use crate::interpreter::ResultInterpreter;
use crate::llm::LlmClient;
use crate::questions::SAMPLE_QUESTIONS;
use crate::schema::{self, DatabaseSchema};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Everything one interaction produces for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub sql: String,
    pub result: QueryResult,
    pub summary: String,
}

pub struct ElectionAssistant {
    config: AppConfig,
    generator: SqlGenerator,
    interpreter: ResultInterpreter,
}

impl ElectionAssistant {
    pub fn new(config: AppConfig) -> Self {
        let llm = LlmClient::new(config.llm.clone());
        Self {
            generator: SqlGenerator::new(llm.clone()),
            interpreter: ResultInterpreter::new(llm),
            config,
        }
    }

    fn open_connection(&self) -> Result<Connection> {
        Ok(Connection::open(&self.config.db_path)?)
    }

    /// Current schema of the election tables.
    pub fn schema(&self) -> Result<DatabaseSchema> {
        let conn = self.open_connection()?;
        schema::introspect(&conn)
    }

    pub fn sample_questions(&self) -> &'static [&'static str] {
        SAMPLE_QUESTIONS
    }

    pub fn history(&self, limit: usize) -> Result<Vec<history::HistoryEntry>> {
        let conn = self.open_connection()?;
        history::recent(&conn, limit)
    }

    /// Answer one question end to end.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        info!("Question: {}", question);

        let conn = self.open_connection()?;
        let db_schema = schema::introspect(&conn)?;

        let sql = self.generator.generate(question, &db_schema).await?;

        if let Err(rejection) = crate::safety::check_query(&sql) {
            history::record(
                &conn,
                question,
                Some(&sql),
                QueryStatus::Rejected,
                Some(&rejection.to_string()),
                None,
            )?;
            return Err(rejection);
        }

        let result = match executor::execute_query(&conn, &sql) {
            Ok(result) => result,
            Err(e) => {
                error!("Query execution failed: {}", e);
                history::record(
                    &conn,
                    question,
                    Some(&sql),
                    QueryStatus::Error,
                    Some(&e.to_string()),
                    None,
                )?;
                return Err(e);
            }
        };

        let summary = self.interpreter.interpret(question, &sql, &result).await?;

        history::record(
            &conn,
            question,
            Some(&sql),
            QueryStatus::Ok,
            None,
            Some(result.row_count()),
        )?;

        Ok(Answer {
            question: question.to_string(),
            sql,
            result,
            summary,
        })
    }
}

/// Distinguish user-facing validation/execution failures (shown inline in the
/// UI) from infrastructure failures.
pub fn is_user_error(err: &ChatError) -> bool {
    matches!(err, ChatError::Rejected(_) | ChatError::Sql(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CsvSource, LlmConfig};
    use std::path::PathBuf;

    fn test_config(db_path: PathBuf) -> AppConfig {
        AppConfig {
            db_path,
            sources: Vec::<CsvSource>::new(),
            llm: LlmConfig {
                api_key: "dummy-api-key".to_string(),
                ..LlmConfig::default()
            },
            server: Default::default(),
        }
    }

    fn seeded_db(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "election_chat_assistant_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let db_path = dir.join("elections.db");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE elections_2024 (constituency TEXT, party TEXT, candidate TEXT, votes INTEGER);
             INSERT INTO elections_2024 VALUES ('Pune', 'X', 'Asha Rao', 100);",
        )
        .unwrap();
        db_path
    }

    #[tokio::test]
    async fn answers_count_question_end_to_end_with_mock_llm() {
        let db_path = seeded_db("count");
        let assistant = ElectionAssistant::new(test_config(db_path));

        let answer = assistant
            .answer("How many candidates contested in 2024?")
            .await
            .unwrap();

        assert!(answer.sql.to_uppercase().contains("SELECT"));
        assert!(answer.sql.contains("elections_2024"));
        assert_eq!(answer.result.row_count(), 1);
        assert_eq!(answer.result.rows[0][0], serde_json::json!(1));
        assert!(!answer.summary.is_empty());
    }

    #[tokio::test]
    async fn interaction_lands_in_history() {
        let db_path = seeded_db("history");
        let assistant = ElectionAssistant::new(test_config(db_path));

        assistant
            .answer("How many candidates contested in 2024?")
            .await
            .unwrap();

        let entries = assistant.history(5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, "ok");
        assert_eq!(entries[0].row_count, Some(1));
    }
}

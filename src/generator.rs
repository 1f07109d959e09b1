//! SQL generator
//!
//! Composes the generation prompt from the user question and the introspected
//! schema, asks the model, and pulls the SQL text out of the reply. The reply
//! is an untrusted string; extraction is best-effort and isolated in
//! `extract_sql` so the whole parsing strategy can be replaced without
//! touching callers. Nothing here validates that the result is SQL — validity
//! is discovered at execution time.

use crate::error::Result;
use crate::llm::LlmClient;
use crate::prompts;
use crate::schema::DatabaseSchema;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

lazy_static! {
    static ref SQL_BLOCK: Regex = Regex::new(r"(?s)```sql\s*\n(.*?)\n\s*```").unwrap();
    static ref ANY_BLOCK: Regex = Regex::new(r"(?s)```\s*\n?(.*?)\n?\s*```").unwrap();
}

pub struct SqlGenerator {
    llm: LlmClient,
}

impl SqlGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, question: &str, schema: &DatabaseSchema) -> Result<String> {
        let prompt = prompts::sql_generation_prompt(question, &schema.to_prompt_context());
        let reply = self.llm.complete(&prompt).await?;
        let sql = extract_sql(&reply);
        info!("Generated SQL: {}", sql);
        Ok(sql)
    }
}

/// Pull the SQL string out of an LLM reply.
///
/// Prefers a ```sql fenced block, falls back to any fenced block, then to the
/// trimmed raw reply.
pub fn extract_sql(reply: &str) -> String {
    if let Some(captures) = SQL_BLOCK.captures(reply) {
        return captures[1].trim().to_string();
    }
    if let Some(captures) = ANY_BLOCK.captures(reply) {
        return captures[1].trim().to_string();
    }
    reply.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sql_tagged_block() {
        let reply = "Here is the query:\n```sql\nSELECT party FROM elections_2024\n```\nDone.";
        assert_eq!(extract_sql(reply), "SELECT party FROM elections_2024");
    }

    #[test]
    fn extracts_multiline_block() {
        let reply = "```sql\nSELECT party,\n       SUM(votes) AS total\nFROM elections_2019\nGROUP BY party\n```";
        let sql = extract_sql(reply);
        assert!(sql.starts_with("SELECT party,"));
        assert!(sql.ends_with("GROUP BY party"));
    }

    #[test]
    fn falls_back_to_untagged_block() {
        let reply = "```\nSELECT 1\n```";
        assert_eq!(extract_sql(reply), "SELECT 1");
    }

    #[test]
    fn falls_back_to_raw_reply() {
        assert_eq!(
            extract_sql("  SELECT COUNT(*) FROM maha_2019  "),
            "SELECT COUNT(*) FROM maha_2019"
        );
    }
}

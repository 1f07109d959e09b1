//! Result interpreter
//!
//! Second LLM round-trip: given the original question, the SQL that ran, and
//! the serialized result rows, ask the model for a plain-language summary and
//! return its text verbatim.

use crate::error::Result;
use crate::executor::QueryResult;
use crate::llm::LlmClient;
use crate::prompts;

pub struct ResultInterpreter {
    llm: LlmClient,
}

impl ResultInterpreter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn interpret(
        &self,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> Result<String> {
        let prompt = prompts::interpretation_prompt(question, sql, &result.records_json());
        self.llm.complete(&prompt).await
    }
}

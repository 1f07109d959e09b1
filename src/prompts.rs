//! Prompt builders for the two LLM round-trips.
//!
//! Both builders are pure functions of their inputs: for a fixed question and
//! schema context the generation prompt is byte-identical across calls, which
//! keeps the pipeline reproducible under temperature-0 sampling.

/// Prompt asking the model to translate a question into a single SQL query,
/// returned as a fenced ```sql block.
pub fn sql_generation_prompt(question: &str, schema_context: &str) -> String {
    format!(
        r#"You are an expert SQL query generator that translates natural language questions into SQL queries.
The user has asked: '{}'

Here is the detailed schema of the database, including table structures:

{}

Important guidelines:
1. Use only the tables and columns shown in the schema
2. Ensure the query is read-only (no DROP, DELETE, UPDATE, or INSERT operations)
3. Use appropriate JOINs if multiple tables are needed
4. Include WHERE clauses to filter data appropriately
5. Use column names exactly as they appear in the schema

Return only the SQL query in the following format:
```sql
SELECT ...
```"#,
        question, schema_context
    )
}

/// Prompt asking the model to explain a query result to a non-technical
/// reader. Embeds the original question, the SQL that ran, and the result
/// rows serialized as JSON records.
pub fn interpretation_prompt(question: &str, sql: &str, results_json: &str) -> String {
    format!(
        r#"Original question: {}
SQL query used: {}

The query returned the following results:
{}

Please provide:
1. A clear, concise summary of the results in natural language
2. Any notable patterns or insights from the data
3. Answer the original question directly

Keep the response conversational and easy to understand for non-technical users."#,
        question, sql, results_json
    )
}

//! LLM client
//!
//! One-turn chat completions against an OpenAI-compatible endpoint (LM Studio
//! in the original deployment). Requests are sent with temperature 0 and
//! streaming enabled; the client folds the token-delta stream into a single
//! string and returns once the stream ends. Blocking from the caller's
//! perspective: no retry, no timeout, no cancellation.

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            base_url: config.base_url,
            api_key: config.api_key,
            model: config.model,
            http: reqwest::Client::new(),
        }
    }

    /// Send `prompt` as a single user message and return the concatenated
    /// completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        // Offline mock mode so the pipeline is testable without a server
        if self.api_key == "dummy-api-key" {
            return Ok(mock_completion(prompt));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.0,
            "stream": true,
        });

        let mut response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        // Fold the SSE delta stream into one string. The stream is a finite,
        // non-restartable sequence of `data: {json}` lines ending in
        // `data: [DONE]`.
        let mut content = String::new();
        let mut buffer = String::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ChatError::Llm(format!("LLM stream read failed: {}", e)))?
        {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                match parse_sse_line(line.trim()) {
                    SseEvent::Delta(delta) => content.push_str(&delta),
                    SseEvent::Done => {
                        debug!("LLM stream complete ({} chars)", content.len());
                        return Ok(content);
                    }
                    SseEvent::Skip => {}
                }
            }
        }

        // Stream ended without an explicit [DONE]; keep whatever arrived.
        if content.is_empty() {
            warn!("LLM stream ended with no content");
        }
        Ok(content)
    }
}

enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

/// Parse one server-sent-events line from the completion stream.
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    let parsed: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            warn!("Skipping malformed stream payload: {}", e);
            return SseEvent::Skip;
        }
    };

    match parsed["choices"][0]["delta"]["content"].as_str() {
        Some(delta) if !delta.is_empty() => SseEvent::Delta(delta.to_string()),
        _ => SseEvent::Skip,
    }
}

/// Canned completions keyed off prompt markers, mirroring the real reply
/// shapes. Active when the API key is `dummy-api-key`.
fn mock_completion(prompt: &str) -> String {
    if prompt.contains("SQL query generator") {
        let table = ["elections_2024", "elections_2019", "maha_2019"]
            .iter()
            .find(|t| {
                let year = t.rsplit('_').next().unwrap_or_default();
                prompt.contains(&format!("in {}", year)) || prompt.contains(&format!("in the {}", year))
            })
            .copied()
            .unwrap_or("elections_2024");

        return format!(
            "```sql\nSELECT COUNT(*) AS total_candidates FROM {}\n```",
            table
        );
    }

    if prompt.contains("Original question:") {
        return "The query returned a single aggregate figure. In short, the data directly \
                answers the question asked, with no unusual patterns in the result."
            .to_string();
    }

    "OK".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn mock_client() -> LlmClient {
        LlmClient::new(LlmConfig {
            base_url: "http://localhost:1234/v1".to_string(),
            api_key: "dummy-api-key".to_string(),
            model: "test-model".to_string(),
        })
    }

    #[tokio::test]
    async fn mock_mode_answers_generation_prompts_with_fenced_sql() {
        let client = mock_client();
        let prompt = crate::prompts::sql_generation_prompt(
            "How many candidates contested in 2024?",
            "Table: elections_2024",
        );
        let reply = client.complete(&prompt).await.unwrap();
        assert!(reply.contains("```sql"));
        assert!(reply.contains("elections_2024"));
    }

    #[tokio::test]
    async fn mock_mode_answers_interpretation_prompts_with_text() {
        let client = mock_client();
        let prompt = crate::prompts::interpretation_prompt(
            "How many candidates contested in 2024?",
            "SELECT COUNT(*) FROM elections_2024",
            r#"[{"total": 1}]"#,
        );
        let reply = client.complete(&prompt).await.unwrap();
        assert!(!reply.is_empty());
    }

    #[test]
    fn sse_parser_extracts_deltas_and_done() {
        assert!(matches!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"SELECT"}}]}"#),
            SseEvent::Delta(ref s) if s == "SELECT"
        ));
        assert!(matches!(parse_sse_line("data: [DONE]"), SseEvent::Done));
        assert!(matches!(parse_sse_line(""), SseEvent::Skip));
        assert!(matches!(
            parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            SseEvent::Skip
        ));
        // Empty deltas are dropped, not appended
        assert!(matches!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            SseEvent::Skip
        ));
    }
}

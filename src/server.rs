//! HTTP server for the chatbot UI
//!
//! Simple HTTP server using tokio and basic HTTP handling: one spawned task
//! per connection, hand-parsed request line and headers, JSON responses. The
//! single-page UI is embedded in the binary and served from `/`; everything
//! else is a small JSON API driving the question pipeline.

use crate::assistant::{is_user_error, ElectionAssistant};
use crate::config::AppConfig;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let assistant = Arc::new(ElectionAssistant::new(config));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        info!("New connection from {}", peer);
        let assistant = assistant.clone();
        tokio::spawn(async move {
            handle_connection(stream, assistant).await;
        });
    }
}

async fn handle_connection(mut stream: TcpStream, assistant: Arc<ElectionAssistant>) {
    use tokio::time::{timeout, Duration};

    // Read request with timeout to prevent hanging
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n") {
                            match extract_content_length(s) {
                                Some(content_length) => {
                                    if buffer.len() >= headers_end + 4 + content_length {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                    // Cap request size
                    if buffer.len() > 1_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stream: {}", e);
                    return;
                }
            }
        }
    })
    .await;

    if read_result.is_err() {
        warn!("Request read timeout");
        return;
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request, &assistant).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to parse request as UTF-8: {}", e);
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

async fn handle_request(request: &str, assistant: &ElectionAssistant) -> String {
    let request_line = request.lines().next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() < 2 {
        return create_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let full_path = parts[1];

    // Normalize path (drop query string and trailing slash)
    let path_str = full_path.split('?').next().unwrap_or(full_path);
    let mut path = path_str.trim_end_matches('/');
    if path.is_empty() {
        path = "/";
    }

    match (method, path) {
        ("OPTIONS", _) => create_response(204, "No Content", ""),
        ("GET", "/") => create_html_response(INDEX_HTML),
        ("GET", "/api/health") => {
            create_response(200, "OK", r#"{"status":"ok","service":"election-chat-api"}"#)
        }
        ("GET", "/api/questions") => {
            let body = serde_json::json!({ "questions": assistant.sample_questions() });
            create_response(200, "OK", &body.to_string())
        }
        ("GET", "/api/schema") => match assistant.schema() {
            Ok(schema) => {
                let body = serde_json::to_string(&schema)
                    .unwrap_or_else(|_| r#"{"tables":[]}"#.to_string());
                create_response(200, "OK", &body)
            }
            Err(e) => {
                error!("Schema introspection failed: {}", e);
                create_response(500, "Internal Server Error", &error_body(&e.to_string()))
            }
        },
        ("GET", "/api/history") => match assistant.history(20) {
            Ok(entries) => {
                let body = serde_json::json!({ "history": entries });
                create_response(200, "OK", &body.to_string())
            }
            Err(e) => create_response(500, "Internal Server Error", &error_body(&e.to_string())),
        },
        ("POST", "/api/ask") => handle_ask(request, assistant).await,
        _ => create_response(404, "Not Found", r#"{"error":"Not found"}"#),
    }
}

async fn handle_ask(request: &str, assistant: &ElectionAssistant) -> String {
    #[derive(Deserialize)]
    struct AskRequest {
        question: Option<String>,
    }

    let body_start = request.find("\r\n\r\n").unwrap_or(request.len());
    let body = request[body_start..].trim();

    let json_str = if body.starts_with('{') {
        body
    } else if let Some(json_start) = body.find('{') {
        &body[json_start..]
    } else {
        ""
    };

    if json_str.is_empty() {
        return create_response(400, "Bad Request", r#"{"error":"JSON body required"}"#);
    }

    let question = match serde_json::from_str::<AskRequest>(json_str) {
        Ok(AskRequest {
            question: Some(question),
        }) if !question.trim().is_empty() => question,
        Ok(_) => {
            return create_response(
                400,
                "Bad Request",
                r#"{"error":"Field 'question' is required and cannot be empty"}"#,
            );
        }
        Err(e) => {
            return create_response(400, "Bad Request", &error_body(&format!("Invalid JSON: {}", e)));
        }
    };

    match assistant.answer(question.trim()).await {
        Ok(answer) => {
            let body = serde_json::json!({
                "question": answer.question,
                "sql": answer.sql,
                "columns": answer.result.columns,
                "rows": answer.result.rows,
                "row_count": answer.result.row_count(),
                "summary": answer.summary,
            });
            create_response(200, "OK", &body.to_string())
        }
        // Rejections and SQL failures render inline in the UI
        Err(e) if is_user_error(&e) => create_response(400, "Bad Request", &error_body(&e.to_string())),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            create_response(500, "Internal Server Error", &error_body(&e.to_string()))
        }
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}

fn create_html_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_extraction() {
        let request = "POST /api/ask HTTP/1.1\r\nContent-Length: 42\r\n\r\n";
        assert_eq!(extract_content_length(request), Some(42));
        assert_eq!(extract_content_length("GET / HTTP/1.1\r\n\r\n"), None);
    }

    #[test]
    fn response_carries_content_length() {
        let response = create_response(200, "OK", r#"{"status":"ok"}"#);
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Length: 15\r\n"));
        assert!(response.ends_with(r#"{"status":"ok"}"#));
    }
}

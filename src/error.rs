use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("SQL execution error: {0}")]
    Sql(String),

    #[error("Query rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;

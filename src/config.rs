//! Application configuration
//!
//! All endpoint/model/path settings live in one explicit config object that
//! is constructed once in main and passed to each component, so tests can
//! substitute the LLM endpoint or database path without touching globals.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One CSV file to be materialized as a SQLite table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSource {
    /// Target table name in the database
    pub table: String,

    /// Path to the CSV file
    pub path: PathBuf,
}

/// LLM endpoint configuration (OpenAI-compatible chat completions API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    /// Model identifier; LM Studio accepts a local model path here
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            api_key: "lm-studio".to_string(),
            model: "lmstudio-community/gemma-2-2b-it-GGUF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,

    /// CSV files loaded into the database by the `load` command
    pub sources: Vec<CsvSource>,

    pub llm: LlmConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("database/elections.db"),
            sources: vec![
                CsvSource {
                    table: "elections_2019".to_string(),
                    path: PathBuf::from("data/final/final_details_of_assembly_segment_2019.csv"),
                },
                CsvSource {
                    table: "elections_2024".to_string(),
                    path: PathBuf::from("data/final/final_eci_data_2024.csv"),
                },
                CsvSource {
                    table: "maha_2019".to_string(),
                    path: PathBuf::from("data/final/final_maha_results_2019.csv"),
                },
            ],
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables, falling back to defaults.
    /// Call `dotenv::dotenv().ok()` before this to pick up a .env file.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(db_path) = std::env::var("ELECTION_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Ok(api_key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = api_key;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_election_tables() {
        let config = AppConfig::default();
        let tables: Vec<&str> = config.sources.iter().map(|s| s.table.as_str()).collect();
        assert_eq!(tables, vec!["elections_2019", "elections_2024", "maha_2019"]);
        assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
    }
}

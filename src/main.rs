use anyhow::Result;
use clap::{Parser, Subcommand};
use election_chat::assistant::ElectionAssistant;
use election_chat::config::AppConfig;
use election_chat::loader::DataLoader;
use election_chat::server;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "election-chat")]
#[command(about = "Natural-language chatbot over the election results database")]
struct Args {
    /// Path to the SQLite database file (overrides ELECTION_DB_PATH)
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,

    /// LLM endpoint base URL (overrides LLM_BASE_URL)
    #[arg(long)]
    llm_base_url: Option<String>,

    /// Model identifier passed to the endpoint (overrides LLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the election CSV files into SQLite, replacing existing tables
    Load,

    /// Start the chatbot web UI
    Serve {
        /// Port to listen on (overrides SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single question on the command line
    Ask {
        /// The question in natural language
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    if let Some(base_url) = args.llm_base_url {
        config.llm.base_url = base_url;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    match args.command {
        Command::Load => {
            let loader = DataLoader::new(&config.db_path, config.sources.clone());
            match loader.load_all() {
                Ok(()) => {
                    info!("Success!");
                }
                Err(e) => {
                    error!("An error occurred: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::run(config).await?;
        }
        Command::Ask { question } => {
            let assistant = ElectionAssistant::new(config);
            match assistant.answer(&question).await {
                Ok(answer) => {
                    println!("\nGenerated SQL query:\n{}\n", answer.sql);
                    println!("{}", render_table(&answer));
                    println!("Summary of Results:\n{}", answer.summary);
                }
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn render_table(answer: &election_chat::assistant::Answer) -> String {
    let mut out = String::new();
    out.push_str(&answer.result.columns.join(" | "));
    out.push('\n');
    out.push_str(&"-".repeat(answer.result.columns.join(" | ").len().max(8)));
    out.push('\n');
    for row in &answer.result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out
}

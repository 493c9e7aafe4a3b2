use semantic_analyst::analysis::{compile, AnalysisRequest};
use semantic_analyst::config::{ConnectionConfig, PlannerConfig};
use semantic_analyst::db::{connector_for, StorageConnector};
use semantic_analyst::semantic::{MetadataConfig, SemanticLayer};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semantic-analyst")]
#[command(about = "Answer business questions from semantic metadata over a relational store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the query plan for a business question (no database needed)
    Plan {
        /// The business question
        question: String,

        /// Path to metadata JSON file
        #[arg(short, long, default_value = "metadata.json")]
        metadata: PathBuf,
    },
    /// Show the generated query text for a question or request (no database needed)
    Sql {
        /// The business question
        #[arg(short, long, conflicts_with = "request")]
        question: Option<String>,

        /// Analysis request as JSON, or @path to a JSON file
        #[arg(short, long)]
        request: Option<String>,

        /// Path to metadata JSON file
        #[arg(short, long, default_value = "metadata.json")]
        metadata: PathBuf,
    },
    /// Run an analysis against the configured database
    Analyze {
        /// The business question
        #[arg(short, long, conflicts_with = "request")]
        question: Option<String>,

        /// Analysis request as JSON, or @path to a JSON file
        #[arg(short, long)]
        request: Option<String>,

        /// Path to metadata JSON file
        #[arg(short, long, default_value = "metadata.json")]
        metadata: PathBuf,
    },
    /// List tables in the configured schema
    Tables,
    /// Show the catalog schema of one table
    Schema {
        /// Table name
        table: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("semantic_analyst=info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Plan { question, metadata } => {
            let layer = load_layer(&metadata)?;
            let plan = layer.analyze_business_question(&question)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Sql { question, request, metadata } => {
            let layer = load_layer(&metadata)?;
            let request = build_request(question, request)?;
            let compiled = compile(&layer, &request)?;
            println!("{}", serde_json::to_string_pretty(&compiled)?);
        }
        Commands::Analyze { question, request, metadata } => {
            let layer = load_layer(&metadata)?;
            let request = build_request(question, request)?;
            let mut connector = connect(Arc::new(layer)).await?;
            let result = connector.analyze(&request).await;
            connector.disconnect().await?;
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
        Commands::Tables => {
            let mut connector = connect(Arc::new(SemanticLayer::new())).await?;
            let tables = connector.list_tables().await;
            connector.disconnect().await?;
            for table in tables? {
                println!("{}", table);
            }
        }
        Commands::Schema { table } => {
            let mut connector = connect(Arc::new(SemanticLayer::new())).await?;
            let schema = connector.get_table_schema(&table).await;
            connector.disconnect().await?;
            println!("{}", serde_json::to_string_pretty(&schema?)?);
        }
    }

    Ok(())
}

fn load_layer(path: &Path) -> Result<SemanticLayer> {
    let planner = PlannerConfig::from_env()?;
    let config = MetadataConfig::load(path)
        .with_context(|| format!("Failed to load metadata from {:?}", path))?;
    Ok(SemanticLayer::from_config(config).with_policy(planner.disconnected_joins))
}

fn build_request(question: Option<String>, request: Option<String>) -> Result<AnalysisRequest> {
    if let Some(question) = question {
        return Ok(AnalysisRequest::business(question));
    }
    let raw = request.context("Either --question or --request is required")?;
    let json = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path))?,
        None => raw,
    };
    serde_json::from_str(&json).context("Invalid analysis request JSON")
}

async fn connect(layer: Arc<SemanticLayer>) -> Result<Box<dyn StorageConnector>> {
    let config = ConnectionConfig::from_env()?;
    info!("Connecting to {} database", config.kind.as_str());
    let mut connector = connector_for(config, layer);
    connector.connect().await?;
    Ok(connector)
}

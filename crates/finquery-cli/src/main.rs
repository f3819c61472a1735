use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use finquery_gateway::{AppState, GatewayServer};
use finquery_ingest::{ChunkingConfig, Ingestor, PdfDirectorySource};
use finquery_model::{CompletionClient, EmbeddingClient, ModelConfig, OpenAiClient};
use finquery_rag::{AnswerComposer, Retriever};
use finquery_store::{FileContentStore, StorePool};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finquery", about = "FinQuery — document QA over a financial corpus")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "finquery.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one ingestion pass over the document directory
    Ingest,
    /// Answer a single question from the stored corpus
    Ask {
        /// The question to answer
        question: String,
    },
}

#[derive(Deserialize)]
struct FinQueryConfig {
    /// Absent model table means degraded mode: retrieval-only answers.
    model: Option<ModelConfig>,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    ingest: IngestConfig,
    #[serde(default)]
    server: ServerConfig,
}

#[derive(Deserialize)]
struct StoreConfig {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_pool_size")]
    pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Deserialize)]
struct IngestConfig {
    #[serde(default = "default_docs_dir")]
    docs_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_overlap")]
    overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_pool_size() -> usize {
    8
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("./data/documents")
}
fn default_chunk_size() -> usize {
    800
}
fn default_overlap() -> usize {
    200
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

/// Wired pipeline components over one shared store pool.
struct Pipeline {
    retriever: Retriever,
    composer: AnswerComposer,
    ingestor: Arc<Ingestor>,
}

async fn build_pipeline(config: &FinQueryConfig) -> anyhow::Result<Pipeline> {
    let store = FileContentStore::new(config.store.data_dir.join("chunks.jsonl")).await?;
    let pool = Arc::new(StorePool::new(Arc::new(store), config.store.pool_size));

    let (embedder, completion): (
        Option<Arc<dyn EmbeddingClient>>,
        Option<Arc<dyn CompletionClient>>,
    ) = match &config.model {
        Some(model_config) => {
            let client = Arc::new(OpenAiClient::new(model_config.clone())?);
            info!(model = %model_config.model_id, "Language model configured");
            (Some(Arc::clone(&client) as _), Some(client as _))
        }
        None => {
            info!("No language model configured — running in degraded mode");
            (None, None)
        }
    };

    let chunking = ChunkingConfig::new(config.ingest.chunk_size, config.ingest.overlap)?;
    let source = Arc::new(PdfDirectorySource::new(config.ingest.docs_dir.clone()));

    let retriever = Retriever::new(Arc::clone(&pool), embedder.clone());
    let composer = AnswerComposer::new(retriever.clone(), completion);
    let ingestor = Arc::new(Ingestor::new(source, pool, embedder, chunking));

    Ok(Pipeline {
        retriever,
        composer,
        ingestor,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config: FinQueryConfig = if cli.config.exists() {
        let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", cli.config.display(), e)
        })?;
        toml::from_str(&config_str)?
    } else {
        // No config file: defaults everywhere, degraded mode.
        FinQueryConfig {
            model: None,
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            server: ServerConfig::default(),
        }
    };

    let pipeline = build_pipeline(&config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let state = Arc::new(AppState {
                retriever: pipeline.retriever,
                composer: pipeline.composer,
                ingestor: pipeline.ingestor,
            });
            let app = GatewayServer::build(state);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("FinQuery gateway listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Ingest => {
            let report = pipeline.ingestor.run().await?;
            println!("{}", report.message);
        }
        Commands::Ask { question } => {
            let composed = pipeline.composer.compose(&question).await?;
            println!("{}", composed.answer);
            if !composed.context.is_empty() {
                println!("\nContext:");
                for (i, chunk) in composed.context.iter().enumerate() {
                    println!("[{}] {}", i + 1, chunk);
                }
            }
            if !composed.model_used {
                println!("\n(model disabled — showing retrieved context only)");
            }
        }
    }

    Ok(())
}

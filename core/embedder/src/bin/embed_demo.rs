/// Embedding demo - embeds sample sentences through GitHub Copilot via the LLM router
///
/// Usage:
///   cargo run --bin embed-demo [--model <model>] [--dims <n>]
///
/// Environment:
///   EMBEDDING_ROUTER_URL: router base URL (defaults to http://localhost:4000)
///   EMBEDDING_ROUTER_API_KEY: optional bearer token for the router itself

use anyhow::{Context, Result};
use clap::Parser;
use copilot_embedder::{CopilotEmbedding, EmbeddingOutput, RouterBackend, RouterConfig};
use copilot_embedder_schemas::EmbedderConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "embed-demo")]
#[command(about = "Embed sample sentences with GitHub Copilot's text-embedding-3-small")]
struct Args {
    /// Embedding model routed by the LLM router
    #[arg(long)]
    model: Option<String>,

    /// Requested embedding dimensions
    #[arg(long)]
    dims: Option<usize>,
}

const SAMPLES: [&str; 3] = [
    "The quick brown fox jumps over the lazy dog",
    "Machine learning is a subset of artificial intelligence",
    "Python is a versatile programming language",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let router_config = RouterConfig::from_env()?;
    info!("Router: {}", router_config.base_url);

    let mut config = EmbedderConfig::from_env()?;
    if args.model.is_some() {
        config.model = args.model;
    }
    if args.dims.is_some() {
        config.embedding_dims = args.dims;
    }

    let embedder = CopilotEmbedding::new(Box::new(RouterBackend::new(router_config)?), Some(config));

    let batch = embedder
        .embed_batch(&SAMPLES, None)
        .await
        .context("Batch embedding failed")?;

    println!("Embedding response:");
    println!("Model: {}", batch.model.as_deref().unwrap_or("unknown"));
    println!("Number of embeddings: {}", batch.len());

    if let Some(first) = batch.first() {
        describe(first);
    }
    if let Some(index) = batch.first_index() {
        println!("Embedding index: {}", index);
    }
    if let Some(total_tokens) = batch.total_tokens {
        println!("Usage tokens: {}", total_tokens);
    }

    let single = embedder
        .embed("This is a single text for embedding", None)
        .await
        .context("Single embedding failed")?;

    println!("\nSingle text embedding:");
    match single {
        EmbeddingOutput::Vector(vector) => println!("Embedding dimensions: {}", vector.len()),
        EmbeddingOutput::Passthrough(value) => println!("Unrecognized embedding: {}", value),
    }

    Ok(())
}

fn describe(first: &EmbeddingOutput) {
    match first {
        EmbeddingOutput::Vector(vector) => {
            println!("First embedding dimensions: {}", vector.len());
            let preview: Vec<f32> = vector.iter().take(5).copied().collect();
            println!("First few values: {:?}", preview);
        }
        EmbeddingOutput::Passthrough(value) => {
            println!("First embedding was not numeric: {}", value);
        }
    }
}

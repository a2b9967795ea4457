/// Memory demo - adds a short conversation to an in-memory index embedded by
/// GitHub Copilot, then searches it and lists everything stored.
///
/// Usage:
///   cargo run --bin memory-demo [--user-id <id>]

use anyhow::{Context, Result};
use clap::Parser;
use copilot_embedder::{CopilotEmbedding, InMemoryVectorStore, MemoryIndex, RouterBackend, RouterConfig};
use copilot_embedder_schemas::EmbedderProviderConfig;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memory-demo")]
#[command(about = "Exercise the Copilot embedder through add, search and list")]
struct Args {
    /// User the demo memories are attributed to
    #[arg(long, default_value = "github_copilot_developer")]
    user_id: String,
}

const CONVERSATION: [(&str, &str); 5] = [
    ("user", "I'm a developer who loves using GitHub Copilot for coding assistance."),
    ("assistant", "That's great! GitHub Copilot is an excellent AI pair programming tool."),
    ("user", "I primarily work with Python, TypeScript, and use VS Code as my editor."),
    ("assistant", "Perfect combination! VS Code with GitHub Copilot support makes development much more efficient."),
    ("user", "I'm building applications that integrate AI and memory systems."),
];

const QUERIES: [&str; 2] = [
    "What programming languages and tools does this developer use?",
    "What kind of applications is the user building?",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args).await {
        error!("Memory demo failed: {:#}", e);
        return Err(e);
    }

    info!("Memory demo completed");
    Ok(())
}

async fn run(args: &Args) -> Result<()> {
    let block: EmbedderProviderConfig = serde_json::from_value(json!({
        "provider": "github_copilot",
        "config": {
            "model": "github_copilot/text-embedding-3-small",
            "embedding_dims": 1536
        }
    }))?;

    let backend = RouterBackend::new(RouterConfig::from_env()?)?;
    let embedder = CopilotEmbedding::from_provider_config(Box::new(backend), &block)?;
    let dims = embedder.settings().embedding_dims();

    let mut index = MemoryIndex::new(
        Box::new(embedder),
        Box::new(InMemoryVectorStore::with_dimensions(dims)),
    );

    info!("Adding user messages from the test conversation");
    for (role, content) in CONVERSATION.iter().filter(|(role, _)| *role == "user") {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), args.user_id.clone());
        metadata.insert("role".to_string(), role.to_string());
        metadata.insert("source".to_string(), "github_copilot_integration".to_string());

        let id = index
            .add(content, metadata)
            .await
            .with_context(|| format!("Failed to add memory: {}", content))?;
        println!("Added memory {}: {}", id, content);
    }

    for query in QUERIES {
        let results = index.search(query, 3).await.context("Memory search failed")?;
        println!("\nSearch: {}", query);
        for hit in results {
            println!("  {:.3}  {}", hit.score, hit.memory.text);
        }
    }

    let all = index.get_all();
    println!("\nAll memories ({}):", all.len());
    for memory in all {
        println!("  {} {}", memory.id, memory.text);
    }

    Ok(())
}

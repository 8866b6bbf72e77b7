//! # TroLySo — public-service chat assistant
//!
//! Usage:
//!   trolyso serve                          # Start the Messenger gateway (default port 3000)
//!   trolyso serve --port 8080 -v           # Custom port, debug logging
//!   trolyso index guide.txt                # Chunk a document and print index stats
//!   trolyso search guide.txt "đăng ký VNeID" -k 5
//!   trolyso chapters guide.txt             # List chapter labels

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use trolyso_core::config::TroLySoConfig;
use trolyso_knowledge::KnowledgeBase;

#[derive(Parser)]
#[command(
    name = "trolyso",
    version,
    about = "🇻🇳 TroLySo — document-grounded public-service assistant"
)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway (webhook, diagnostics, knowledge API)
    Serve {
        /// Config file (default: $TROLYSO_CONFIG or ~/.trolyso/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen port, overrides config and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chunk a document and print index statistics
    Index {
        file: PathBuf,
    },
    /// Rank a document's chunks against a query
    Search {
        file: PathBuf,
        query: String,
        /// Number of results
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,
    },
    /// List the chapter labels of a document
    Chapters {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let filter = if cli.verbose {
        "trolyso=debug,tower_http=debug"
    } else {
        "trolyso=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve { config, port } => {
            let mut config = load_config(config)?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            tracing::info!(
                "🇻🇳 {} v{} starting (model: {})",
                config.identity.name,
                env!("CARGO_PKG_VERSION"),
                config.llm.model
            );
            trolyso_gateway::start(config).await
        }
        Command::Index { file } => {
            let kb = open_document(file).await?;
            let stats = kb.stats();
            println!("📚 {}", stats.source.as_deref().unwrap_or("-"));
            println!("   Chunks:          {}", stats.chunk_count);
            println!("   Chapters:        {}", stats.chapter_count);
            println!("   Chapter intros:  {}", stats.chapter_intros);
            println!("   Section headers: {}", stats.section_headers);
            println!("   Content chunks:  {}", stats.contents);
            println!(
                "   Chars min/avg/max: {}/{:.0}/{}",
                stats.min_chars, stats.avg_chars, stats.max_chars
            );
            Ok(())
        }
        Command::Search { file, query, top_k } => {
            let kb = open_document(file).await?;
            let results = kb.search(&query, top_k);
            if results.is_empty() {
                println!("🔍 No chunk matches \"{query}\"");
            }
            for (i, hit) in results.iter().enumerate() {
                println!(
                    "{}. [{:.1}] {} / {} ({})",
                    i + 1,
                    hit.score,
                    hit.chunk.chapter_label,
                    hit.chunk.section_label,
                    hit.chunk.kind.as_str()
                );
                println!("   {}", excerpt(&hit.chunk.content, 160));
            }
            Ok(())
        }
        Command::Chapters { file } => {
            let kb = open_document(file).await?;
            for chapter in kb.chapters() {
                println!("{chapter}");
            }
            Ok(())
        }
    }
}

/// Explicit `--config` path, else the default lookup. Env overrides apply to both.
fn load_config(path: Option<PathBuf>) -> Result<TroLySoConfig> {
    match path {
        Some(path) => {
            let mut config = TroLySoConfig::load_from(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => Ok(TroLySoConfig::load()?),
    }
}

async fn open_document(file: PathBuf) -> Result<KnowledgeBase> {
    let kb = KnowledgeBase::with_source(file);
    kb.reload().await?;
    Ok(kb)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

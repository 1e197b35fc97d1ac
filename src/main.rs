use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rstfidf::api::create_router;
use rstfidf::document::absolute_path;
use rstfidf::{Document, SearchEngine, StoreConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "TF-IDF full-text search over local files", long_about = None)]
struct Args {
    /// Path of the statistics database
    #[arg(long, env = "RSTFIDF_DB", default_value = rstfidf::config::DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Key namespace inside the database
    #[arg(long, env = "RSTFIDF_NAMESPACE", default_value = rstfidf::storage::DEFAULT_NAMESPACE)]
    namespace: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index files, identified by their absolute path
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove a file from the index
    Del { path: PathBuf },
    /// Rank indexed files against a query
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show corpus statistics
    Stats,
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        bind: String,
    },
}

fn add(engine: &SearchEngine, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let doc = Document::from_path(path)?;
        engine
            .index(&doc)
            .with_context(|| format!("failed to index {}", doc.id))?;
        println!("indexed {}", doc.id);
    }
    engine.flush()?;
    Ok(())
}

fn del(engine: &SearchEngine, path: &Path) -> Result<()> {
    let doc_id = absolute_path(path).with_context(|| format!("invalid path {}", path.display()))?;
    engine.remove_document(&doc_id.to_string_lossy())?;
    Ok(())
}

fn search(engine: &SearchEngine, query: &str, limit: Option<usize>) -> Result<()> {
    for hit in engine.search_limited(query, limit)? {
        println!("({:?}, {})", hit.doc_id, hit.score);
    }
    Ok(())
}

async fn serve(engine: SearchEngine, bind: &str) -> Result<()> {
    let app = create_router(Arc::new(engine)).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = StoreConfig::new(&args.db, &args.namespace);
    let engine = SearchEngine::open(&config)
        .with_context(|| format!("failed to open {}", args.db.display()))?;

    match args.command {
        Command::Add { paths } => add(&engine, &paths),
        Command::Del { path } => del(&engine, &path),
        Command::Search { query, limit } => search(&engine, &query, limit),
        Command::Stats => {
            println!("documents: {}", engine.stats()?.documents);
            Ok(())
        }
        Command::Serve { bind } => serve(engine, &bind).await,
    }
}

// Re-export main components
pub mod api;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod ranking;
pub mod storage;
pub mod tokenizer;

// Re-export commonly used types
pub use config::StoreConfig;
pub use document::Document;
pub use engine::{IndexStats, SearchEngine};
pub use error::{Error, Result};
pub use index::Indexer;
pub use ranking::SearchHit;
pub use storage::{MemoryStore, SledStore, StatsStore, WriteBatch};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_workflow() -> Result<()> {
        let engine = SearchEngine::in_memory()?;

        engine.index(&Document::new(
            "/docs/rust.txt",
            "Rust is a blazingly fast and memory-efficient language",
        ))?;
        engine.index(&Document::new(
            "/docs/go.txt",
            "Go is a simple language with garbage collection",
        ))?;

        let results = engine.search("fast languages")?;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, "/docs/rust.txt");
        assert!(results[0].score > 0.0);

        Ok(())
    }
}

use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::index::Indexer;
use crate::ranking::{rank_documents, SearchHit};
use crate::storage::{SledStore, StatsStore};
use crate::tokenizer::Tokenizer;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Corpus-wide figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub documents: u64,
}

/// Main search engine: the indexer and the query engine over one store.
pub struct SearchEngine<S: StatsStore = SledStore> {
    store: S,
    tokenizer: Tokenizer,
}

impl SearchEngine<SledStore> {
    /// Open the sled database described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(config.open()?))
    }

    /// Engine over a temporary sled database (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::open(&StoreConfig::temporary())
    }
}

impl<S: StatsStore> SearchEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tokenizer: Tokenizer::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index a new document. See [`Indexer::index_document`].
    pub fn index_document(&self, doc_id: &str, text: &str) -> Result<()> {
        Indexer::new(&self.store, &self.tokenizer).index_document(doc_id, text)
    }

    pub fn index(&self, doc: &Document) -> Result<()> {
        self.index_document(&doc.id, &doc.text)
    }

    /// Removal has no algorithm yet: counters would have to be recomputed.
    /// Always fails without touching the store.
    pub fn remove_document(&self, doc_id: &str) -> Result<()> {
        Err(Error::UnsupportedOperation(format!(
            "removing document '{doc_id}' is not implemented"
        )))
    }

    /// Remove-then-add, which fails at the removal step.
    pub fn update_document(&self, doc_id: &str, text: &str) -> Result<()> {
        self.remove_document(doc_id)?;
        self.index_document(doc_id, text)
    }

    /// Rank the documents containing every query term.
    ///
    /// Fails with `EmptyCorpus` before anything is indexed. A query term the
    /// store has never seen yields an empty list rather than an error.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let terms = self.tokenizer.tokenize(query);
        let mut distinct = terms.clone();
        distinct.sort();
        distinct.dedup();

        let candidates = self.store.intersect_postings(&distinct)?;

        let document_count = self.store.document_count()?;
        if document_count == 0 {
            return Err(Error::EmptyCorpus);
        }

        if distinct.is_empty() {
            debug!(query, "query has no terms");
            return Ok(Vec::new());
        }

        let document_frequencies = match self.store.document_frequencies(&distinct) {
            Ok(dfs) => dfs,
            Err(Error::UnknownTerm(term)) => {
                warn!(query, term = %term, "query term was never indexed");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        if candidates.is_empty() {
            debug!(query, "no document contains every query term");
            return Ok(Vec::new());
        }

        let candidates: Vec<String> = candidates.into_iter().collect();
        let term_frequencies = self.store.term_frequencies(&distinct, &candidates)?;

        let ranked = rank_documents(
            &terms,
            &candidates,
            &term_frequencies,
            &document_frequencies,
            document_count,
        );

        info!(query, hits = ranked.len(), "search finished");
        Ok(ranked)
    }

    /// Like [`search`](Self::search), keeping at most `limit` results.
    pub fn search_limited(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchHit>> {
        let mut ranked = self.search(query)?;
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }

    pub fn document_count(&self) -> Result<u64> {
        self.store.document_count()
    }

    pub fn is_indexed(&self, doc_id: &str) -> Result<bool> {
        self.store.is_document_registered(doc_id)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            documents: self.store.document_count()?,
        })
    }

    /// Flush all changes to disk
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}

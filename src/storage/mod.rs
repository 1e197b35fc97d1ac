//! Statistics store: the only persistent state of the engine.
//!
//! Everything the indexer writes and the query engine reads goes through the
//! [`StatsStore`] trait. Writes are grouped into a [`WriteBatch`] that a store
//! applies all-or-nothing, so readers never see half of a document.

mod disk;
mod memory;

pub use disk::SledStore;
pub use memory::MemoryStore;

use crate::error::Result;
use std::collections::{BTreeSet, HashMap};

/// Default logical prefix separating this engine's keys from other data.
pub const DEFAULT_NAMESPACE: &str = "tf-idf";

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Abort the whole batch if the document is already registered.
    RequireUnregistered(String),
    /// Add to the registry, bumping the document count only for new ids.
    RegisterDocument(String),
    SetTermFrequency {
        term: String,
        doc_id: String,
        value: f64,
    },
    AddToPostings {
        term: String,
        doc_id: String,
    },
    IncrementDocumentFrequency(String),
}

/// Ordered list of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_unregistered(&mut self, doc_id: &str) -> &mut Self {
        self.ops.push(WriteOp::RequireUnregistered(doc_id.to_string()));
        self
    }

    pub fn register_document(&mut self, doc_id: &str) -> &mut Self {
        self.ops.push(WriteOp::RegisterDocument(doc_id.to_string()));
        self
    }

    pub fn set_term_frequency(&mut self, term: &str, doc_id: &str, value: f64) -> &mut Self {
        self.ops.push(WriteOp::SetTermFrequency {
            term: term.to_string(),
            doc_id: doc_id.to_string(),
            value,
        });
        self
    }

    pub fn add_to_postings(&mut self, term: &str, doc_id: &str) -> &mut Self {
        self.ops.push(WriteOp::AddToPostings {
            term: term.to_string(),
            doc_id: doc_id.to_string(),
        });
        self
    }

    pub fn increment_document_frequency(&mut self, term: &str) -> &mut Self {
        self.ops
            .push(WriteOp::IncrementDocumentFrequency(term.to_string()));
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Persistent per-term and per-document statistics.
///
/// Reads are not isolated from each other: a query issuing several reads may
/// observe a document that was committed between them.
pub trait StatsStore: Send + Sync {
    fn is_document_registered(&self, doc_id: &str) -> Result<bool>;

    /// Number of registered documents, `0` for a store never written to.
    fn document_count(&self) -> Result<u64>;

    /// Term frequency for every `(term, doc_id)` pair; missing pairs are `0.0`.
    fn term_frequencies(
        &self,
        terms: &[String],
        doc_ids: &[String],
    ) -> Result<HashMap<(String, String), f64>>;

    /// Documents present in the postings of every term. Empty for no terms.
    fn intersect_postings(&self, terms: &[String]) -> Result<BTreeSet<String>>;

    /// Document frequency per term. Fails with `UnknownTerm` for any term
    /// that was never indexed.
    fn document_frequencies(&self, terms: &[String]) -> Result<HashMap<String, u64>>;

    /// Apply every operation of `batch` or none of them.
    fn commit(&self, batch: &WriteBatch) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn register_document(&self, doc_id: &str) -> Result<()> {
        self.commit(WriteBatch::new().register_document(doc_id))
    }

    fn set_term_frequency(&self, term: &str, doc_id: &str, value: f64) -> Result<()> {
        self.commit(WriteBatch::new().set_term_frequency(term, doc_id, value))
    }

    fn add_to_postings(&self, term: &str, doc_id: &str) -> Result<()> {
        self.commit(WriteBatch::new().add_to_postings(term, doc_id))
    }

    fn increment_document_frequency(&self, term: &str) -> Result<()> {
        self.commit(WriteBatch::new().increment_document_frequency(term))
    }
}

/// Message used when a guarded batch meets an already registered document.
pub(crate) fn reindex_message(doc_id: &str) -> String {
    format!("document '{doc_id}' is already indexed; re-indexing requires removal")
}

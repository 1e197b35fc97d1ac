use crate::error::{Error, Result};
use crate::storage::{reindex_message, StatsStore, WriteBatch};
use crate::tokenizer::{term_frequencies, Tokenizer};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Term statistics of one document, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTerms {
    pub doc_id: String,
    pub token_count: usize,
    pub frequencies: BTreeMap<String, f64>,
}

impl DocumentTerms {
    pub fn analyze(tokenizer: &Tokenizer, doc_id: &str, text: &str) -> Self {
        let tokens = tokenizer.tokenize(text);
        Self {
            doc_id: doc_id.to_string(),
            token_count: tokens.len(),
            frequencies: term_frequencies(&tokens),
        }
    }

    /// Every write for this document as one batch.
    ///
    /// The batch refuses to commit if the document got registered in the
    /// meantime, so two writers racing on the same id cannot both count it.
    pub fn to_batch(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.require_unregistered(&self.doc_id);

        for (term, &tf) in &self.frequencies {
            batch
                .set_term_frequency(term, &self.doc_id, tf)
                .add_to_postings(term, &self.doc_id)
                .increment_document_frequency(term);
        }

        batch.register_document(&self.doc_id);
        batch
    }
}

/// Reject identifiers the store cannot key unambiguously.
pub fn validate_doc_id(doc_id: &str) -> Result<()> {
    if doc_id.is_empty() || doc_id.contains('\0') {
        return Err(Error::InvalidDocumentId(doc_id.to_string()));
    }
    Ok(())
}

/// Write path: turns a document into statistics and commits them.
pub struct Indexer<'a, S: StatsStore + ?Sized> {
    store: &'a S,
    tokenizer: &'a Tokenizer,
}

impl<'a, S: StatsStore + ?Sized> Indexer<'a, S> {
    pub fn new(store: &'a S, tokenizer: &'a Tokenizer) -> Self {
        Self { store, tokenizer }
    }

    /// Index a document that has never been indexed before.
    ///
    /// Re-indexing means remove-then-add and removal is not supported, so an
    /// already registered id fails with `UnsupportedOperation` and nothing is
    /// written.
    pub fn index_document(&self, doc_id: &str, text: &str) -> Result<()> {
        validate_doc_id(doc_id)?;

        if self.store.is_document_registered(doc_id)? {
            return Err(Error::UnsupportedOperation(reindex_message(doc_id)));
        }

        let terms = DocumentTerms::analyze(self.tokenizer, doc_id, text);
        if terms.token_count == 0 {
            debug!(doc_id, "document has no tokens, registering it without terms");
        }

        self.store.commit(&terms.to_batch())?;

        info!(
            doc_id,
            tokens = terms.token_count,
            terms = terms.frequencies.len(),
            "indexed document"
        );
        Ok(())
    }
}

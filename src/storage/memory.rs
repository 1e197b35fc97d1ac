use super::{reindex_message, StatsStore, WriteBatch, WriteOp};
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    documents: BTreeSet<String>,
    document_count: u64,
    tf: HashMap<(String, String), f64>,
    inverted: HashMap<String, BTreeSet<String>>,
    idfd: HashMap<String, u64>,
}

impl State {
    /// Check every guard of `batch` against the state the batch would see
    /// at that point, without touching anything.
    fn check_guards(&self, batch: &WriteBatch) -> Result<()> {
        let mut registered_here = BTreeSet::new();

        for op in batch.ops() {
            match op {
                WriteOp::RequireUnregistered(doc_id) => {
                    if self.documents.contains(doc_id) || registered_here.contains(doc_id) {
                        return Err(Error::UnsupportedOperation(reindex_message(doc_id)));
                    }
                }
                WriteOp::RegisterDocument(doc_id) => {
                    registered_here.insert(doc_id);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::RequireUnregistered(_) => {}
            WriteOp::RegisterDocument(doc_id) => {
                if self.documents.insert(doc_id.clone()) {
                    self.document_count += 1;
                }
            }
            WriteOp::SetTermFrequency {
                term,
                doc_id,
                value,
            } => {
                self.tf.insert((term.clone(), doc_id.clone()), *value);
            }
            WriteOp::AddToPostings { term, doc_id } => {
                self.inverted
                    .entry(term.clone())
                    .or_default()
                    .insert(doc_id.clone());
            }
            WriteOp::IncrementDocumentFrequency(term) => {
                *self.idfd.entry(term.clone()).or_insert(0) += 1;
            }
        }
    }
}

/// In-process statistics store, used as a fake in tests and for throwaway
/// indexes. A batch runs under one write lock, after all of its guards
/// passed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".to_string()))
    }
}

impl StatsStore for MemoryStore {
    fn is_document_registered(&self, doc_id: &str) -> Result<bool> {
        Ok(self.read()?.documents.contains(doc_id))
    }

    fn document_count(&self) -> Result<u64> {
        Ok(self.read()?.document_count)
    }

    fn term_frequencies(
        &self,
        terms: &[String],
        doc_ids: &[String],
    ) -> Result<HashMap<(String, String), f64>> {
        let state = self.read()?;
        let mut tfs = HashMap::with_capacity(terms.len() * doc_ids.len());

        for term in terms {
            for doc_id in doc_ids {
                let key = (term.clone(), doc_id.clone());
                let tf = state.tf.get(&key).copied().unwrap_or(0.0);
                tfs.insert(key, tf);
            }
        }

        Ok(tfs)
    }

    fn intersect_postings(&self, terms: &[String]) -> Result<BTreeSet<String>> {
        let state = self.read()?;
        let mut result: Option<BTreeSet<String>> = None;

        for term in terms {
            let Some(docs) = state.inverted.get(term) else {
                return Ok(BTreeSet::new());
            };

            result = Some(match result {
                None => docs.clone(),
                Some(acc) => acc.intersection(docs).cloned().collect(),
            });
        }

        Ok(result.unwrap_or_default())
    }

    fn document_frequencies(&self, terms: &[String]) -> Result<HashMap<String, u64>> {
        let state = self.read()?;

        terms
            .iter()
            .map(|term| {
                state
                    .idfd
                    .get(term)
                    .map(|&df| (term.clone(), df))
                    .ok_or_else(|| Error::UnknownTerm(term.clone()))
            })
            .collect()
    }

    fn commit(&self, batch: &WriteBatch) -> Result<()> {
        let mut state = self.write()?;
        state.check_guards(batch)?;

        for op in batch.ops() {
            state.apply(op);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn test_fresh_store_is_empty() {
        contract::fresh_store_is_empty(&MemoryStore::new());
    }

    #[test]
    fn test_registration_is_idempotent() {
        contract::registration_is_idempotent(&MemoryStore::new());
    }

    #[test]
    fn test_missing_frequencies_are_zero() {
        contract::missing_frequencies_are_zero(&MemoryStore::new());
    }

    #[test]
    fn test_postings_intersect() {
        contract::postings_intersect(&MemoryStore::new());
    }

    #[test]
    fn test_unknown_terms_are_reported() {
        contract::unknown_terms_are_reported(&MemoryStore::new());
    }

    #[test]
    fn test_guarded_batch_is_all_or_nothing() {
        contract::guarded_batch_is_all_or_nothing(&MemoryStore::new());
    }

    #[test]
    fn test_concurrent_indexing_loses_no_updates() {
        contract::concurrent_indexing_loses_no_updates(&MemoryStore::new());
    }

    #[test]
    fn test_racing_writers_register_once() {
        contract::racing_writers_register_once(&MemoryStore::new());
    }
}

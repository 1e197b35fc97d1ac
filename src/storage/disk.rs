use super::{reindex_message, StatsStore, WriteBatch, WriteOp};
use crate::error::{Error, Result};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::{Db, Tree};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

// Key layout inside the namespace tree. Set members are stored as their own
// keys: `<set key> \0 <member>`, so a set is a prefix scan.
const REGISTRY: &str = "documents";
const DOCUMENT_COUNT: &[u8] = b"documents:count";
const MEMBER_SEPARATOR: u8 = 0;
const EMPTY: &[u8] = &[];

fn set_prefix(set_key: &str) -> Vec<u8> {
    let mut key = set_key.as_bytes().to_vec();
    key.push(MEMBER_SEPARATOR);
    key
}

fn member_key(set_key: &str, member: &str) -> Vec<u8> {
    let mut key = set_prefix(set_key);
    key.extend_from_slice(member.as_bytes());
    key
}

fn registry_key(doc_id: &str) -> Vec<u8> {
    member_key(REGISTRY, doc_id)
}

fn postings_set(term: &str) -> String {
    format!("inverted:{term}")
}

fn tf_key(term: &str, doc_id: &str) -> Vec<u8> {
    format!("tf:{term}:{doc_id}").into_bytes()
}

fn df_key(term: &str) -> Vec<u8> {
    format!("idfd:{term}").into_bytes()
}

fn decode_u64(key: &[u8], bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        Error::StoreInconsistency(format!(
            "value under '{}' is not a 64-bit counter",
            String::from_utf8_lossy(key)
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}

fn decode_f64(key: &[u8], bytes: &[u8]) -> Result<f64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        Error::StoreInconsistency(format!(
            "value under '{}' is not a 64-bit float",
            String::from_utf8_lossy(key)
        ))
    })?;
    Ok(f64::from_be_bytes(raw))
}

fn decode_member(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::StoreInconsistency("set member is not valid UTF-8".to_string()))
}

/// Statistics store backed by a sled tree named after the namespace.
pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    /// Open or create a database at `path`
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), namespace, "opened statistics store");
        Self::with_db(db, namespace)
    }

    /// Create a throwaway database that is removed on drop (for testing)
    pub fn temporary(namespace: &str) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db, namespace)
    }

    /// Use `namespace` inside an already opened database.
    pub fn with_db(db: Db, namespace: &str) -> Result<Self> {
        let tree = db.open_tree(namespace)?;
        Ok(Self { db, tree })
    }

    fn postings(&self, term: &str) -> Result<BTreeSet<String>> {
        let prefix = set_prefix(&postings_set(term));
        let mut members = BTreeSet::new();

        for item in self.tree.scan_prefix(&prefix) {
            let (key, _) = item?;
            members.insert(decode_member(&key[prefix.len()..])?);
        }

        Ok(members)
    }
}

fn increment(tx: &TransactionalTree, key: &[u8]) -> ConflictableTransactionResult<u64, Error> {
    let current = match tx.get(key)? {
        Some(bytes) => decode_u64(key, &bytes).map_err(ConflictableTransactionError::Abort)?,
        None => 0,
    };
    let next = current.checked_add(1).ok_or_else(|| {
        ConflictableTransactionError::Abort(Error::StoreInconsistency(format!(
            "counter under '{}' overflowed",
            String::from_utf8_lossy(key)
        )))
    })?;
    tx.insert(key, &next.to_be_bytes()[..])?;
    Ok(next)
}

fn apply(tx: &TransactionalTree, op: &WriteOp) -> ConflictableTransactionResult<(), Error> {
    match op {
        WriteOp::RequireUnregistered(doc_id) => {
            if tx.get(registry_key(doc_id))?.is_some() {
                return Err(ConflictableTransactionError::Abort(
                    Error::UnsupportedOperation(reindex_message(doc_id)),
                ));
            }
        }
        WriteOp::RegisterDocument(doc_id) => {
            let key = registry_key(doc_id);
            if tx.get(&key)?.is_none() {
                tx.insert(key, EMPTY)?;
                increment(tx, DOCUMENT_COUNT)?;
            }
        }
        WriteOp::SetTermFrequency {
            term,
            doc_id,
            value,
        } => {
            tx.insert(tf_key(term, doc_id), &value.to_be_bytes()[..])?;
        }
        WriteOp::AddToPostings { term, doc_id } => {
            tx.insert(member_key(&postings_set(term), doc_id), EMPTY)?;
        }
        WriteOp::IncrementDocumentFrequency(term) => {
            increment(tx, &df_key(term))?;
        }
    }
    Ok(())
}

impl StatsStore for SledStore {
    fn is_document_registered(&self, doc_id: &str) -> Result<bool> {
        Ok(self.tree.contains_key(registry_key(doc_id))?)
    }

    fn document_count(&self) -> Result<u64> {
        match self.tree.get(DOCUMENT_COUNT)? {
            Some(bytes) => decode_u64(DOCUMENT_COUNT, &bytes),
            None => {
                if self
                    .tree
                    .scan_prefix(set_prefix(REGISTRY))
                    .next()
                    .transpose()?
                    .is_some()
                {
                    Err(Error::StoreInconsistency(
                        "documents are registered but the document count is unset".to_string(),
                    ))
                } else {
                    Ok(0)
                }
            }
        }
    }

    fn term_frequencies(
        &self,
        terms: &[String],
        doc_ids: &[String],
    ) -> Result<HashMap<(String, String), f64>> {
        let mut tfs = HashMap::with_capacity(terms.len() * doc_ids.len());

        for term in terms {
            for doc_id in doc_ids {
                let key = tf_key(term, doc_id);
                let tf = match self.tree.get(&key)? {
                    Some(bytes) => decode_f64(&key, &bytes)?,
                    None => 0.0,
                };
                tfs.insert((term.clone(), doc_id.clone()), tf);
            }
        }

        Ok(tfs)
    }

    fn intersect_postings(&self, terms: &[String]) -> Result<BTreeSet<String>> {
        let mut result: Option<BTreeSet<String>> = None;

        for term in terms {
            let docs = self.postings(term)?;
            let next = match result {
                None => docs,
                Some(acc) => acc.intersection(&docs).cloned().collect(),
            };

            if next.is_empty() {
                return Ok(BTreeSet::new());
            }
            result = Some(next);
        }

        Ok(result.unwrap_or_default())
    }

    fn document_frequencies(&self, terms: &[String]) -> Result<HashMap<String, u64>> {
        let mut dfs = HashMap::with_capacity(terms.len());

        for term in terms {
            let key = df_key(term);
            let bytes = self
                .tree
                .get(&key)?
                .ok_or_else(|| Error::UnknownTerm(term.clone()))?;
            dfs.insert(term.clone(), decode_u64(&key, &bytes)?);
        }

        Ok(dfs)
    }

    fn commit(&self, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.tree
            .transaction(|tx| -> ConflictableTransactionResult<(), Error> {
                for op in batch.ops() {
                    apply(tx, op)?;
                }
                Ok(())
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => Error::from(err),
            })?;

        debug!(ops = batch.len(), "committed write batch");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{contract, DEFAULT_NAMESPACE};

    fn store() -> SledStore {
        SledStore::temporary(DEFAULT_NAMESPACE).unwrap()
    }

    #[test]
    fn test_fresh_store_is_empty() {
        contract::fresh_store_is_empty(&store());
    }

    #[test]
    fn test_registration_is_idempotent() {
        contract::registration_is_idempotent(&store());
    }

    #[test]
    fn test_missing_frequencies_are_zero() {
        contract::missing_frequencies_are_zero(&store());
    }

    #[test]
    fn test_postings_intersect() {
        contract::postings_intersect(&store());
    }

    #[test]
    fn test_unknown_terms_are_reported() {
        contract::unknown_terms_are_reported(&store());
    }

    #[test]
    fn test_guarded_batch_is_all_or_nothing() {
        contract::guarded_batch_is_all_or_nothing(&store());
    }

    #[test]
    fn test_key_layout() -> Result<()> {
        let store = store();
        let mut batch = WriteBatch::new();
        batch
            .set_term_frequency("cat", "a", 0.25)
            .add_to_postings("cat", "a")
            .increment_document_frequency("cat")
            .register_document("a");
        store.commit(&batch)?;

        let count = store.tree.get(b"documents:count")?.unwrap();
        assert_eq!(u64::from_be_bytes(count.as_ref().try_into().unwrap()), 1);

        let tf = store.tree.get(b"tf:cat:a")?.unwrap();
        assert_eq!(f64::from_be_bytes(tf.as_ref().try_into().unwrap()), 0.25);

        assert!(store.tree.contains_key(b"inverted:cat\0a")?);
        assert!(store.tree.contains_key(b"documents\0a")?);
        assert!(store.tree.contains_key(b"idfd:cat")?);
        Ok(())
    }

    #[test]
    fn test_missing_count_with_registry_is_inconsistent() -> Result<()> {
        let store = store();
        store.tree.insert(b"documents\0orphan", EMPTY)?;

        assert!(matches!(
            store.document_count(),
            Err(Error::StoreInconsistency(_))
        ));
        Ok(())
    }

    #[test]
    fn test_corrupt_counter_is_inconsistent() -> Result<()> {
        let store = store();
        store.tree.insert(b"idfd:cat", &b"xyz"[..])?;

        assert!(matches!(
            store.document_frequencies(&["cat".to_string()]),
            Err(Error::StoreInconsistency(_))
        ));
        Ok(())
    }

    #[test]
    fn test_counter_overflow_aborts_batch() -> Result<()> {
        let store = store();
        store.tree.insert(b"idfd:cat", &u64::MAX.to_be_bytes()[..])?;

        let mut batch = WriteBatch::new();
        batch
            .add_to_postings("cat", "a")
            .increment_document_frequency("cat")
            .register_document("a");

        assert!(matches!(
            store.commit(&batch),
            Err(Error::StoreInconsistency(_))
        ));
        assert_eq!(store.document_frequencies(&["cat".to_string()])?["cat"], u64::MAX);
        assert!(store.intersect_postings(&["cat".to_string()])?.is_empty());
        assert_eq!(store.document_count()?, 0);
        Ok(())
    }

    #[test]
    fn test_concurrent_indexing_loses_no_updates() {
        contract::concurrent_indexing_loses_no_updates(&store());
    }

    #[test]
    fn test_racing_writers_register_once() {
        contract::racing_writers_register_once(&store());
    }

    #[test]
    fn test_namespaces_are_isolated() -> Result<()> {
        let db = sled::Config::new().temporary(true).open()?;
        let first = SledStore::with_db(db.clone(), "first")?;
        let second = SledStore::with_db(db, "second")?;

        first.register_document("a")?;

        assert_eq!(first.document_count()?, 1);
        assert_eq!(second.document_count()?, 0);
        assert!(!second.is_document_registered("a")?);
        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");

        {
            let store = SledStore::open(&path, DEFAULT_NAMESPACE)?;
            let mut batch = WriteBatch::new();
            batch
                .set_term_frequency("cat", "a", 1.0)
                .add_to_postings("cat", "a")
                .increment_document_frequency("cat")
                .register_document("a");
            store.commit(&batch)?;
            store.flush()?;
        }

        let store = SledStore::open(&path, DEFAULT_NAMESPACE)?;
        assert_eq!(store.document_count()?, 1);
        assert!(store.is_document_registered("a")?);
        assert_eq!(store.document_frequencies(&["cat".to_string()])?["cat"], 1);
        Ok(())
    }
}

use crate::error::Result;
use crate::storage::{SledStore, DEFAULT_NAMESPACE};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "rstfidf.db";

/// Where and under which namespace the statistics live.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub namespace: String,
    /// Discard the database when the store is dropped.
    pub temporary: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            temporary: false,
        }
    }

    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    pub fn open(&self) -> Result<SledStore> {
        if self.temporary {
            SledStore::temporary(&self.namespace)
        } else {
            SledStore::open(&self.path, &self.namespace)
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH, DEFAULT_NAMESPACE)
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the indexing and query engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The statistics store could not be read or written.
    #[error("statistics store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored bookkeeping is missing or cannot be decoded.
    #[error("statistics store is inconsistent: {0}")]
    StoreInconsistency(String),

    /// A document-frequency lookup hit a term that was never indexed.
    #[error("term '{0}' has never been indexed")]
    UnknownTerm(String),

    /// A search ran before any document was indexed.
    #[error("no documents have been indexed yet")]
    EmptyCorpus,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid document id {0:?}")]
    InvalidDocumentId(String),

    #[error("failed to read document {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

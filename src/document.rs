use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Document represents a unit of indexable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Read a file, identified by its absolute normalized path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let absolute = absolute_path(path).map_err(io_err)?;
        let text = std::fs::read_to_string(&absolute).map_err(io_err)?;

        Ok(Self::new(absolute.to_string_lossy(), text))
    }
}

/// Absolute, lexically normalized form of `path`, used as a document id.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    Ok(normalize(&std::path::absolute(path)?))
}

/// Resolve `.` and `..` lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_from_path_uses_absolute_id() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(b"cat dog cat"))
            .unwrap();

        let doc = Document::from_path(dir.path().join("sub/../notes.txt"))?;

        assert_eq!(doc.text, "cat dog cat");
        assert!(Path::new(&doc.id).is_absolute());
        assert!(doc.id.ends_with("notes.txt"));
        assert!(!doc.id.contains(".."));
        Ok(())
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Document::from_path("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}

//! Document sets on disk: a JSON array of `{id, text}` objects.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::{Document, PipelineError};

/// One document per regular file directly inside `dir` (no recursion), id
/// = file stem. Sorted by id so output does not depend on directory order.
pub fn build_corpus(dir: impl AsRef<Path>) -> Result<Vec<Document>, PipelineError> {
    let dir = dir.as_ref();
    let mut docs = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| PipelineError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        docs.push(Document { id, text });
    }

    docs.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!(dir = %dir.display(), documents = docs.len(), "built corpus");
    Ok(docs)
}

pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<Document>, PipelineError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed, non-ASCII text kept as is.
pub fn write_documents(path: impl AsRef<Path>, docs: &[Document]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(docs).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sorted_corpus_from_flat_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.txt"), "Bravo text").expect("write");
        fs::write(dir.path().join("a.md"), "Alpha text").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("c.txt"), "ignored").expect("write");

        let docs = build_corpus(dir.path()).expect("corpus");
        assert_eq!(
            docs,
            vec![Document::new("a", "Alpha text"), Document::new("b", "Bravo text")]
        );
    }

    #[test]
    fn documents_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docs.json");
        let docs = vec![Document::new("zurich", "Zürich liegt am Zürichsee.")];
        write_documents(&path, &docs).expect("write");
        assert!(fs::read_to_string(&path).expect("read").contains("Zürich"));
        assert_eq!(load_documents(&path).expect("load"), docs);
    }

    #[test]
    fn malformed_document_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docs.json");
        fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            load_documents(&path),
            Err(PipelineError::Json { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(build_corpus("/nonexistent/paladin/corpus").is_err());
    }
}

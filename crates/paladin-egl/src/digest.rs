//! Content and graph digests.
//!
//! - `content_hash`: lowercase hex SHA-256 of a UTF-8 span. Evidence nodes
//!   record this at authoring time; the hash binding checker recomputes it.
//! - `graph_digest`: `"sha256:<hex>"` of the compact canonical JSON form.
//!   Stable across compiles of logically identical input, and recomputable
//!   by anyone holding the canonical JSON.

use sha2::{Digest, Sha256};

use crate::schema::EvidenceGraph;

/// Prefix used in serialized graph digests.
pub const GRAPH_DIGEST_PREFIX: &str = "sha256:";

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// Lowercase hex SHA-256 of `span`.
pub fn content_hash(span: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(span.as_bytes());
    to_hex(&hasher.finalize())
}

/// SHA-256 over `graph.to_canonical_form().to_json()`, prefixed with
/// [`GRAPH_DIGEST_PREFIX`].
pub fn graph_digest(graph: &EvidenceGraph) -> Result<String, serde_json::Error> {
    let json = graph.to_canonical_form().to_json()?;
    Ok(format!("{GRAPH_DIGEST_PREFIX}{}", content_hash(&json)))
}

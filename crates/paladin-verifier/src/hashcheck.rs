//! Hash binding: every evidence node's span must match its recorded digest.
//!
//! Exact byte comparison of the recomputed lowercase hex SHA-256 against the
//! stored value; no normalization of either side.

use serde::{Deserialize, Serialize};

use paladin_egl::{content_hash, EvidenceGraph, NodeKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashReport {
    pub passed: bool,
    pub problems: Vec<String>,
}

/// Check every evidence node in graph order. Other node kinds are skipped.
pub fn check_source_binding(graph: &EvidenceGraph) -> HashReport {
    let mut problems = Vec::new();
    for node in graph.nodes() {
        if node.kind() != NodeKind::Evidence {
            continue;
        }
        let span = node.span().unwrap_or_default();
        let stored = node.content_hash().unwrap_or_default();
        if span.is_empty() {
            problems.push(format!("evidence {} missing span", node.id));
            continue;
        }
        if stored.is_empty() {
            problems.push(format!("evidence {} missing hash", node.id));
            continue;
        }
        if content_hash(span) != stored {
            tracing::debug!(node = %node.id, "evidence span does not match its content hash");
            problems.push(format!("hash mismatch for {}", node.id));
        }
    }

    HashReport {
        passed: problems.is_empty(),
        problems,
    }
}

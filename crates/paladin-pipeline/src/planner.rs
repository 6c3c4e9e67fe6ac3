//! Single-span proof planner.

use paladin_egl::{content_hash, NodeKind, RawEdge, RawGraph, RawNode, Relation};

use crate::spans::extract_span;
use crate::{Document, Planner};

pub const CLAIM_ID: &str = "c1";
pub const EVIDENCE_ID: &str = "e1";

/// Links the answer claim to one span of the top document.
///
/// With no documents the plan is the bare claim, which fails structural
/// validation (an unreachable final claim).
#[derive(Debug, Clone)]
pub struct SingleSpanPlanner {
    window: usize,
}

impl SingleSpanPlanner {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Default for SingleSpanPlanner {
    fn default() -> Self {
        Self::new(40)
    }
}

impl Planner for SingleSpanPlanner {
    fn plan(&self, query: &str, answer: &str, documents: &[Document]) -> RawGraph {
        let mut claim = RawNode::new(CLAIM_ID, NodeKind::Claim.as_str());
        claim.text = Some(answer.to_string());
        let mut graph = RawGraph {
            nodes: vec![claim],
            edges: Vec::new(),
        };

        if let Some(doc) = documents.first() {
            let span = extract_span(&doc.text, query, self.window);
            let mut evidence = RawNode::new(EVIDENCE_ID, NodeKind::Evidence.as_str());
            evidence.url = Some(if doc.id.is_empty() {
                "unknown".to_string()
            } else {
                doc.id.clone()
            });
            evidence.hash = Some(content_hash(&span));
            evidence.span = Some(span);
            graph.nodes.push(evidence);
            graph
                .edges
                .push(RawEdge::new(EVIDENCE_ID, CLAIM_ID, Relation::Supports.as_str()));
        }
        graph
    }
}

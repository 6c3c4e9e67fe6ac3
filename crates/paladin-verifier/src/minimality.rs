//! Minimality: is every edge of the proof load-bearing?
//!
//! For each edge, in graph order, the checker looks at the graph with that
//! edge omitted. If every final claim is still reachable from a grounding
//! node and every evidence→claim `supports` edge still classifies as
//! supported, the omitted edge is redundant and reported as removable.
//!
//! A graph with no edges is never minimal and has nothing removable.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use paladin_egl::{EvidenceGraph, NodeKind, Relation, Topology};

use crate::config::{SupportConfig, VerifierConfig};
use crate::truth_lens::{classify_with, SupportLevel};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalityReport {
    pub passed: bool,
    /// `"<source>-><target>"` for each redundant edge, in edge order.
    pub removable: Vec<String>,
}

/// Every `supports` edge resolves to existing nodes, and those running from
/// evidence to a claim are still lexically supported.
pub fn supports_valid(config: &SupportConfig, view: &Topology<'_>) -> bool {
    for edge in view.edges() {
        if edge.relation != Relation::Supports {
            continue;
        }
        let (Some(src), Some(tgt)) = (view.get_node(&edge.source), view.get_node(&edge.target))
        else {
            return false;
        };
        if src.kind() != NodeKind::Evidence || tgt.kind() != NodeKind::Claim {
            continue;
        }
        let level = classify_with(
            config,
            src.span().unwrap_or_default(),
            tgt.text().unwrap_or_default(),
        );
        if level != SupportLevel::Supported {
            return false;
        }
    }
    true
}

fn is_removable(config: &SupportConfig, graph: &EvidenceGraph, index: usize) -> bool {
    let view = graph.without_edge(index);
    view.validate_connectivity() && supports_valid(config, &view)
}

pub fn check_minimality(graph: &EvidenceGraph) -> MinimalityReport {
    check_minimality_with(&VerifierConfig::default(), graph)
}

pub fn check_minimality_with(config: &VerifierConfig, graph: &EvidenceGraph) -> MinimalityReport {
    let edges = graph.edges();
    if edges.is_empty() {
        return MinimalityReport {
            passed: false,
            removable: Vec::new(),
        };
    }

    // Indexed collect keeps edge order on the parallel path.
    let flags: Vec<bool> = if config.parallel_minimality {
        (0..edges.len())
            .into_par_iter()
            .map(|i| is_removable(&config.support, graph, i))
            .collect()
    } else {
        (0..edges.len())
            .map(|i| is_removable(&config.support, graph, i))
            .collect()
    };

    let removable: Vec<String> = edges
        .iter()
        .zip(flags)
        .filter(|(_, redundant)| *redundant)
        .map(|(edge, _)| edge.descriptor())
        .collect();

    tracing::debug!(
        edges = edges.len(),
        removable = removable.len(),
        "minimality check finished"
    );

    MinimalityReport {
        passed: removable.is_empty(),
        removable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paladin_egl::{content_hash, Edge, Node};

    fn evidence(id: &str, span: &str) -> Node {
        Node::evidence(id, "doc", span, content_hash(span))
    }

    #[test]
    fn zero_edges_is_not_minimal() {
        let graph = EvidenceGraph::from_parts(vec![evidence("e1", "x")], vec![]);
        let report = check_minimality(&graph);
        assert!(!report.passed);
        assert!(report.removable.is_empty());
    }

    #[test]
    fn single_supporting_edge_is_minimal() {
        let graph = EvidenceGraph::from_parts(
            vec![Node::claim("c1", "Earth is round"), evidence("e1", "Earth is round")],
            vec![Edge::new("e1", "c1", Relation::Supports)],
        );
        let report = check_minimality(&graph);
        assert!(report.passed);
        assert!(report.removable.is_empty());
    }

    #[test]
    fn duplicate_support_makes_both_edges_removable() {
        let graph = EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "Earth is round"),
                evidence("e1", "Earth is round"),
                evidence("e2", "Earth is round indeed"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Supports),
                Edge::new("e2", "c1", Relation::Supports),
            ],
        );
        let report = check_minimality(&graph);
        assert!(!report.passed);
        assert_eq!(report.removable, vec!["e1->c1", "e2->c1"]);
    }

    #[test]
    fn weak_support_edge_is_removable_but_cites_is_not() {
        // Without the cites edge the weak supports edge fails classification.
        // Without the supports edge the claim is still reached via cites.
        let graph = EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "Earth is round"),
                evidence("e1", "Mars is red"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Cites),
                Edge::new("e1", "c1", Relation::Supports),
            ],
        );
        let report = check_minimality(&graph);
        assert!(!report.passed);
        assert_eq!(report.removable, vec!["e1->c1"]);
    }

    #[test]
    fn dangling_support_is_never_valid() {
        let graph = EvidenceGraph::from_parts(
            vec![Node::claim("c1", "t"), evidence("e1", "t")],
            vec![
                Edge::new("e1", "c1", Relation::Supports),
                Edge::new("ghost", "c1", Relation::Supports),
            ],
        );
        let view = graph.topology();
        assert!(!supports_valid(&SupportConfig::default(), &view));
    }

    #[test]
    fn parallel_matches_sequential() {
        let graph = EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "a b"),
                evidence("e1", "a b"),
                evidence("e2", "a b"),
                evidence("e3", "a b"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Supports),
                Edge::new("e2", "c1", Relation::Supports),
                Edge::new("e3", "c1", Relation::Supports),
            ],
        );
        let parallel = VerifierConfig {
            parallel_minimality: true,
            ..VerifierConfig::default()
        };
        assert_eq!(
            check_minimality_with(&parallel, &graph),
            check_minimality(&graph)
        );
    }
}

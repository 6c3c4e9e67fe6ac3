//! Typed Evidence Graph model.
//!
//! An evidence graph is a small directed graph of typed nodes (claims,
//! evidence spans, calculations, entailments) connected by typed edges.
//! Edges reference nodes by id, never by pointer: the graph exclusively owns
//! both sequences, and derived views (see [`Topology`]) borrow them.
//!
//! Kind and relation tags are closed enums. Construction from an untyped tag
//! goes through `FromStr`, which rejects anything outside the fixed sets with
//! a [`SchemaError`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = String;

// ============================================================================
// Tags
// ============================================================================

/// Node variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Claim,
    Evidence,
    #[serde(rename = "calc", alias = "calculation")]
    Calc,
    Entailment,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Claim,
        NodeKind::Evidence,
        NodeKind::Calc,
        NodeKind::Entailment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Claim => "claim",
            NodeKind::Evidence => "evidence",
            NodeKind::Calc => "calc",
            NodeKind::Entailment => "entailment",
        }
    }

    /// Kinds that seed reachability: a claim is backed when it is reachable
    /// from one of these.
    pub fn is_grounding(self) -> bool {
        matches!(
            self,
            NodeKind::Evidence | NodeKind::Calc | NodeKind::Entailment
        )
    }
}

impl FromStr for NodeKind {
    type Err = SchemaError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "claim" => Ok(NodeKind::Claim),
            "evidence" => Ok(NodeKind::Evidence),
            "calc" | "calculation" => Ok(NodeKind::Calc),
            "entailment" => Ok(NodeKind::Entailment),
            other => Err(SchemaError::UnknownNodeKind {
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge relation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    Supports,
    Refutes,
    Derives,
    UsesTool,
    Cites,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Supports,
        Relation::Refutes,
        Relation::Derives,
        Relation::UsesTool,
        Relation::Cites,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Supports => "supports",
            Relation::Refutes => "refutes",
            Relation::Derives => "derives",
            Relation::UsesTool => "uses-tool",
            Relation::Cites => "cites",
        }
    }

    /// Relations along which backing propagates (everything except `refutes`).
    pub fn propagates_support(self) -> bool {
        !matches!(self, Relation::Refutes)
    }
}

impl FromStr for Relation {
    type Err = SchemaError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|r| r.as_str() == tag)
            .ok_or_else(|| SchemaError::UnknownRelation {
                tag: tag.to_string(),
            })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown node type `{tag}` (expected one of: claim, evidence, calc, entailment)")]
    UnknownNodeKind { tag: String },
    #[error("unknown edge type `{tag}` (expected one of: supports, refutes, derives, uses-tool, cites)")]
    UnknownRelation { tag: String },
    #[error("malformed graph record: {message}")]
    Malformed { message: String },
}

// ============================================================================
// Nodes and edges
// ============================================================================

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    Claim {
        text: Option<String>,
    },
    Evidence {
        url: Option<String>,
        span: Option<String>,
        /// Lowercase hex SHA-256 of `span`, recorded at authoring time.
        hash: Option<String>,
    },
    Calc {
        code: Option<String>,
        result: Option<String>,
    },
    Entailment {
        premise: Option<String>,
        hypothesis: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub body: NodeBody,
    pub lang: Option<String>,
}

impl Node {
    pub fn claim(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Claim {
                text: Some(text.into()),
            },
            lang: None,
        }
    }

    pub fn evidence(
        id: impl Into<String>,
        url: impl Into<String>,
        span: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Evidence {
                url: Some(url.into()),
                span: Some(span.into()),
                hash: Some(hash.into()),
            },
            lang: None,
        }
    }

    pub fn calc(id: impl Into<String>, code: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Calc {
                code: Some(code.into()),
                result: Some(result.into()),
            },
            lang: None,
        }
    }

    pub fn entailment(
        id: impl Into<String>,
        premise: impl Into<String>,
        hypothesis: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Entailment {
                premise: Some(premise.into()),
                hypothesis: Some(hypothesis.into()),
            },
            lang: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Claim { .. } => NodeKind::Claim,
            NodeBody::Evidence { .. } => NodeKind::Evidence,
            NodeBody::Calc { .. } => NodeKind::Calc,
            NodeBody::Entailment { .. } => NodeKind::Entailment,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Claim { text } => text.as_deref(),
            _ => None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Evidence { url, .. } => url.as_deref(),
            _ => None,
        }
    }

    pub fn span(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Evidence { span, .. } => span.as_deref(),
            _ => None,
        }
    }

    pub fn content_hash(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Evidence { hash, .. } => hash.as_deref(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Calc { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Calc { result, .. } => result.as_deref(),
            _ => None,
        }
    }

    pub fn premise(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Entailment { premise, .. } => premise.as_deref(),
            _ => None,
        }
    }

    pub fn hypothesis(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Entailment { hypothesis, .. } => hypothesis.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, relation: Relation) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
        }
    }

    /// `"<source>-><target>"`, the form used in minimality reports.
    pub fn descriptor(&self) -> String {
        format!("{}->{}", self.source, self.target)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// An evidence graph: ordered nodes and edges.
///
/// Consumers treat a graph as immutable once built. Checkers that need a
/// modified graph (minimality) work on a [`Topology`] view instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl EvidenceGraph {
    /// Build a graph without validation.
    ///
    /// `crate::compiler::compile_graph` is the validated entrypoint.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Full view over the graph.
    pub fn topology(&self) -> Topology<'_> {
        Topology {
            nodes: &self.nodes,
            edges: self.edges.iter().collect(),
        }
    }

    /// View over the graph with the edge at `index` omitted.
    ///
    /// Nodes are shared with `self`; only the edge sequence is new.
    pub fn without_edge(&self, index: usize) -> Topology<'_> {
        Topology {
            nodes: &self.nodes,
            edges: self
                .edges
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, e)| e)
                .collect(),
        }
    }

    pub fn node_map(&self) -> HashMap<&str, &Node> {
        self.topology().node_map()
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.id == id)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn claims(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind() == NodeKind::Claim)
    }

    pub fn evidence_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind() == NodeKind::Evidence)
    }

    pub fn is_final_claim(&self, node: &Node) -> bool {
        self.topology().is_final_claim(node)
    }

    pub fn final_claims(&self) -> Vec<&Node> {
        self.topology().final_claims()
    }

    pub fn reachable_from_evidence(&self) -> BTreeMap<&str, bool> {
        self.topology().reachable_from_evidence()
    }

    pub fn validate_connectivity(&self) -> bool {
        self.topology().validate_connectivity()
    }

    pub fn to_canonical_form(&self) -> CanonicalGraph {
        CanonicalGraph {
            nodes: self.nodes.iter().map(CanonicalNode::from).collect(),
            edges: self.edges.iter().map(CanonicalEdge::from).collect(),
        }
    }
}

/// Borrowed view of a graph: the owning graph's nodes plus an edge sequence.
///
/// All connectivity queries live here so they can run unchanged over the full
/// graph and over "graph minus one edge" views.
#[derive(Debug, Clone)]
pub struct Topology<'g> {
    nodes: &'g [Node],
    edges: Vec<&'g Edge>,
}

impl<'g> Topology<'g> {
    pub fn nodes(&self) -> &'g [Node] {
        self.nodes
    }

    pub fn edges(&self) -> &[&'g Edge] {
        &self.edges
    }

    /// Id → node lookup. With duplicate ids the last node wins.
    pub fn node_map(&self) -> HashMap<&'g str, &'g Node> {
        let nodes: &'g [Node] = self.nodes;
        nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    pub fn get_node(&self, id: &str) -> Option<&'g Node> {
        let nodes: &'g [Node] = self.nodes;
        nodes.iter().rev().find(|n| n.id == id)
    }

    pub fn claims(&self) -> impl Iterator<Item = &'g Node> {
        let nodes: &'g [Node] = self.nodes;
        nodes.iter().filter(|n| n.kind() == NodeKind::Claim)
    }

    /// A claim is final when no `derives` edge points at it.
    pub fn is_final_claim(&self, node: &Node) -> bool {
        !self
            .edges
            .iter()
            .any(|e| e.target == node.id && e.relation == Relation::Derives)
    }

    pub fn final_claims(&self) -> Vec<&'g Node> {
        let derived: HashSet<&str> = self
            .edges
            .iter()
            .filter(|e| e.relation == Relation::Derives)
            .map(|e| e.target.as_str())
            .collect();
        self.claims()
            .filter(|c| !derived.contains(c.id.as_str()))
            .collect()
    }

    /// Which nodes are backed, transitively, by an evidence, calc or
    /// entailment node.
    ///
    /// Iterative DFS over every relation except `refutes`. Edges pointing at
    /// ids that are not nodes are skipped; structural validation reports them.
    pub fn reachable_from_evidence(&self) -> BTreeMap<&'g str, bool> {
        let nodes: &'g [Node] = self.nodes;
        let mut reachable: BTreeMap<&'g str, bool> =
            nodes.iter().map(|n| (n.id.as_str(), false)).collect();

        let mut adjacency: HashMap<&'g str, Vec<&'g str>> = HashMap::new();
        for &edge in &self.edges {
            if edge.relation.propagates_support() {
                adjacency
                    .entry(edge.source.as_str())
                    .or_default()
                    .push(edge.target.as_str());
            }
        }

        let mut stack: Vec<&'g str> = Vec::new();
        for node in nodes.iter().filter(|n| n.kind().is_grounding()) {
            reachable.insert(node.id.as_str(), true);
            stack.push(node.id.as_str());
        }

        while let Some(current) = stack.pop() {
            let Some(targets) = adjacency.get(current) else {
                continue;
            };
            for &target in targets {
                if let Some(seen) = reachable.get_mut(target) {
                    if !*seen {
                        *seen = true;
                        stack.push(target);
                    }
                }
            }
        }

        reachable
    }

    /// Final claims that are not reachable from any grounding node.
    pub fn unreachable_final_claims(&self) -> Vec<&'g str> {
        let reachable = self.reachable_from_evidence();
        self.final_claims()
            .into_iter()
            .map(|c| c.id.as_str())
            .filter(|id| !reachable.get(id).copied().unwrap_or(false))
            .collect()
    }

    pub fn validate_connectivity(&self) -> bool {
        self.unreachable_final_claims().is_empty()
    }
}

// ============================================================================
// Structural validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DuplicateNodeId { id: NodeId },
    MissingEdgeSource { source: NodeId, target: NodeId },
    MissingEdgeTarget { source: NodeId, target: NodeId },
    UnreachableFinalClaims { claims: Vec<NodeId> },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateNodeId { id } => write!(f, "duplicate node identifier `{id}`"),
            Violation::MissingEdgeSource { source, .. } => {
                write!(f, "edge source `{source}` does not exist")
            }
            Violation::MissingEdgeTarget { target, .. } => {
                write!(f, "edge target `{target}` does not exist")
            }
            Violation::UnreachableFinalClaims { claims } => write!(
                f,
                "final claims are not reachable from evidence or calc nodes: {}",
                claims.join(", ")
            ),
        }
    }
}

/// Structural validation. An empty result means the graph is valid.
///
/// Every check runs; violations are collected rather than short-circuited.
pub fn validate(graph: &EvidenceGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicated: Vec<&str> = Vec::new();
    for node in graph.nodes() {
        if !seen.insert(node.id.as_str()) && !duplicated.contains(&node.id.as_str()) {
            duplicated.push(node.id.as_str());
        }
    }
    violations.extend(duplicated.into_iter().map(|id| Violation::DuplicateNodeId {
        id: id.to_string(),
    }));

    for edge in graph.edges() {
        if !seen.contains(edge.source.as_str()) {
            violations.push(Violation::MissingEdgeSource {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
        if !seen.contains(edge.target.as_str()) {
            violations.push(Violation::MissingEdgeTarget {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }

    let unreachable = graph.topology().unreachable_final_claims();
    if !unreachable.is_empty() {
        violations.push(Violation::UnreachableFinalClaims {
            claims: unreachable.into_iter().map(str::to_string).collect(),
        });
    }

    violations
}

// ============================================================================
// Canonical (serializable) form
// ============================================================================

/// Serializable graph shape consumed by reports, UIs and metrics.
///
/// Every node carries every field (`null` when absent) so the JSON layout is
/// independent of the node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalGraph {
    pub nodes: Vec<CanonicalNode>,
    pub edges: Vec<CanonicalEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub text: Option<String>,
    pub url: Option<String>,
    pub span: Option<String>,
    pub hash: Option<String>,
    pub code: Option<String>,
    pub result: Option<String>,
    pub premise: Option<String>,
    pub hypothesis: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub relation: Relation,
}

impl From<&Node> for CanonicalNode {
    fn from(node: &Node) -> Self {
        let owned = |v: Option<&str>| v.map(str::to_string);
        Self {
            id: node.id.clone(),
            kind: node.kind(),
            text: owned(node.text()),
            url: owned(node.source_url()),
            span: owned(node.span()),
            hash: owned(node.content_hash()),
            code: owned(node.code()),
            result: owned(node.result()),
            premise: owned(node.premise()),
            hypothesis: owned(node.hypothesis()),
            lang: node.lang.clone(),
        }
    }
}

impl From<&Edge> for CanonicalEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            relation: edge.relation,
        }
    }
}

impl CanonicalGraph {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> EvidenceGraph {
        // e1 -supports-> c1 -derives-> c2
        EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "intermediate"),
                Node::claim("c2", "final"),
                Node::evidence("e1", "doc", "span", "hash"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Supports),
                Edge::new("c1", "c2", Relation::Derives),
            ],
        )
    }

    #[test]
    fn tags_parse_and_reject_unknown() {
        assert_eq!("calc".parse::<NodeKind>(), Ok(NodeKind::Calc));
        assert_eq!("calculation".parse::<NodeKind>(), Ok(NodeKind::Calc));
        assert!(matches!(
            "opinion".parse::<NodeKind>(),
            Err(SchemaError::UnknownNodeKind { .. })
        ));
        assert_eq!("uses-tool".parse::<Relation>(), Ok(Relation::UsesTool));
        assert!(matches!(
            "implies".parse::<Relation>(),
            Err(SchemaError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn derived_claims_are_not_final() {
        let g = chain();
        let finals: Vec<&str> = g.final_claims().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(finals, vec!["c1"]);
        assert!(g.validate_connectivity());
    }

    #[test]
    fn reachability_follows_chains_but_not_refutes() {
        let g = EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "a"),
                Node::claim("c2", "b"),
                Node::evidence("e1", "doc", "span", "hash"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Cites),
                Edge::new("c1", "c2", Relation::Supports),
                Edge::new("e1", "c2", Relation::Refutes),
            ],
        );
        let reach = g.reachable_from_evidence();
        assert_eq!(reach.get("c1"), Some(&true));
        assert_eq!(reach.get("c2"), Some(&true));

        let refuted_only = EvidenceGraph::from_parts(
            vec![Node::claim("c1", "a"), Node::evidence("e1", "doc", "s", "h")],
            vec![Edge::new("e1", "c1", Relation::Refutes)],
        );
        assert!(!refuted_only.validate_connectivity());
    }

    #[test]
    fn without_edge_shares_nodes_and_drops_one_edge() {
        let g = chain();
        let view = g.without_edge(0);
        assert_eq!(view.edges().len(), 1);
        assert!(std::ptr::eq(view.nodes(), g.nodes()));
        // c1 lost its only backing edge.
        assert!(!view.validate_connectivity());
        assert_eq!(g.edges().len(), 2);
    }

    #[test]
    fn dangling_edges_do_not_break_reachability() {
        let g = EvidenceGraph::from_parts(
            vec![Node::evidence("e1", "doc", "s", "h")],
            vec![Edge::new("e1", "ghost", Relation::Supports)],
        );
        let reach = g.reachable_from_evidence();
        assert_eq!(reach.len(), 1);
        assert!(g.validate_connectivity());
    }

    #[test]
    fn validate_collects_every_violation() {
        let g = EvidenceGraph::from_parts(
            vec![
                Node::claim("c1", "a"),
                Node::claim("c1", "a again"),
                Node::claim("c2", "unbacked"),
                Node::evidence("e1", "doc", "s", "h"),
            ],
            vec![
                Edge::new("e1", "c1", Relation::Supports),
                Edge::new("e1", "missing", Relation::Supports),
            ],
        );
        let violations = validate(&g);
        assert_eq!(
            violations,
            vec![
                Violation::DuplicateNodeId { id: "c1".into() },
                Violation::MissingEdgeTarget {
                    source: "e1".into(),
                    target: "missing".into()
                },
                Violation::UnreachableFinalClaims {
                    claims: vec!["c2".into()]
                },
            ]
        );
    }

    #[test]
    fn canonical_form_fills_absent_fields_with_null() {
        let g = EvidenceGraph::from_parts(vec![Node::claim("c1", "x").with_lang("en")], vec![]);
        let json = serde_json::to_value(g.to_canonical_form()).expect("serialize");
        let node = &json["nodes"][0];
        assert_eq!(node["type"], "claim");
        assert_eq!(node["text"], "x");
        assert_eq!(node["lang"], "en");
        assert!(node["span"].is_null());
        assert!(node["hash"].is_null());
    }
}

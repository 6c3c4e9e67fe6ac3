//! Graph compiler: untyped records → validated [`EvidenceGraph`].
//!
//! Input is the loose JSON shape produced by planners and human labelling:
//!
//! ```text
//! { "nodes": [ {id, type, text?, url?, span?, hash?, code?, result?,
//!               premise?, hypothesis?, lang?}, ... ],
//!   "edges": [ {source, target, type}, ... ] }
//! ```
//!
//! Unknown keys are ignored. Unknown `type` tags are a [`SchemaError`].
//! After typing, nodes are sorted by id and edges by `(source, target, type)`
//! so that logically identical inputs compile to identical graphs, then the
//! graph goes through structural validation.

use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::schema::{validate, Edge, EvidenceGraph, Node, NodeBody, NodeKind, SchemaError, Violation};

// ============================================================================
// Raw records
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub premise: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation: String,
}

impl RawNode {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }
}

/// Accept strings and numbers (`"result": 4` reads as `"4"`); `null` is absent.
fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

impl TryFrom<&RawNode> for Node {
    type Error = SchemaError;

    fn try_from(raw: &RawNode) -> Result<Self, Self::Error> {
        let kind: NodeKind = raw.kind.parse()?;
        let body = match kind {
            NodeKind::Claim => NodeBody::Claim {
                text: raw.text.clone(),
            },
            NodeKind::Evidence => NodeBody::Evidence {
                url: raw.url.clone(),
                span: raw.span.clone(),
                hash: raw.hash.clone(),
            },
            NodeKind::Calc => NodeBody::Calc {
                code: raw.code.clone(),
                result: raw.result.clone(),
            },
            NodeKind::Entailment => NodeBody::Entailment {
                premise: raw.premise.clone(),
                hypothesis: raw.hypothesis.clone(),
            },
        };
        Ok(Node {
            id: raw.id.clone(),
            body,
            lang: raw.lang.clone(),
        })
    }
}

impl TryFrom<&RawEdge> for Edge {
    type Error = SchemaError;

    fn try_from(raw: &RawEdge) -> Result<Self, Self::Error> {
        Ok(Edge::new(
            raw.source.clone(),
            raw.target.clone(),
            raw.relation.parse()?,
        ))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A structurally invalid graph, with every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid evidence graph: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CompileError {
    /// Structural violations, empty for schema errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            CompileError::Schema(_) => &[],
            CompileError::Validation(err) => &err.violations,
        }
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Type, normalize and validate a raw graph.
pub fn compile_graph(raw: &RawGraph) -> Result<EvidenceGraph, CompileError> {
    let mut nodes = raw
        .nodes
        .iter()
        .map(Node::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let mut edges = raw
        .edges
        .iter()
        .map(Edge::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    edges.sort_by(|a, b| {
        (a.source.as_str(), a.target.as_str(), a.relation.as_str()).cmp(&(
            b.source.as_str(),
            b.target.as_str(),
            b.relation.as_str(),
        ))
    });

    let graph = EvidenceGraph::from_parts(nodes, edges);
    let violations = validate(&graph);
    if !violations.is_empty() {
        tracing::debug!(
            violations = violations.len(),
            "evidence graph failed structural validation"
        );
        return Err(ValidationError { violations }.into());
    }

    tracing::debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "compiled evidence graph"
    );
    Ok(graph)
}

/// Compile from an already-parsed JSON value.
pub fn compile_value(value: serde_json::Value) -> Result<EvidenceGraph, CompileError> {
    let raw: RawGraph = serde_json::from_value(value).map_err(malformed)?;
    compile_graph(&raw)
}

/// Compile from JSON text.
pub fn compile_json(text: &str) -> Result<EvidenceGraph, CompileError> {
    let raw: RawGraph = serde_json::from_str(text).map_err(malformed)?;
    compile_graph(&raw)
}

fn malformed(err: serde_json::Error) -> SchemaError {
    SchemaError::Malformed {
        message: err.to_string(),
    }
}

//! Paladin Evidence Graph Language (EGL)
//!
//! Typed proof graphs for proof-carrying answers: an answer's claims,
//! the evidence spans, calculations and entailments backing them, and the
//! edges relating them.
//!
//! - `schema`: node/edge model, connectivity queries, structural validation,
//!   canonical serializable form
//! - `compiler`: untyped JSON records → sorted, validated `EvidenceGraph`
//! - `digest`: span content hashes and whole-graph digests

pub mod compiler;
pub mod digest;
pub mod schema;

pub use compiler::{compile_graph, compile_json, compile_value, CompileError, RawEdge, RawGraph, RawNode, ValidationError};
pub use digest::{content_hash, graph_digest};
pub use schema::{
    validate, CanonicalEdge, CanonicalGraph, CanonicalNode, Edge, EvidenceGraph, Node, NodeBody,
    NodeId, NodeKind, Relation, SchemaError, Topology, Violation,
};

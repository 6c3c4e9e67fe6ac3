//! Paladin pipeline: proof-carrying answers end to end.
//!
//! ```text
//! question ──► Retriever ──► Answerer ──► Planner ──► compile ──► verify
//!                 │              │            │                      │
//!             documents       answer      RawGraph          VerificationReport
//! ```
//!
//! The three collaborators are traits so smarter retrieval, answering or
//! planning can be swapped in; the reference implementations are a TF-IDF
//! retriever, a pattern-based answerer and a single-span planner. Proofs are
//! always compiled and verified by `paladin-egl` / `paladin-verifier`, never
//! trusted from the planner.
//!
//! Evaluation (`metrics`) runs the pipeline over labelled questions and
//! aggregates validity, minimality, support and citation scores.

pub mod answerer;
pub mod config;
pub mod corpus;
pub mod metrics;
pub mod planner;
pub mod retriever;
pub mod runner;
pub mod spans;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paladin_egl::RawGraph;

pub use answerer::HeuristicAnswerer;
pub use config::RunnerConfig;
pub use corpus::{build_corpus, load_documents, write_documents};
pub use metrics::{evaluate_dataset, load_examples, Example, Metrics, ReportCard};
pub use planner::SingleSpanPlanner;
pub use retriever::TfIdfRetriever;
pub use runner::{ProofCarryingAnswer, ProofRunner};
pub use spans::extract_span;

// ============================================================================
// Core types
// ============================================================================

/// A retrievable document. Unknown keys in document files are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to list {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("invalid answer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// ============================================================================
// Collaborators
// ============================================================================

pub trait Retriever: Send + Sync {
    /// Up to `top_k` documents, most relevant first.
    fn retrieve(&self, query: &str, top_k: usize) -> Vec<Document>;
}

pub trait Answerer: Send + Sync {
    fn answer(&self, query: &str, documents: &[Document]) -> String;
}

pub trait Planner: Send + Sync {
    /// Proof for `answer`, as untyped records. The runner compiles and
    /// verifies whatever comes back.
    fn plan(&self, query: &str, answer: &str, documents: &[Document]) -> RawGraph;
}

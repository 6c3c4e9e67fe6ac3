//! Question → proof-carrying answer.

use serde::{Deserialize, Serialize};

use paladin_egl::{
    compile_graph, CanonicalGraph, Edge, EvidenceGraph, Node, RawGraph, Violation,
};
use paladin_verifier::{VerificationDetails, Verifier};

use crate::answerer::HeuristicAnswerer;
use crate::config::RunnerConfig;
use crate::planner::SingleSpanPlanner;
use crate::{Answerer, PipelineError, Planner, Retriever};

/// An answer together with the proof offered for it and the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofCarryingAnswer {
    pub answer: String,
    pub graph: CanonicalGraph,
    pub valid: bool,
    /// Absent when the planned graph did not compile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<VerificationDetails>,
    /// Compile errors for a plan that could not be verified at all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

pub struct ProofRunner {
    retriever: Box<dyn Retriever>,
    answerer: Box<dyn Answerer>,
    planner: Box<dyn Planner>,
    verifier: Verifier,
    top_k: usize,
}

impl ProofRunner {
    /// Runner with the reference answerer and planner.
    pub fn new(retriever: impl Retriever + 'static, config: RunnerConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            retriever: Box::new(retriever),
            answerer: Box::new(HeuristicAnswerer::new()?),
            planner: Box::new(SingleSpanPlanner::new(config.span_window)),
            verifier: Verifier::new(config.verifier),
            top_k: config.top_k,
        })
    }

    pub fn with_answerer(mut self, answerer: impl Answerer + 'static) -> Self {
        self.answerer = Box::new(answerer);
        self
    }

    pub fn with_planner(mut self, planner: impl Planner + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    pub fn answer_and_proof(&self, query: &str) -> ProofCarryingAnswer {
        let documents = self.retriever.retrieve(query, self.top_k);
        let answer = self.answerer.answer(query, &documents);
        let raw = self.planner.plan(query, &answer, &documents);

        match compile_graph(&raw) {
            Ok(graph) => {
                let report = self.verifier.verify(&graph);
                ProofCarryingAnswer {
                    answer,
                    graph: graph.to_canonical_form(),
                    valid: report.valid,
                    details: Some(report.details),
                    violations: Vec::new(),
                }
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "planned proof failed to compile");
                ProofCarryingAnswer {
                    answer,
                    graph: best_effort_canonical(&raw),
                    valid: false,
                    details: None,
                    violations: err.violations().to_vec(),
                }
            }
        }
    }
}

/// Canonical form of whatever records type-check, without validation.
fn best_effort_canonical(raw: &RawGraph) -> CanonicalGraph {
    let nodes = raw
        .nodes
        .iter()
        .filter_map(|n| Node::try_from(n).ok())
        .collect();
    let edges = raw
        .edges
        .iter()
        .filter_map(|e| Edge::try_from(e).ok())
        .collect();
    EvidenceGraph::from_parts(nodes, edges).to_canonical_form()
}

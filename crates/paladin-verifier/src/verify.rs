//! Verification orchestrator.
//!
//! Runs the hash, support, minimality and numeric checks over one compiled
//! graph and folds them into a single verdict. Checker failures are recorded
//! in the report; `verify` itself has no error path.

use serde::{Deserialize, Serialize};

use paladin_egl::{EvidenceGraph, NodeKind, Relation};

use crate::config::VerifierConfig;
use crate::hashcheck::{check_source_binding, HashReport};
use crate::minimality::{check_minimality_with, MinimalityReport};
use crate::numeric;
use crate::truth_lens::{classify_with, SupportLevel};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentReport {
    pub passed: bool,
    /// One level per evidence→claim `supports` edge, in edge order.
    pub levels: Vec<SupportLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericReport {
    pub passed: bool,
    /// Ids of calc nodes whose expression did not reproduce the result.
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub hash: HashReport,
    pub entailment: EntailmentReport,
    pub minimality: MinimalityReport,
    pub numeric: NumericReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub details: VerificationDetails,
}

impl VerificationReport {
    /// Names of the checks that did not pass.
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let d = &self.details;
        [
            ("hash", d.hash.passed),
            ("entailment", d.entailment.passed),
            ("minimality", d.minimality.passed),
            ("numeric", d.numeric.passed),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed)
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn verify(&self, graph: &EvidenceGraph) -> VerificationReport {
        let hash = check_source_binding(graph);
        let entailment = self.check_entailment(graph);
        let minimality = check_minimality_with(&self.config, graph);
        let numeric = self.check_numeric(graph);

        let valid = hash.passed && entailment.passed && minimality.passed && numeric.passed;
        let report = VerificationReport {
            valid,
            details: VerificationDetails {
                hash,
                entailment,
                minimality,
                numeric,
            },
        };

        if valid {
            tracing::info!(
                nodes = graph.nodes().len(),
                edges = graph.edges().len(),
                "proof verified"
            );
        } else {
            tracing::info!(
                failed = ?report.failed_checks(),
                "proof rejected"
            );
        }
        report
    }

    fn check_entailment(&self, graph: &EvidenceGraph) -> EntailmentReport {
        let mut levels = Vec::new();
        for edge in graph.edges() {
            if edge.relation != Relation::Supports {
                continue;
            }
            let (Some(src), Some(tgt)) = (graph.get_node(&edge.source), graph.get_node(&edge.target))
            else {
                continue;
            };
            if src.kind() == NodeKind::Evidence && tgt.kind() == NodeKind::Claim {
                levels.push(classify_with(
                    &self.config.support,
                    src.span().unwrap_or_default(),
                    tgt.text().unwrap_or_default(),
                ));
            }
        }
        EntailmentReport {
            passed: levels.iter().all(|l| *l == SupportLevel::Supported),
            levels,
        }
    }

    fn check_numeric(&self, graph: &EvidenceGraph) -> NumericReport {
        let mut problems = Vec::new();
        for node in graph.nodes() {
            if node.kind() != NodeKind::Calc {
                continue;
            }
            let (Some(code), Some(expected)) = (node.code(), node.result()) else {
                continue;
            };
            if !numeric::check_with(code, expected, &self.config.numeric) {
                tracing::warn!(node = %node.id, code, expected, "calculation did not reproduce");
                problems.push(node.id.clone());
            }
        }
        NumericReport {
            passed: problems.is_empty(),
            problems,
        }
    }
}

/// Verify with the default configuration.
pub fn verify(graph: &EvidenceGraph) -> VerificationReport {
    Verifier::default().verify(graph)
}

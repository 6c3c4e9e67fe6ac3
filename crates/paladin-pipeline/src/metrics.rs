//! Evaluation over labelled questions.
//!
//! | metric               | per example                                           |
//! |----------------------|-------------------------------------------------------|
//! | `pvr`                | 1 if the proof verified                               |
//! | `minimality`         | `1 - removable / max(edges, 1)`                       |
//! | `truth_consistency`  | fraction of support levels that are `supported`       |
//! | `citation_precision` | fraction of evidence spans containing the gold answer |
//! | `latency_ms`         | wall time of `answer_and_proof`                       |
//!
//! Every metric is the mean over examples; an empty dataset scores all zeros.

use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paladin_egl::NodeKind;
use paladin_verifier::SupportLevel;

use crate::runner::{ProofCarryingAnswer, ProofRunner};
use crate::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub pvr: f64,
    pub minimality: f64,
    pub truth_consistency: f64,
    pub citation_precision: f64,
    pub latency_ms: f64,
}

/// Read a JSONL dataset. Blank lines and lines that do not parse as an
/// example object are skipped.
pub fn load_examples(path: impl AsRef<Path>) -> Result<Vec<Example>, PipelineError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_examples(&text))
}

pub fn parse_examples(text: &str) -> Vec<Example> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<Example>(line.trim()) {
            Ok(example) => Some(example),
            Err(err) => {
                tracing::warn!(line = i + 1, error = %err, "skipping malformed example");
                None
            }
        })
        .collect()
}

fn minimality_score(out: &ProofCarryingAnswer) -> f64 {
    let removable = out
        .details
        .as_ref()
        .map(|d| d.minimality.removable.len())
        .unwrap_or(0);
    let edges = out.graph.edges.len().max(1);
    1.0 - removable as f64 / edges as f64
}

fn truth_score(out: &ProofCarryingAnswer) -> f64 {
    let levels = out
        .details
        .as_ref()
        .map(|d| d.entailment.levels.as_slice())
        .unwrap_or(&[]);
    if levels.is_empty() {
        return 0.0;
    }
    let supported = levels
        .iter()
        .filter(|l| **l == SupportLevel::Supported)
        .count();
    supported as f64 / levels.len() as f64
}

fn citation_score(out: &ProofCarryingAnswer, gold: &str) -> f64 {
    let gold = gold.to_lowercase();
    let spans: Vec<&str> = out
        .graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Evidence)
        .map(|n| n.span.as_deref().unwrap_or_default())
        .collect();
    if spans.is_empty() {
        return 0.0;
    }
    let hits = spans
        .iter()
        .filter(|span| !gold.is_empty() && span.to_lowercase().contains(&gold))
        .count();
    hits as f64 / spans.len() as f64
}

pub fn evaluate_dataset(runner: &ProofRunner, examples: &[Example]) -> Metrics {
    if examples.is_empty() {
        return Metrics::default();
    }

    let mut totals = Metrics::default();
    for example in examples {
        let started = Instant::now();
        let out = runner.answer_and_proof(&example.question);
        totals.latency_ms += started.elapsed().as_secs_f64() * 1000.0;

        if out.valid {
            totals.pvr += 1.0;
        }
        totals.minimality += minimality_score(&out);
        totals.truth_consistency += truth_score(&out);
        totals.citation_precision += citation_score(&out, &example.answer);
    }

    let n = examples.len() as f64;
    let metrics = Metrics {
        pvr: totals.pvr / n,
        minimality: totals.minimality / n,
        truth_consistency: totals.truth_consistency / n,
        citation_precision: totals.citation_precision / n,
        latency_ms: totals.latency_ms / n,
    };
    tracing::info!(
        examples = examples.len(),
        pvr = metrics.pvr,
        minimality = metrics.minimality,
        "evaluation finished"
    );
    metrics
}

/// Metrics plus provenance, as written by `paladin card`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCard {
    pub generated_at: DateTime<Utc>,
    pub docs: String,
    pub dataset: String,
    pub metrics: Metrics,
}

impl ReportCard {
    pub fn new(docs: impl Into<String>, dataset: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            generated_at: Utc::now(),
            docs: docs.into(),
            dataset: dataset.into(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::retriever::TfIdfRetriever;
    use crate::Document;
    use approx::assert_relative_eq;

    fn runner() -> ProofRunner {
        ProofRunner::new(
            TfIdfRetriever::new(vec![
                Document::new("earth", "Earth is round."),
                Document::new("france", "Paris is the capital of France."),
            ]),
            RunnerConfig::default(),
        )
        .expect("runner")
    }

    #[test]
    fn parse_skips_blank_and_malformed_lines() {
        let text = "{\"question\": \"q1\", \"answer\": \"a1\"}\n\n not json\n[1,2]\n{\"question\": \"q2\"}\n";
        let examples = parse_examples(text);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].answer, "");
    }

    #[test]
    fn empty_dataset_scores_zero() {
        assert_eq!(evaluate_dataset(&runner(), &[]), Metrics::default());
    }

    #[test]
    fn grounded_questions_score_perfectly() {
        let examples = vec![
            Example {
                question: "Is Earth round?".into(),
                answer: "round".into(),
            },
            Example {
                question: "What is the capital of France?".into(),
                answer: "Paris".into(),
            },
        ];
        let m = evaluate_dataset(&runner(), &examples);
        assert_relative_eq!(m.pvr, 1.0);
        assert_relative_eq!(m.minimality, 1.0);
        assert_relative_eq!(m.truth_consistency, 1.0);
        assert_relative_eq!(m.citation_precision, 1.0);
        assert!(m.latency_ms >= 0.0);
    }

    #[test]
    fn missing_gold_answer_never_counts_as_cited() {
        let examples = vec![Example {
            question: "Is Earth round?".into(),
            answer: String::new(),
        }];
        let m = evaluate_dataset(&runner(), &examples);
        assert_relative_eq!(m.citation_precision, 0.0);
        assert_relative_eq!(m.pvr, 1.0);
    }

    #[test]
    fn report_card_timestamp_is_rfc3339() {
        let card = ReportCard::new("docs.json", "set.jsonl", Metrics::default());
        let json = serde_json::to_value(&card).expect("serialize");
        let stamp = json["generated_at"].as_str().expect("string timestamp");
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(json["metrics"]["pvr"], 0.0);
    }
}

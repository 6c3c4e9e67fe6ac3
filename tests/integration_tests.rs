//! Integration tests for the complete Paladin pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Raw JSON → Compiler → Verifier → report
//! - Documents on disk → Retriever → Planner → verified answer → metrics
//!
//! Run with: cargo test --test integration_tests

use paladin_egl::{compile_value, content_hash, graph_digest, CompileError, Violation};
use paladin_pipeline::{
    build_corpus, evaluate_dataset, load_examples, write_documents, ProofRunner, RunnerConfig,
    TfIdfRetriever,
};
use paladin_verifier::{
    check_minimality, check_numeric, classify, date_on_or_after, verify, SupportLevel,
};
use serde_json::json;
use tempfile::tempdir;

fn earth_graph(hash: String) -> serde_json::Value {
    json!({
        "nodes": [
            {"id": "c1", "type": "claim", "text": "Earth is round"},
            {"id": "e1", "type": "evidence", "url": "doc1", "span": "Earth is round", "hash": hash}
        ],
        "edges": [{"source": "e1", "target": "c1", "type": "supports"}]
    })
}

// ============================================================================
// Compiler + verifier
// ============================================================================

#[test]
fn test_grounded_claim_verifies_end_to_end() {
    let graph = compile_value(earth_graph(content_hash("Earth is round"))).expect("compile");
    let report = verify(&graph);
    assert!(report.valid);
    assert!(report.details.hash.passed);
    assert!(report.details.minimality.passed);
    assert!(report.details.minimality.removable.is_empty());
    assert_eq!(report.details.entailment.levels, vec![SupportLevel::Supported]);
}

#[test]
fn test_tampered_hash_is_caught() {
    let graph = compile_value(earth_graph("f".repeat(64))).expect("compile");
    let report = verify(&graph);
    assert!(!report.valid);
    assert_eq!(report.details.hash.problems, vec!["hash mismatch for e1"]);
}

#[test]
fn test_compile_is_order_independent() {
    let forward = json!({
        "nodes": [
            {"id": "c1", "type": "claim", "text": "x"},
            {"id": "e1", "type": "evidence", "span": "x", "hash": content_hash("x")},
            {"id": "e2", "type": "evidence", "span": "x", "hash": content_hash("x")}
        ],
        "edges": [
            {"source": "e1", "target": "c1", "type": "supports"},
            {"source": "e2", "target": "c1", "type": "cites"}
        ]
    });
    let backward = json!({
        "nodes": [
            {"id": "e2", "type": "evidence", "span": "x", "hash": content_hash("x")},
            {"id": "c1", "type": "claim", "text": "x"},
            {"id": "e1", "type": "evidence", "span": "x", "hash": content_hash("x")}
        ],
        "edges": [
            {"source": "e2", "target": "c1", "type": "cites"},
            {"source": "e1", "target": "c1", "type": "supports"}
        ]
    });
    let a = compile_value(forward).expect("compile");
    let b = compile_value(backward).expect("compile");
    assert_eq!(a.to_canonical_form(), b.to_canonical_form());
    assert_eq!(graph_digest(&a).expect("digest"), graph_digest(&b).expect("digest"));
}

#[test]
fn test_validation_reports_all_violations() {
    let err = compile_value(json!({
        "nodes": [
            {"id": "c1", "type": "claim", "text": "t"},
            {"id": "c1", "type": "claim", "text": "t"},
            {"id": "e1", "type": "evidence", "span": "t", "hash": "h"}
        ],
        "edges": [
            {"source": "e1", "target": "c1", "type": "supports"},
            {"source": "e1", "target": "nowhere", "type": "supports"}
        ]
    }))
    .unwrap_err();

    assert!(matches!(err, CompileError::Validation(_)));
    let violations = err.violations();
    assert!(violations.contains(&Violation::DuplicateNodeId { id: "c1".into() }));
    assert!(violations.contains(&Violation::MissingEdgeTarget {
        source: "e1".into(),
        target: "nowhere".into(),
    }));
}

#[test]
fn test_derived_claims_are_not_final() {
    // c2 has an incoming derives edge, so only c1 is final. Dropping the
    // derives edge would make c2 final and unreachable, so it is load-bearing.
    let graph = compile_value(json!({
        "nodes": [
            {"id": "c1", "type": "claim", "text": "Water boils at 100C"},
            {"id": "c2", "type": "claim", "text": "Water boils"},
            {"id": "e1", "type": "evidence", "span": "Water boils at 100C", "hash": content_hash("Water boils at 100C")}
        ],
        "edges": [
            {"source": "e1", "target": "c1", "type": "supports"},
            {"source": "c1", "target": "c2", "type": "derives"}
        ]
    }))
    .expect("compile");
    let finals: Vec<&str> = graph.final_claims().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(finals, vec!["c1"]);
    assert!(verify(&graph).valid);
}

// ============================================================================
// Individual checks
// ============================================================================

#[test]
fn test_support_levels() {
    let hypothesis = "France's capital is Paris";
    assert_eq!(
        classify("The capital of France is Paris.", hypothesis),
        SupportLevel::Supported
    );
    assert_eq!(
        classify("The capital of France is not Paris.", hypothesis),
        SupportLevel::Contradicted
    );
}

#[test]
fn test_numeric_recomputation_fails_closed() {
    assert!(check_numeric("2+2", "4"));
    assert!(!check_numeric("2+2", "5"));
    assert!(!check_numeric("__import__('os')", "anything"));
    assert!(!check_numeric("1/0", "0"));
}

#[test]
fn test_minimality_edge_cases() {
    let single = compile_value(earth_graph(content_hash("Earth is round"))).expect("compile");
    let report = check_minimality(&single);
    assert!(report.passed);

    let doubled = compile_value(json!({
        "nodes": [
            {"id": "c1", "type": "claim", "text": "Earth is round"},
            {"id": "e1", "type": "evidence", "span": "Earth is round", "hash": content_hash("Earth is round")},
            {"id": "e2", "type": "evidence", "span": "Earth is round", "hash": content_hash("Earth is round")}
        ],
        "edges": [
            {"source": "e1", "target": "c1", "type": "supports"},
            {"source": "e2", "target": "c1", "type": "supports"}
        ]
    }))
    .expect("compile");
    let report = check_minimality(&doubled);
    assert!(!report.passed);
    assert_eq!(report.removable, vec!["e1->c1", "e2->c1"]);
    assert!(!verify(&doubled).valid);

    let edgeless = compile_value(json!({
        "nodes": [{"id": "e1", "type": "evidence", "span": "s", "hash": content_hash("s")}],
        "edges": []
    }))
    .expect("no claims means nothing to reach");
    let report = check_minimality(&edgeless);
    assert!(!report.passed);
    assert!(report.removable.is_empty());
}

#[test]
fn test_date_threshold() {
    assert_eq!(date_on_or_after("2016-11-01", "%Y-%m-%d", "2016-01-01"), Ok(true));
    assert!(date_on_or_after("November 2016", "%Y-%m-%d", "2016-01-01").is_err());
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_corpus_to_metrics() {
    let dir = tempdir().expect("tempdir");
    let corpus = dir.path().join("corpus");
    std::fs::create_dir(&corpus).expect("mkdir");
    std::fs::write(corpus.join("earth.txt"), "Earth is round.").expect("write");
    std::fs::write(corpus.join("paris.txt"), "Paris is the capital of France.").expect("write");

    let docs = build_corpus(&corpus).expect("corpus");
    let docs_path = dir.path().join("docs.json");
    write_documents(&docs_path, &docs).expect("write docs");

    let dataset = dir.path().join("set.jsonl");
    std::fs::write(
        &dataset,
        "{\"question\": \"Is Earth round?\", \"answer\": \"round\"}\n\nnot json\n{\"question\": \"What is the capital of France?\", \"answer\": \"Paris\"}\n",
    )
    .expect("write dataset");

    let retriever = TfIdfRetriever::from_json(&docs_path).expect("retriever");
    let runner = ProofRunner::new(retriever, RunnerConfig::default()).expect("runner");

    let answer = runner.answer_and_proof("What is the capital of France?");
    assert_eq!(answer.answer, "Paris is the capital of France");
    assert!(answer.valid);

    let examples = load_examples(&dataset).expect("examples");
    assert_eq!(examples.len(), 2);
    let metrics = evaluate_dataset(&runner, &examples);
    assert_eq!(metrics.pvr, 1.0);
    assert_eq!(metrics.citation_precision, 1.0);
}

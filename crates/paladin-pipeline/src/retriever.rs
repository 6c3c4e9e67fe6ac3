//! TF-IDF document retriever.
//!
//! Indexes are built eagerly at construction. Scores are cosine similarity
//! between TF-IDF vectors, scaled by `1 + Σ idf` over the distinct query
//! tokens the document contains, so documents sharing rare query terms rank
//! first.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::{Document, PipelineError, Retriever};

type SparseVector = HashMap<String, f64>;

/// Lowercased alphanumeric runs; everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, usize> {
    let mut tf: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        *tf.entry(t.as_str()).or_default() += 1;
    }
    tf
}

fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let dot: f64 = a
        .iter()
        .map(|(k, v)| v * b.get(k).copied().unwrap_or(0.0))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone, Default)]
pub struct TfIdfRetriever {
    docs: Vec<Document>,
    idf: HashMap<String, f64>,
    vectors: Vec<SparseVector>,
    token_sets: Vec<HashSet<String>>,
}

impl TfIdfRetriever {
    pub fn new(docs: Vec<Document>) -> Self {
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(&d.text)).collect();
        let token_sets: Vec<HashSet<String>> = tokenized
            .iter()
            .map(|tokens| tokens.iter().cloned().collect())
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for set in &token_sets {
            for term in set {
                *df.entry(term.as_str()).or_default() += 1;
            }
        }

        // Smoothed IDF; an empty corpus counts as one document.
        let n = docs.len().max(1) as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| (term.to_string(), ((n + 1.0) / (count as f64 + 1.0)).ln() + 1.0))
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| Self::vectorize_with(&idf, tokens))
            .collect();

        tracing::debug!(documents = docs.len(), terms = idf.len(), "built tf-idf index");

        Self {
            docs,
            idf,
            vectors,
            token_sets,
        }
    }

    /// Load a JSON array of documents. A missing file gives an empty
    /// retriever; an unreadable or malformed one is an error.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "document file not found, retriever is empty");
            return Ok(Self::default());
        }
        let docs = crate::corpus::load_documents(path)?;
        Ok(Self::new(docs))
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Term weights are `count / distinct_terms * idf`; terms outside the
    /// vocabulary weigh zero.
    fn vectorize_with(idf: &HashMap<String, f64>, tokens: &[String]) -> SparseVector {
        let tf = term_frequencies(tokens);
        let distinct = tf.len() as f64;
        tf.into_iter()
            .map(|(term, count)| {
                let weight = idf.get(term).copied().unwrap_or(0.0);
                (term.to_string(), count as f64 / distinct * weight)
            })
            .collect()
    }

    /// Scores for every document, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_tokens = tokenize(query);
        let query_vec = Self::vectorize_with(&self.idf, &query_tokens);
        let distinct: HashSet<&String> = query_tokens.iter().collect();

        self.vectors
            .iter()
            .zip(&self.token_sets)
            .map(|(doc_vec, doc_tokens)| {
                let overlap: f64 = distinct
                    .iter()
                    .filter(|t| doc_tokens.contains(t.as_str()))
                    .map(|t| self.idf.get(t.as_str()).copied().unwrap_or(0.0))
                    .sum();
                cosine(&query_vec, doc_vec) * (1.0 + overlap)
            })
            .collect()
    }
}

impl Retriever for TfIdfRetriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Vec<Document> {
        if self.docs.is_empty() {
            return Vec::new();
        }
        let mut ranked: Vec<(f64, usize)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .map(|(i, s)| (s, i))
            .collect();
        // Stable: ties keep corpus order.
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(top_k)
            .map(|(_, i)| self.docs[i].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corpus() -> TfIdfRetriever {
        TfIdfRetriever::new(vec![
            Document::new("paris", "Paris is the capital of France."),
            Document::new("berlin", "Berlin is the capital of Germany."),
            Document::new("water", "Water boils at 100 degrees Celsius at sea level."),
        ])
    }

    #[test]
    fn tokenizer_splits_on_punctuation() {
        assert_eq!(tokenize("France's capital, Paris!"), vec!["france", "s", "capital", "paris"]);
    }

    #[test]
    fn ranks_rare_term_matches_first() {
        let top = corpus().retrieve("What is the capital of France?", 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "paris");
        assert_eq!(top[1].id, "berlin");
    }

    #[test]
    fn top_k_bounds_results() {
        assert_eq!(corpus().retrieve("water", 1)[0].id, "water");
        assert_eq!(corpus().retrieve("water", 10).len(), 3);
        assert!(corpus().retrieve("water", 0).is_empty());
    }

    #[test]
    fn unmatched_query_keeps_corpus_order() {
        let ids: Vec<String> = corpus()
            .retrieve("zebra", 3)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["paris", "berlin", "water"]);
    }

    #[test]
    fn idf_is_smoothed() {
        let r = corpus();
        // "capital" appears in 2 of 3 documents.
        assert_relative_eq!(r.idf["capital"], (4.0_f64 / 3.0).ln() + 1.0);
        // "france" appears in 1 of 3.
        assert_relative_eq!(r.idf["france"], 2.0_f64.ln() + 1.0);
    }

    #[test]
    fn empty_retriever_returns_nothing() {
        assert!(TfIdfRetriever::default().retrieve("anything", 3).is_empty());
        let missing = TfIdfRetriever::from_json("/nonexistent/paladin/docs.json").expect("empty");
        assert!(missing.is_empty());
    }
}

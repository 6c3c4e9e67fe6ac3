//! Truth lens: lexical support classification.
//!
//! Classifies a (premise, hypothesis) pair as supported, contradicted or
//! unverifiable using whitespace tokens and literal negation phrases. This is
//! a heuristic by intent; the decision rules are fixed and configurable only
//! through [`SupportConfig`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SupportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    Supported,
    Contradicted,
    Unverifiable,
}

impl SupportLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SupportLevel::Supported => "supported",
            SupportLevel::Contradicted => "contradicted",
            SupportLevel::Unverifiable => "unverifiable",
        }
    }
}

impl fmt::Display for SupportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased whitespace tokens. No stemming, punctuation is kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Fraction of hypothesis tokens present in the premise token set, or `None`
/// for an empty hypothesis.
fn overlap_ratio(premise_tokens: &HashSet<String>, hypothesis_tokens: &[String]) -> Option<f64> {
    if hypothesis_tokens.is_empty() {
        return None;
    }
    let matches = hypothesis_tokens
        .iter()
        .filter(|t| premise_tokens.contains(t.as_str()))
        .count();
    Some(matches as f64 / hypothesis_tokens.len() as f64)
}

/// Classify with the default constants.
pub fn classify(premise: &str, hypothesis: &str) -> SupportLevel {
    classify_with(&SupportConfig::default(), premise, hypothesis)
}

/// Classify a premise/hypothesis pair.
///
/// Contradiction (`"<marker> <token>"` occurring in the lowercased premise)
/// is checked first and wins over any overlap.
#[allow(clippy::if_same_then_else)]
pub fn classify_with(config: &SupportConfig, premise: &str, hypothesis: &str) -> SupportLevel {
    let hypothesis_tokens = tokenize(hypothesis);
    if hypothesis_tokens.is_empty() {
        return SupportLevel::Unverifiable;
    }

    let premise_lower = premise.to_lowercase();
    for marker in &config.negation_markers {
        for token in &hypothesis_tokens {
            if premise_lower.contains(&format!("{marker} {token}")) {
                return SupportLevel::Contradicted;
            }
        }
    }

    let premise_tokens: HashSet<String> = tokenize(premise).into_iter().collect();
    let Some(ratio) = overlap_ratio(&premise_tokens, &hypothesis_tokens) else {
        return SupportLevel::Unverifiable;
    };

    if ratio >= config.support_threshold {
        SupportLevel::Supported
    } else if ratio <= config.unverifiable_threshold {
        SupportLevel::Unverifiable
    } else {
        // Partial overlap has no level of its own.
        SupportLevel::Unverifiable
    }
}

/// Default threshold for [`entails`].
pub const DEFAULT_ENTAILMENT_THRESHOLD: f64 = 0.5;

/// Lexical entailment: at least `threshold` of the hypothesis tokens appear in
/// the premise. An empty hypothesis is never entailed. Negation is ignored.
pub fn entails(premise: &str, hypothesis: &str, threshold: f64) -> bool {
    let premise_tokens: HashSet<String> = tokenize(premise).into_iter().collect();
    overlap_ratio(&premise_tokens, &tokenize(hypothesis))
        .map(|ratio| ratio >= threshold)
        .unwrap_or(false)
}

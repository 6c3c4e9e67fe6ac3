//! Verifier configuration.
//!
//! Every knob has a `Default` matching the reference decision rules, and all
//! structs deserialize with per-field defaults so partial config files work.

use serde::{Deserialize, Serialize};

/// Decision constants for the lexical support classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    /// Markers that, followed by a hypothesis token, signal contradiction.
    pub negation_markers: Vec<String>,
    /// Overlap ratio at or above which a hypothesis counts as supported.
    pub support_threshold: f64,
    /// Overlap ratio at or below which a hypothesis is unverifiable.
    ///
    /// Ratios strictly between the two thresholds are also unverifiable.
    pub unverifiable_threshold: f64,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            negation_markers: vec!["not".to_string(), "no".to_string(), "never".to_string()],
            support_threshold: 0.5,
            unverifiable_threshold: 0.1,
        }
    }
}

/// Size bounds for the arithmetic evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericLimits {
    /// Maximum expression length in bytes.
    pub max_expression_len: usize,
    /// Maximum parenthesis nesting depth.
    pub max_nesting_depth: usize,
    /// Maximum number of operator characters.
    pub max_operators: usize,
}

impl Default for NumericLimits {
    fn default() -> Self {
        Self {
            max_expression_len: 1024,
            max_nesting_depth: 64,
            max_operators: 256,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub support: SupportConfig,
    pub numeric: NumericLimits,
    /// Run per-edge minimality tests on the rayon pool. Output order is the
    /// same either way.
    pub parallel_minimality: bool,
}

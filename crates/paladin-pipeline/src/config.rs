use serde::{Deserialize, Serialize};

use paladin_verifier::VerifierConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Documents handed to the answerer and planner.
    pub top_k: usize,
    /// Maximum words in an extracted evidence span.
    pub span_window: usize,
    pub verifier: VerifierConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            span_window: 40,
            verifier: VerifierConfig::default(),
        }
    }
}

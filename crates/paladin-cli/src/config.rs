//! `--config` file handling.
//!
//! ```toml
//! [verifier]
//! parallel_minimality = true
//!
//! [verifier.support]
//! support_threshold = 0.6
//!
//! [runner]
//! top_k = 5
//! ```
//!
//! The top-level `[verifier]` table applies to every command, including the
//! verifier embedded in `ask`/`eval`/`card`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use paladin_pipeline::RunnerConfig;
use paladin_verifier::VerifierConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaladinConfig {
    pub verifier: VerifierConfig,
    pub runner: RunnerConfig,
}

impl PaladinConfig {
    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            verifier: self.verifier.clone(),
            ..self.runner.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(PaladinConfig::load(None).expect("defaults"), PaladinConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config: PaladinConfig = toml::from_str(
            r#"
            [verifier]
            parallel_minimality = true

            [verifier.support]
            support_threshold = 0.6

            [runner]
            top_k = 5
            "#,
        )
        .expect("parse");

        let runner = config.runner_config();
        assert_eq!(runner.top_k, 5);
        assert_eq!(runner.span_window, 40);
        assert!(runner.verifier.parallel_minimality);
        assert_eq!(runner.verifier.support.support_threshold, 0.6);
        assert_eq!(runner.verifier.numeric.max_operators, 256);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let err = PaladinConfig::load(Some(Path::new("/nonexistent/paladin.toml"))).unwrap_err();
        assert!(err.to_string().contains("paladin.toml"));
    }
}

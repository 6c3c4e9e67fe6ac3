//! Paladin verifier: deterministic checks over compiled evidence graphs.
//!
//! ## Checks
//!
//! - `hashcheck`: every evidence span matches its recorded SHA-256
//! - `truth_lens`: lexical support classification of evidence against claims
//! - `numeric`: calc node expressions are recomputed in a restricted grammar
//! - `temporal`: date threshold comparison
//! - `minimality`: every edge of the proof is load-bearing
//!
//! `verify` runs the first, second, third and fifth over one graph and folds
//! them into a [`VerificationReport`]. Inputs are assumed structurally valid
//! (see `paladin_egl::compile_graph`); nothing here mutates a graph.

pub mod config;
pub mod hashcheck;
pub mod minimality;
pub mod numeric;
pub mod temporal;
pub mod truth_lens;
pub mod verify;

pub use config::{NumericLimits, SupportConfig, VerifierConfig};
pub use hashcheck::{check_source_binding, HashReport};
pub use minimality::{check_minimality, check_minimality_with, MinimalityReport};
pub use numeric::{check as check_numeric, evaluate, NumericError, Value};
pub use temporal::{date_on_or_after, DateError};
pub use truth_lens::{classify, classify_with, entails, SupportLevel, DEFAULT_ENTAILMENT_THRESHOLD};
pub use verify::{
    verify, EntailmentReport, NumericReport, VerificationDetails, VerificationReport, Verifier,
};

//! Consensus across providers
//!
//! A deliberately coarse comparison of final answers: shared vocabulary, not
//! meaning. See [`analyze`].

pub mod analyzer;

pub use analyzer::{Confidence, ConsensusSummary, analyze};

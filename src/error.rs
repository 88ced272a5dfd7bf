//! Error types raised inside the analysis engine.

use thiserror::Error;

/// Per-mention failures. The engine contains these at the batch boundary;
/// they never abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    /// The mention has no usable text once whitespace and punctuation are removed.
    #[error("Skill text is empty after normalization: {raw:?}")]
    InvalidSkillText { raw: String },
}

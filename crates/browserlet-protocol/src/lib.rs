//! Shared data model for Browserlet.
//!
//! This crate defines the serializable types the rest of the workspace
//! exchanges: scripts and steps loaded from BSL, the closed hint-type table,
//! DOM-reference-free candidate descriptors, and the structured failure
//! diagnostics the cascade resolver produces. It has no I/O of its own —
//! every other crate depends on it, anchoring the rest of the workspace.
#![warn(missing_docs)]

mod candidate;
mod diagnostic;
mod exit;
mod hint;
mod step;

pub use candidate::{
    Candidate, CandidateAttributes, PositionIndex, StructuralContext, CLASS_TOKENS_MAX,
    VISIBLE_TEXT_MAX,
};
pub use diagnostic::{Confidence, FailureDiagnostic, HintScore, ScoredCandidate, Stage};
pub use exit::ExitCode;
pub use hint::{Hint, HintType, HintValue};
pub use step::{
    parse_short_duration, ActionKind, DurationParseError, Output, Script, Step, Target,
    TransformName,
};

//! The cascade resolver: five ordered stages mapping a step's weighted
//! hints to a unique live-DOM element, or a structured [`FailureDiagnostic`].
//!
//! # Stable API Surface
//! - [`resolve`] / [`Resolution`]: the entry point the runner calls.
//! - [`ResolverConfig`]: threshold, uniqueness margin, and scan limits.
//! - [`MicroPromptProvider`]: the optional stage-4 hook.
#![warn(missing_docs)]

mod cascade;
mod config;
mod micro_prompt;
mod scoring;

pub use browserlet_protocol::FailureDiagnostic;
pub use cascade::{resolve, Resolution};
pub use config::ResolverConfig;
pub use micro_prompt::MicroPromptProvider;
pub use scoring::{matches_hint, score_candidate};

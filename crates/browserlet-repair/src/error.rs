//! Error type for the repair engine.
//!
//! The engine itself never surfaces these to a caller: every
//! public entry point that talks to a provider catches its own errors and
//! degrades to "zero suggestions". This type exists so providers and the
//! audit-log writer have something concrete to return internally, and so
//! `apply_repair`'s on-disk rewrite failure (a genuine I/O problem, not a
//! provider hiccup) has a way to surface.

use thiserror::Error;

/// Errors raised while talking to a repair provider or applying a repair.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider's HTTP call failed.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider responded, but not with the expected JSON shape.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// No API key or endpoint was configured for the selected provider.
    #[error("provider {0} is not configured")]
    NotConfigured(&'static str),

    /// Rewriting the `.bsl` file on disk failed.
    #[error(transparent)]
    Rewrite(#[from] browserlet_bsl::Error),

    /// Writing the JSON audit-history entry failed.
    #[error("failed to write repair history at {path}: {message}")]
    AuditIo {
        /// Path of the history file.
        path: String,
        /// Underlying message.
        message: String,
    },
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

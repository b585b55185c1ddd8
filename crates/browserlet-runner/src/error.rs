//! Runner-level error type: infrastructure failures that abort a whole run
//! rather than a single step.

use thiserror::Error;

/// Errors that prevent a script from running at all.
#[derive(Debug, Error)]
pub enum Error {
    /// The `.bsl` file failed to load or parse.
    #[error(transparent)]
    Script(#[from] browserlet_bsl::Error),

    /// A vault operation failed (missing/corrupt vault, wrong password).
    #[error(transparent)]
    Vault(#[from] browserlet_vault::Error),

    /// The browser could not be launched, or another infrastructure
    /// dependency (disk, output directory) was unavailable.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

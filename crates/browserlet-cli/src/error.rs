//! Error handling for the `browserlet` binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for CLI operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while dispatching a CLI subcommand, ahead of
/// per-script exit-code discipline.
#[derive(Debug, Error)]
pub enum Error {
    /// The `.bsl` file failed to load or parse.
    #[error("script error: {0}")]
    Script(#[from] browserlet_bsl::Error),
    /// The browser failed to launch.
    #[error("browser error: {0}")]
    Dom(#[from] browserlet_dom::Error),
    /// A vault operation failed.
    #[error("vault error: {0}")]
    Vault(#[from] browserlet_vault::Error),
    /// The runner itself failed outside of per-step discipline (e.g. a
    /// corrupt session ledger).
    #[error("runner error: {0}")]
    Runner(#[from] browserlet_runner::Error),
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The target path for `test` is not a directory, or contains no
    /// `.bsl` scripts.
    #[error("{0}")]
    InvalidInput(String),
    /// A background task driving a blocking call panicked or was aborted.
    #[error("task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

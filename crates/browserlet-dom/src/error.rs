//! Error type for browser driver operations.

use thiserror::Error;

/// Errors raised while launching a browser or driving a page.
#[derive(Debug, Error)]
pub enum Error {
    /// The browser process could not be launched.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation to a URL did not complete.
    #[error("navigation to {url} failed: {message}")]
    Navigate {
        /// URL that was requested.
        url: String,
        /// Underlying message.
        message: String,
    },

    /// A DOM query (candidate scan or selector lookup) failed.
    #[error("query failed: {0}")]
    Query(String),

    /// The element referenced by an opaque ref could not be found; it may
    /// have been detached from the DOM between resolution and action.
    #[error("element reference {0:?} is stale or missing")]
    StaleReference(String),

    /// An action (click, type, select, …) failed against a resolved element.
    #[error("{action} failed: {message}")]
    Action {
        /// Name of the action that failed.
        action: &'static str,
        /// Underlying message.
        message: String,
    },

    /// Writing a screenshot to disk failed.
    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

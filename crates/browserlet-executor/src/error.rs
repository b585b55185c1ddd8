//! Error type for the action executor.

use thiserror::Error;

/// Errors raised while performing an action against a resolved element.
#[derive(Debug, Error)]
pub enum Error {
    /// The browser driver itself failed.
    #[error(transparent)]
    Driver(#[from] browserlet_dom::Error),

    /// A `wait_for` did not reach the requested state before its timeout.
    #[error("wait_for timed out after {elapsed_ms}ms waiting for {element_ref:?} to become {state}")]
    Timeout {
        /// The opaque element reference being waited on.
        element_ref: String,
        /// The requested visibility state.
        state: &'static str,
        /// Milliseconds actually waited.
        elapsed_ms: u128,
    },

    /// `select` could not find a matching option. The requested value is
    /// deliberately not included here: it may be a credential's plaintext
    /// after substitution, and this message reaches user-visible output and
    /// logs verbatim.
    #[error("no option matched the requested value")]
    OptionNotFound,

    /// An `extract` transform could not be applied to the extracted text.
    #[error("transform {transform} failed on {input:?}: {message}")]
    TransformFailed {
        /// Name of the transform.
        transform: &'static str,
        /// The text the transform was applied to.
        input: String,
        /// What went wrong.
        message: String,
    },

    /// Writing a screenshot to disk failed.
    #[error("failed to write screenshot to {path}: {message}")]
    ScreenshotIo {
        /// Destination path.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// A step's `timeout` value failed to parse.
    #[error(transparent)]
    DurationParse(#[from] browserlet_protocol::DurationParseError),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

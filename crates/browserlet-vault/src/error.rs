//! Error type for the credential vault.

use thiserror::Error;

/// Errors raised by vault storage, the derived-key cache, or the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// No vault file exists at the configured path.
    #[error("no vault found at {0}")]
    NotFound(String),

    /// A vault already exists at the configured path.
    #[error("a vault already exists at {0}")]
    AlreadyExists(String),

    /// The vault file exists but could not be parsed.
    #[error("vault file at {path} is corrupt: {message}")]
    Corrupt {
        /// The vault file path.
        path: String,
        /// What went wrong parsing it.
        message: String,
    },

    /// The submitted password failed to open the vault (AES-GCM auth-tag
    /// mismatch against the validation record).
    #[error("incorrect vault password")]
    WrongPassword,

    /// The vault is locked and no cached key is available.
    #[error("vault is locked")]
    Locked,

    /// No credential exists under the given alias.
    #[error("no credential named {0:?}")]
    AliasNotFound(String),

    /// A credential already exists under the given alias.
    #[error("a credential named {0:?} already exists")]
    AliasExists(String),

    /// Reading or writing a vault-related file failed.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// The file path involved.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// A request to the bridge failed validation. Never carries a
    /// credential value or id, to keep secrets out of error messages.
    #[error("bridge request rejected: {0}")]
    Bridge(&'static str),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

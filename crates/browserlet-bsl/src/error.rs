//! Error types for BSL loading and in-place rewriting.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading, parsing, or rewriting a `.bsl` script.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be read.
    #[error("{message}")]
    Read {
        /// Path that failed to read.
        path: Option<PathBuf>,
        /// Underlying message.
        message: String,
    },
    /// The YAML failed to parse, or named an unknown action.
    #[error("{message}")]
    Parse {
        /// Path of the offending file.
        path: Option<PathBuf>,
        /// Line number, 1-based, when known.
        line: Option<usize>,
        /// Column number, 1-based, when known.
        col: Option<usize>,
        /// Human-readable message.
        message: String,
    },
    /// The in-place rewrite could not locate the target step's hints block.
    #[error("could not locate hints block for step {step_index} in {path}")]
    RewriteTargetNotFound {
        /// Path of the file being rewritten.
        path: String,
        /// Zero-based index of the step that should have been rewritten.
        step_index: usize,
    },
    /// The rewrite's temp-file-and-rename could not complete atomically.
    #[error("failed to atomically rewrite {path}: {message}")]
    RewriteIo {
        /// Path of the file being rewritten.
        path: String,
        /// Underlying message.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly message including location, when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("read error at {}: {message}", p.display()),
                None => format!("read error: {message}"),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
            } => {
                let loc = match (line, col) {
                    (Some(l), Some(c)) => format!(" at line {l}, column {c}"),
                    (Some(l), None) => format!(" at line {l}"),
                    _ => String::new(),
                };
                match path {
                    Some(p) => format!("parse error in {}{loc}: {message}", p.display()),
                    None => format!("parse error{loc}: {message}"),
                }
            }
            Self::RewriteTargetNotFound { .. } | Self::RewriteIo { .. } => self.to_string(),
        }
    }

    /// Build a [`Error::Parse`] from a `serde_yaml` error and the source text.
    pub fn from_yaml(err: &serde_yaml::Error, path: Option<&Path>) -> Self {
        let location = err.location();
        Self::Parse {
            path: path.map(Path::to_path_buf),
            line: location.as_ref().map(serde_yaml::Location::line),
            col: location.as_ref().map(serde_yaml::Location::column),
            message: err.to_string(),
        }
    }
}

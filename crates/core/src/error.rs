//! Error types shared across the mandi agent crates

use thiserror::Error;

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A commodity or region code could not be resolved against the
    /// reference tables. Names the parameter that failed so callers can
    /// report it instead of silently substituting.
    #[error("could not resolve {parameter}: '{value}' is not in the reference tables")]
    Resolution {
        parameter: &'static str,
        value: String,
    },

    /// A vocabulary source failed to load or parse.
    #[error("vocabulary source error: {0}")]
    Vocabulary(String),

    /// Live acquisition aborted after exhausting every retry. Callers
    /// normally never see this: the engine degrades to synthetic data.
    #[error("price acquisition failed: {0}")]
    Acquisition(String),

    /// An in-flight operation was cancelled by the caller's deadline or
    /// cancellation signal.
    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

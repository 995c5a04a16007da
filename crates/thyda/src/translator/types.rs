//! Types for ensemble translation.

use thiserror::Error;

/// Errors that can occur when building or running a translator.
#[derive(Debug, Error)]
pub enum TranslatorError {
    /// No models supplied.
    #[error("Ensemble is empty: supply at least one model.")]
    EmptyEnsemble,

    /// A tokenizer side was not configured.
    #[error("Missing {0} tokenizer: configure it via the builder.")]
    MissingTokenizer(&'static str),

    /// Rejected generation configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ensemble members score different vocabulary widths.
    #[error("Ensemble members disagree on scoring width: expected {expected}, found {found}")]
    VocabWidthMismatch { expected: usize, found: usize },

    /// The search returned a different number of outputs than inputs. This is
    /// an internal bookkeeping invariant; it is never silently dropped.
    #[error("Produced {produced} translations for {expected} inputs")]
    LengthMismatch { expected: usize, produced: usize },

    /// Decoding failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] anyhow::Error),
}

/// Result type for translation operations.
pub type TranslatorResult<T> = Result<T, TranslatorError>;

//! Eager pre-flight checks for translator construction.

use std::sync::Arc;

use thyda_decoding::{BeamSearchConfig, Seq2SeqModel, Tokenizer};

use super::types::{TranslatorError, TranslatorResult};

/// Validation result with optional warnings.
#[derive(Debug)]
pub struct TranslatorValidation {
    /// Warnings that don't prevent usage but should be shown.
    pub warnings: Vec<String>,
}

/// Validate an ensemble and its configuration before any decoding happens.
///
/// Returns `Ok(TranslatorValidation)` if decoding can proceed, with any
/// warnings. Hard failures are an empty ensemble, an invalid configuration,
/// and members that disagree on scoring width. A target tokenizer whose
/// vocabulary is narrower than the models' scoring width is only a warning:
/// post-processing clamps out-of-vocabulary ids to unk.
pub fn validate_ensemble(
    models: &[Arc<dyn Seq2SeqModel>],
    config: &BeamSearchConfig,
    target_tokenizer: &dyn Tokenizer,
) -> TranslatorResult<TranslatorValidation> {
    if models.is_empty() {
        return Err(TranslatorError::EmptyEnsemble);
    }

    config
        .validate()
        .map_err(|e| TranslatorError::InvalidConfig(e.to_string()))?;

    let expected = models[0].vocab_size();
    for model in &models[1..] {
        if model.vocab_size() != expected {
            return Err(TranslatorError::VocabWidthMismatch {
                expected,
                found: model.vocab_size(),
            });
        }
    }

    let mut warnings = Vec::new();
    if target_tokenizer.vocab_size() < expected {
        warnings.push(format!(
            "target tokenizer covers {} ids but models score {}; out-of-vocabulary outputs will be clamped to unk",
            target_tokenizer.vocab_size(),
            expected
        ));
    }

    Ok(TranslatorValidation { warnings })
}

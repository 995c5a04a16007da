//! Core Translator implementation.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};

use thyda_decoding::batch::{frame, pad_batch};
use thyda_decoding::postprocess;
use thyda_decoding::{BeamSearchConfig, EnsembleBeamSearch, TextProcessor, Tokenizer};

use super::builder::TranslatorBuilder;
use super::types::{TranslatorError, TranslatorResult};

/// Ensemble translation front-end.
///
/// Wraps `EnsembleBeamSearch` and adds the text pipeline around it: source
/// normalization and tokenization, bos/eos framing, batch padding, and
/// target-side post-processing (out-of-vocabulary clamping, detokenization).
///
/// # Example
///
/// ```ignore
/// let t = Translator::builder()
///     .models(models)
///     .tokenizer(tokenizer)
///     .build()?;
///
/// let lines = t.translate_batch(&sentences).await?;
/// ```
pub struct Translator {
    search: EnsembleBeamSearch,
    ensemble_size: usize,
    source_tokenizer: Arc<dyn Tokenizer>,
    target_tokenizer: Arc<dyn Tokenizer>,
    source_processor: Option<Arc<dyn TextProcessor>>,
    target_processor: Option<Arc<dyn TextProcessor>>,
}

impl Translator {
    /// Create a builder for custom configuration.
    pub fn builder() -> TranslatorBuilder {
        TranslatorBuilder::new()
    }

    pub(crate) fn assemble(
        search: EnsembleBeamSearch,
        ensemble_size: usize,
        source_tokenizer: Arc<dyn Tokenizer>,
        target_tokenizer: Arc<dyn Tokenizer>,
        source_processor: Option<Arc<dyn TextProcessor>>,
        target_processor: Option<Arc<dyn TextProcessor>>,
    ) -> Self {
        info!(
            "translator ready: {} model(s), beam {}, len_pen {}",
            ensemble_size,
            search.config().beam_size,
            search.config().len_pen
        );
        Self {
            search,
            ensemble_size,
            source_tokenizer,
            target_tokenizer,
            source_processor,
            target_processor,
        }
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translate a batch of sentences, preserving input order.
    ///
    /// Returns exactly one output line per input sentence; a count mismatch
    /// coming out of the search is a fatal error, never silently dropped.
    pub async fn translate_batch(&self, sentences: &[String]) -> TranslatorResult<Vec<String>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let mut framed = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            let text = match &self.source_processor {
                Some(p) => {
                    let normalized = p.normalize(sentence);
                    p.tokenize(&normalized)
                }
                None => sentence.clone(),
            };
            let ids = self.source_tokenizer.text_to_ids(&text)?;
            framed.push(frame(
                &ids,
                self.source_tokenizer.bos_id(),
                self.source_tokenizer.eos_id(),
            ));
        }
        let (source_ids, source_mask) = pad_batch(&framed, self.source_tokenizer.pad_id())?;

        debug!(
            "translating batch of {} (padded to {} tokens)",
            sentences.len(),
            source_ids.ncols()
        );

        let raw = self.search.generate(&source_ids, &source_mask).await?;
        if raw.len() != sentences.len() {
            error!(
                "beam search produced {} outputs for {} inputs",
                raw.len(),
                sentences.len()
            );
            return Err(TranslatorError::LengthMismatch {
                expected: sentences.len(),
                produced: raw.len(),
            });
        }

        let mut translations = Vec::with_capacity(raw.len());
        for ids in &raw {
            translations.push(postprocess::decode(
                ids,
                self.target_tokenizer.as_ref(),
                self.target_processor.as_deref(),
            )?);
        }

        info!(
            "translated {} sentence(s) in {:.2}s",
            sentences.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(translations)
    }

    /// Translate a single sentence.
    pub async fn translate(&self, text: &str) -> TranslatorResult<String> {
        let input = vec![text.to_string()];
        let mut results = self.translate_batch(&input).await?;
        match results.len() {
            1 => Ok(results.remove(0)),
            n => Err(TranslatorError::LengthMismatch {
                expected: 1,
                produced: n,
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of ensemble members.
    pub fn ensemble_size(&self) -> usize {
        self.ensemble_size
    }

    /// The active search configuration.
    pub fn config(&self) -> &BeamSearchConfig {
        self.search.config()
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("ensemble_size", &self.ensemble_size)
            .field("beam_size", &self.search.config().beam_size)
            .field("len_pen", &self.search.config().len_pen)
            .finish()
    }
}

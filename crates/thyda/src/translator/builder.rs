//! Builder pattern for Translator configuration.

use std::sync::Arc;

use log::warn;

use thyda_decoding::{
    BeamSearchConfig, EnsembleBeamSearch, ScoreCombiner, Seq2SeqModel, TextProcessor, Tokenizer,
};

use super::model::Translator;
use super::types::{TranslatorError, TranslatorResult};
use super::validation::validate_ensemble;

/// Builder for configuring a Translator instance.
///
/// # Example
///
/// ```ignore
/// use thyda::translator::Translator;
///
/// let translator = Translator::builder()
///     .models(models)
///     .tokenizer(tokenizer)
///     .beam_size(4)
///     .len_pen(0.6)
///     .build()?;
/// ```
pub struct TranslatorBuilder {
    pub(crate) models: Vec<Arc<dyn Seq2SeqModel>>,
    pub(crate) source_tokenizer: Option<Arc<dyn Tokenizer>>,
    pub(crate) target_tokenizer: Option<Arc<dyn Tokenizer>>,
    pub(crate) source_processor: Option<Arc<dyn TextProcessor>>,
    pub(crate) target_processor: Option<Arc<dyn TextProcessor>>,
    pub(crate) combiner: Option<Box<dyn ScoreCombiner>>,
    pub(crate) beam_size: Option<usize>,
    pub(crate) max_sequence_length: Option<usize>,
    pub(crate) len_pen: Option<f32>,
    pub(crate) max_delta_length: Option<usize>,
}

impl TranslatorBuilder {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            source_tokenizer: None,
            target_tokenizer: None,
            source_processor: None,
            target_processor: None,
            combiner: None,
            beam_size: None,
            max_sequence_length: None,
            len_pen: None,
            max_delta_length: None,
        }
    }

    // =========================================================================
    // Ensemble Configuration
    // =========================================================================

    /// Add one ensemble member.
    pub fn model(mut self, model: Arc<dyn Seq2SeqModel>) -> Self {
        self.models.push(model);
        self
    }

    /// Add several ensemble members.
    pub fn models(mut self, models: impl IntoIterator<Item = Arc<dyn Seq2SeqModel>>) -> Self {
        self.models.extend(models);
        self
    }

    /// Override the scoring-combination rule (default: mean of log-probs).
    pub fn combiner(mut self, combiner: Box<dyn ScoreCombiner>) -> Self {
        self.combiner = Some(combiner);
        self
    }

    // =========================================================================
    // Tokenizers & Processors
    // =========================================================================

    /// Use one tokenizer for both the source and the target side.
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.source_tokenizer = Some(tokenizer.clone());
        self.target_tokenizer = Some(tokenizer);
        self
    }

    pub fn source_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.source_tokenizer = Some(tokenizer);
        self
    }

    pub fn target_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.target_tokenizer = Some(tokenizer);
        self
    }

    /// Source-side normalization/tokenization hook.
    pub fn source_processor(mut self, processor: Arc<dyn TextProcessor>) -> Self {
        self.source_processor = Some(processor);
        self
    }

    /// Target-side detokenization hook.
    pub fn target_processor(mut self, processor: Arc<dyn TextProcessor>) -> Self {
        self.target_processor = Some(processor);
        self
    }

    // =========================================================================
    // Generation Configuration
    // =========================================================================

    /// Number of hypotheses kept per sentence.
    pub fn beam_size(mut self, n: usize) -> Self {
        self.beam_size = Some(n);
        self
    }

    /// Hard cap on generated tokens.
    pub fn max_sequence_length(mut self, len: usize) -> Self {
        self.max_sequence_length = Some(len);
        self
    }

    /// Length-penalty exponent for final hypothesis selection.
    pub fn len_pen(mut self, len_pen: f32) -> Self {
        self.len_pen = Some(len_pen);
        self
    }

    /// Cap on output length relative to the source length.
    pub fn max_delta_length(mut self, delta: usize) -> Self {
        self.max_delta_length = Some(delta);
        self
    }

    /// Greedy decoding (beam size 1).
    pub fn greedy(self) -> Self {
        self.beam_size(1)
    }

    // =========================================================================
    // Build
    // =========================================================================

    pub fn build(self) -> TranslatorResult<Translator> {
        Translator::from_builder(self)
    }
}

impl Default for TranslatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    /// Internal: construct from builder.
    pub(crate) fn from_builder(builder: TranslatorBuilder) -> TranslatorResult<Self> {
        let source_tokenizer = builder
            .source_tokenizer
            .ok_or(TranslatorError::MissingTokenizer("source"))?;
        let target_tokenizer = builder
            .target_tokenizer
            .ok_or(TranslatorError::MissingTokenizer("target"))?;

        // The decoder runs with the target side's special ids; source-side
        // ids are only used when framing input batches.
        let defaults = BeamSearchConfig::default();
        let config = BeamSearchConfig {
            beam_size: builder.beam_size.unwrap_or(defaults.beam_size),
            max_sequence_length: builder
                .max_sequence_length
                .unwrap_or(defaults.max_sequence_length),
            bos_id: target_tokenizer.bos_id(),
            eos_id: target_tokenizer.eos_id(),
            pad_id: target_tokenizer.pad_id(),
            len_pen: builder.len_pen.unwrap_or(defaults.len_pen),
            max_delta_length: builder.max_delta_length.unwrap_or(defaults.max_delta_length),
        };

        let validation = validate_ensemble(&builder.models, &config, target_tokenizer.as_ref())?;
        for warning in &validation.warnings {
            warn!("{}", warning);
        }

        let ensemble_size = builder.models.len();
        let search = match builder.combiner {
            Some(combiner) => {
                EnsembleBeamSearch::with_combiner(builder.models, config, combiner)?
            }
            None => EnsembleBeamSearch::new(builder.models, config)?,
        };

        Ok(Self::assemble(
            search,
            ensemble_size,
            source_tokenizer,
            target_tokenizer,
            builder.source_processor,
            builder.target_processor,
        ))
    }
}

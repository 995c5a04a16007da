//! þýða: ensemble translation for externally scored seq2seq models.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use thyda::Translator;
//!
//! let translator = Translator::builder()
//!     .models(models)          // Vec<Arc<dyn Seq2SeqModel>>
//!     .tokenizer(tokenizer)    // shared source/target tokenizer
//!     .beam_size(4)
//!     .len_pen(0.6)
//!     .build()?;
//!
//! let lines = translator.translate_batch(&sentences).await?;
//! ```

pub mod translator;

pub use translator::{Translator, TranslatorBuilder, TranslatorError, TranslatorResult};

// Re-export the engine seams callers implement or configure.
pub use thyda_decoding::{
    BeamSearchConfig, EncoderState, MeanLogProbs, ScoreCombiner, Seq2SeqModel, TextProcessor,
    Tokenizer, WeightedMeanLogProbs, WhitespaceProcessor, WordTokenizer,
};
pub use thyda_decoding::models::{TableModel, TableModelSpec};

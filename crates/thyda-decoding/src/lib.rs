//! Decoding engine for sequence-to-sequence translation
//!
//! This crate owns the decision logic of inference-time decoding: hypothesis
//! bookkeeping, ensemble score combination, beam pruning and termination.
//! Model forward passes live behind the [`traits::Seq2SeqModel`] seam; the
//! tensors this crate sees are plain `ndarray` matrices of token ids and
//! log-probabilities.

pub mod batch;
pub mod common;
pub mod generation;
pub mod models;
pub mod postprocess;
pub mod tokenizer;
pub mod traits;

// Re-export commonly used items
pub use crate::{
    batch::{frame, pad_batch},
    common::BeamSearchConfig,
    generation::{EnsembleBeamSearch, MeanLogProbs, ScoreCombiner, WeightedMeanLogProbs},
    tokenizer::{TextProcessor, Tokenizer, WhitespaceProcessor, WordTokenizer},
    traits::{EncoderState, Seq2SeqModel},
};

// Prelude for easy imports
pub mod prelude {
    pub use crate::common::BeamSearchConfig;
    pub use crate::generation::{EnsembleBeamSearch, ScoreCombiner};
    pub use crate::tokenizer::{TextProcessor, Tokenizer};
    pub use crate::traits::{EncoderState, Seq2SeqModel};
}

//! Model seam for the decoding engine.
//!
//! A `Seq2SeqModel` is an opaque scoring capability: it encodes a source
//! batch once and then, step by step, maps decoder prefixes to next-token
//! log-probabilities. Everything architecture-specific (attention, KV
//! caches, device placement) stays on the implementor's side of this trait.

use std::any::Any;

use anyhow::Result;
use async_trait::async_trait;
use ndarray::Array2;

/// Type-erased, model-owned encoder output.
///
/// The structure of an encoder state is defined entirely by the model that
/// produced it; the search never looks inside. Implementors stash their own
/// type at `encode` time and recover it in `step` via [`downcast_ref`].
///
/// [`downcast_ref`]: EncoderState::downcast_ref
pub struct EncoderState {
    inner: Box<dyn Any + Send + Sync>,
}

impl EncoderState {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

/// One ensemble member: an encoder plus a stepwise vocabulary scorer.
///
/// Models are read-only during decoding and shared across in-flight batches,
/// hence `Send + Sync` and `&self` methods throughout.
#[async_trait]
pub trait Seq2SeqModel: Send + Sync {
    /// Encode a padded source batch. Row `i` of `source_ids` is sentence `i`,
    /// `source_mask` carries 1.0 at real positions and 0.0 at padding.
    async fn encode(
        &self,
        source_ids: &Array2<i64>,
        source_mask: &Array2<f32>,
    ) -> Result<EncoderState>;

    /// Score the next token for every decoder prefix row.
    ///
    /// All prefix rows in one call have the same length (the search advances
    /// in lock-step). `source_rows[i]` names the encoder-state row prefix `i`
    /// is conditioned on; this is how one sentence's encoding is broadcast
    /// across its beam slots. The result has one log-prob row per prefix.
    async fn step(
        &self,
        prefixes: &Array2<i64>,
        state: &EncoderState,
        source_rows: &[usize],
    ) -> Result<Array2<f32>>;

    /// Width of the log-prob rows this model produces.
    fn vocab_size(&self) -> usize;
}

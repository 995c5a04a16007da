pub mod sampling;

pub use sampling::*;

use anyhow::{bail, Result};

/// Configuration for ensemble beam-search decoding.
#[derive(Clone, Debug)]
pub struct BeamSearchConfig {
    /// Number of hypotheses kept per source sentence.
    pub beam_size: usize,
    /// Hard cap on the number of generated tokens.
    pub max_sequence_length: usize,
    /// Token emitted as the first decoder input.
    pub bos_id: i64,
    /// Token that completes a hypothesis.
    pub eos_id: i64,
    /// Padding token for batched source matrices.
    pub pad_id: i64,
    /// Length-penalty exponent applied when ranking completed hypotheses.
    pub len_pen: f32,
    /// Cap on output length relative to the source length.
    pub max_delta_length: usize,
}

impl Default for BeamSearchConfig {
    fn default() -> Self {
        Self {
            beam_size: 4,
            max_sequence_length: 512,
            bos_id: 2,
            eos_id: 3,
            pad_id: 0,
            len_pen: 0.6,
            max_delta_length: 5,
        }
    }
}

impl BeamSearchConfig {
    /// Reject invalid configurations before any model call is made.
    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            bail!("beam_size must be at least 1");
        }
        if self.max_sequence_length == 0 {
            bail!("max_sequence_length must be positive");
        }
        if !self.len_pen.is_finite() || self.len_pen < 0.0 {
            bail!("len_pen must be finite and non-negative, got {}", self.len_pen);
        }
        if self.bos_id == self.eos_id || self.bos_id == self.pad_id || self.eos_id == self.pad_id {
            bail!(
                "bos ({}), eos ({}) and pad ({}) ids must be distinct",
                self.bos_id,
                self.eos_id,
                self.pad_id
            );
        }
        Ok(())
    }

    /// Generated-token budget for one sentence of `source_len` real tokens.
    pub fn step_cap(&self, source_len: usize) -> usize {
        self.max_sequence_length
            .min(source_len + self.max_delta_length)
    }
}

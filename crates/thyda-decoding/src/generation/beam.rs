//! Ensemble beam-search over externally scored sequence models.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use futures::future::try_join_all;
use log::debug;
use ndarray::Array2;

use crate::batch::mask_lengths;
use crate::common::{top_k_from_row, BeamSearchConfig};
use crate::generation::ensemble::{MeanLogProbs, ScoreCombiner};
use crate::traits::{EncoderState, Seq2SeqModel};

/// A live partial output: token ids (bos first) plus the cumulative
/// log-probability accumulated so far.
#[derive(Clone, Debug)]
pub struct Hypothesis {
    pub tokens: Vec<i64>,
    pub score: f32,
}

/// A retired hypothesis competing for final selection.
///
/// `normalized` is `score / generated_len^len_pen`, where `generated_len`
/// counts tokens after bos (minimum 1).
#[derive(Clone, Debug)]
pub struct FinishedHypothesis {
    pub tokens: Vec<i64>,
    pub score: f32,
    pub normalized: f32,
}

/// Per-sentence search state. Live width starts at `beam_size` and shrinks
/// as hypotheses are retired; slots are never refilled.
struct Beam {
    live: Vec<Hypothesis>,
    finished: Vec<FinishedHypothesis>,
    step_cap: usize,
}

impl Beam {
    fn new(beam_size: usize, bos_id: i64, step_cap: usize) -> Self {
        // Slot 0 carries the real seed; the rest sit at negative infinity so
        // their duplicate expansions are pruned on the first step.
        let live = (0..beam_size)
            .map(|i| Hypothesis {
                tokens: vec![bos_id],
                score: if i == 0 { 0.0 } else { f32::NEG_INFINITY },
            })
            .collect();
        Self {
            live,
            finished: Vec::new(),
            step_cap,
        }
    }

    fn retire(&mut self, tokens: Vec<i64>, score: f32, len_pen: f32) {
        let generated = tokens.len().saturating_sub(1).max(1);
        let normalized = score / (generated as f32).powf(len_pen);
        self.finished.push(FinishedHypothesis {
            tokens,
            score,
            normalized,
        });
    }

    /// Highest normalized score; earliest-retired wins ties.
    fn best(&self) -> Option<&FinishedHypothesis> {
        self.finished
            .iter()
            .fold(None, |best: Option<&FinishedHypothesis>, f| match best {
                Some(b) if b.normalized >= f.normalized => Some(b),
                _ => Some(f),
            })
    }
}

/// Beam-search decoder over one or more independently trained models.
///
/// Every step, each live hypothesis is scored by every ensemble member; the
/// per-member log-prob rows are collapsed through the [`ScoreCombiner`] and
/// the per-sentence candidate pool is pruned back to the current beam width.
/// A hypothesis that emits eos (or hits the step cap) is retired to its
/// sentence's completed pool and its slot is not refilled, so the live width
/// shrinks until the sentence is done.
///
/// Decoding is deterministic: candidate ordering is stable and ties keep
/// earliest-generated order. With `beam_size == 1` the search reduces to
/// greedy argmax decoding.
pub struct EnsembleBeamSearch {
    models: Vec<Arc<dyn Seq2SeqModel>>,
    combiner: Box<dyn ScoreCombiner>,
    config: BeamSearchConfig,
}

impl EnsembleBeamSearch {
    /// Build a search over `models` with the default combination rule
    /// (arithmetic mean of log-probs). Rejects invalid configurations,
    /// empty ensembles and members with disagreeing scoring widths.
    pub fn new(models: Vec<Arc<dyn Seq2SeqModel>>, config: BeamSearchConfig) -> Result<Self> {
        Self::with_combiner(models, config, Box::new(MeanLogProbs))
    }

    pub fn with_combiner(
        models: Vec<Arc<dyn Seq2SeqModel>>,
        config: BeamSearchConfig,
        combiner: Box<dyn ScoreCombiner>,
    ) -> Result<Self> {
        config.validate()?;
        if models.is_empty() {
            bail!("ensemble must contain at least one model");
        }
        let width = models[0].vocab_size();
        for m in &models[1..] {
            if m.vocab_size() != width {
                bail!(
                    "ensemble members disagree on scoring width: {} vs {}",
                    width,
                    m.vocab_size()
                );
            }
        }
        Ok(Self {
            models,
            combiner,
            config,
        })
    }

    pub fn config(&self) -> &BeamSearchConfig {
        &self.config
    }

    /// Decode one padded source batch into one token sequence per sentence.
    ///
    /// Returned sequences have bos stripped; eos is kept when it was emitted,
    /// otherwise the sequence was truncated at the sentence's step cap.
    pub async fn generate(
        &self,
        source_ids: &Array2<i64>,
        source_mask: &Array2<f32>,
    ) -> Result<Vec<Vec<i64>>> {
        let (batch_size, _) = source_ids.dim();
        if batch_size == 0 {
            bail!("empty source batch");
        }
        if source_mask.dim() != source_ids.dim() {
            bail!(
                "source mask shape {:?} does not match ids shape {:?}",
                source_mask.dim(),
                source_ids.dim()
            );
        }

        // Encode once per ensemble member, members in parallel.
        let states: Vec<EncoderState> = try_join_all(
            self.models
                .iter()
                .map(|m| m.encode(source_ids, source_mask)),
        )
        .await?;

        let source_lens = mask_lengths(source_mask);
        let mut beams: Vec<Beam> = source_lens
            .iter()
            .map(|&len| {
                Beam::new(
                    self.config.beam_size,
                    self.config.bos_id,
                    self.config.step_cap(len),
                )
            })
            .collect();

        debug!(
            "beam search: {} sentences, {} models, beam {}",
            batch_size,
            self.models.len(),
            self.config.beam_size
        );

        loop {
            // All live hypotheses across the batch, in sentence order. The
            // search advances in lock-step so every prefix has equal length.
            let mut row_origin: Vec<(usize, usize)> = Vec::new();
            for (s, beam) in beams.iter().enumerate() {
                for h in 0..beam.live.len() {
                    row_origin.push((s, h));
                }
            }
            if row_origin.is_empty() {
                break;
            }

            let cur_len = beams[row_origin[0].0].live[row_origin[0].1].tokens.len();
            let mut prefixes = Array2::zeros((row_origin.len(), cur_len));
            for (r, &(s, h)) in row_origin.iter().enumerate() {
                for (j, &t) in beams[s].live[h].tokens.iter().enumerate() {
                    prefixes[[r, j]] = t;
                }
            }
            let source_rows: Vec<usize> = row_origin.iter().map(|&(s, _)| s).collect();

            // Every member scores every live prefix; the join is the barrier
            // before combination.
            let distributions = try_join_all(
                self.models
                    .iter()
                    .zip(&states)
                    .map(|(m, state)| m.step(&prefixes, state, &source_rows)),
            )
            .await?;
            let combined = self.combiner.combine(&distributions)?;
            if combined.nrows() != row_origin.len() {
                bail!(
                    "combined distribution has {} rows for {} prefixes",
                    combined.nrows(),
                    row_origin.len()
                );
            }

            let mut row = 0usize;
            for beam in beams.iter_mut() {
                let live_rows = beam.live.len();
                if live_rows == 0 {
                    continue;
                }

                // Candidate pool: top-k continuations of every live
                // hypothesis, scored cumulatively. Non-finite scores are
                // invalid expansions and never enter the pool.
                let mut candidates: Vec<(f32, usize, i64)> =
                    Vec::with_capacity(live_rows * self.config.beam_size);
                for h in 0..live_rows {
                    let lp_row = combined.row(row + h);
                    for (token, lp) in top_k_from_row(lp_row, self.config.beam_size) {
                        let score = beam.live[h].score + lp;
                        if score.is_finite() {
                            candidates.push((score, h, token));
                        }
                    }
                }
                row += live_rows;

                // Stable sort: equal scores keep earliest-generated order.
                candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
                candidates.truncate(live_rows);

                let mut next_live = Vec::with_capacity(live_rows);
                for (score, h, token) in candidates {
                    let mut tokens = beam.live[h].tokens.clone();
                    tokens.push(token);
                    let generated = tokens.len() - 1;
                    if token == self.config.eos_id || generated >= beam.step_cap {
                        beam.retire(tokens, score, self.config.len_pen);
                    } else {
                        next_live.push(Hypothesis { tokens, score });
                    }
                }

                if next_live.is_empty() && beam.finished.is_empty() {
                    // Every expansion was invalid; keep the best current
                    // prefix so the sentence still yields an output.
                    if let Some(best) = beam
                        .live
                        .iter()
                        .cloned()
                        .reduce(|a, b| if b.score > a.score { b } else { a })
                    {
                        beam.retire(best.tokens, best.score, self.config.len_pen);
                    }
                }
                beam.live = next_live;
            }
        }

        let mut outputs = Vec::with_capacity(batch_size);
        for beam in &beams {
            let best = beam
                .best()
                .ok_or_else(|| anyhow!("beam produced no hypotheses"))?;
            outputs.push(best.tokens[1..].to_vec());
        }
        Ok(outputs)
    }
}

//! Scoring-combination seam for ensembles.

use anyhow::{bail, Result};
use ndarray::Array2;

/// Collapses per-member log-prob matrices into a single distribution.
///
/// The search calls this once per step, after every ensemble member has
/// scored the same prefix rows. Alternative combination rules (weighted
/// ensembles, product-of-experts variants) plug in here without touching
/// beam bookkeeping.
pub trait ScoreCombiner: Send + Sync {
    fn combine(&self, distributions: &[Array2<f32>]) -> Result<Array2<f32>>;
}

fn check_widths(distributions: &[Array2<f32>]) -> Result<()> {
    if distributions.is_empty() {
        bail!("no distributions to combine");
    }
    let dim = distributions[0].dim();
    for d in &distributions[1..] {
        if d.dim() != dim {
            bail!(
                "ensemble scoring width mismatch: {:?} vs {:?}",
                dim,
                d.dim()
            );
        }
    }
    Ok(())
}

/// Arithmetic mean of log-probabilities across members (the geometric mean
/// of the underlying probabilities). This is the default combination rule
/// and is applied identically at every step.
pub struct MeanLogProbs;

impl ScoreCombiner for MeanLogProbs {
    fn combine(&self, distributions: &[Array2<f32>]) -> Result<Array2<f32>> {
        check_widths(distributions)?;
        let mut combined = distributions[0].clone();
        for d in &distributions[1..] {
            combined += d;
        }
        combined /= distributions.len() as f32;
        Ok(combined)
    }
}

/// Weighted mean of log-probabilities. Weights are normalized to sum to one
/// at construction.
pub struct WeightedMeanLogProbs {
    weights: Vec<f32>,
}

impl WeightedMeanLogProbs {
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if weights.is_empty() {
            bail!("weights must not be empty");
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("weights must be finite and non-negative");
        }
        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            bail!("weights must not all be zero");
        }
        Ok(Self {
            weights: weights.into_iter().map(|w| w / total).collect(),
        })
    }
}

impl ScoreCombiner for WeightedMeanLogProbs {
    fn combine(&self, distributions: &[Array2<f32>]) -> Result<Array2<f32>> {
        check_widths(distributions)?;
        if distributions.len() != self.weights.len() {
            bail!(
                "got {} distributions for {} weights",
                distributions.len(),
                self.weights.len()
            );
        }
        let mut combined = &distributions[0] * self.weights[0];
        for (d, &w) in distributions[1..].iter().zip(&self.weights[1..]) {
            combined += &(d * w);
        }
        Ok(combined)
    }
}

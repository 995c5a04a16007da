//! Source-side batching utilities.

use anyhow::{bail, Result};
use ndarray::Array2;

/// Wrap a tokenized sentence with bos/eos markers.
///
/// An empty sentence becomes the two-token `[bos, eos]` sequence.
pub fn frame(ids: &[i64], bos_id: i64, eos_id: i64) -> Vec<i64> {
    let mut framed = Vec::with_capacity(ids.len() + 2);
    framed.push(bos_id);
    framed.extend_from_slice(ids);
    framed.push(eos_id);
    framed
}

/// Pad framed sentences to the longest length in the batch.
///
/// Returns the id matrix and a float mask with 1.0 at real positions and 0.0
/// at padding. Padding is batch-local: sequences are padded to the longest
/// sentence of this batch, not to any global maximum.
pub fn pad_batch(sequences: &[Vec<i64>], pad_id: i64) -> Result<(Array2<i64>, Array2<f32>)> {
    if sequences.is_empty() {
        bail!("cannot pad an empty batch");
    }
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
    if max_len == 0 {
        bail!("cannot pad a batch of empty sequences");
    }

    let mut ids = Array2::from_elem((sequences.len(), max_len), pad_id);
    let mut mask = Array2::zeros((sequences.len(), max_len));
    for (i, seq) in sequences.iter().enumerate() {
        for (j, &token) in seq.iter().enumerate() {
            ids[[i, j]] = token;
            mask[[i, j]] = 1.0;
        }
    }
    Ok((ids, mask))
}

/// True (unpadded) length of every row, recovered from the mask.
pub fn mask_lengths(mask: &Array2<f32>) -> Vec<usize> {
    mask.outer_iter()
        .map(|row| row.iter().filter(|&&v| v > 0.5).count())
        .collect()
}

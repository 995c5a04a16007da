use ndarray::{Array1, ArrayView1};

/// Numerically stable log-softmax over a logit vector.
pub fn log_softmax_1d(logits: &Array1<f32>) -> Array1<f32> {
    let max_val = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let scaled = logits - max_val;
    let exp_sum = scaled.mapv(f32::exp).sum();
    scaled - exp_sum.ln()
}

/// Top-`k` entries of a log-prob row, best first.
///
/// Ties keep ascending token-id order, so repeated calls over identical rows
/// are fully deterministic.
pub fn top_k_from_row(row: ArrayView1<f32>, k: usize) -> Vec<(i64, f32)> {
    let mut indexed: Vec<(i64, f32)> = row
        .iter()
        .enumerate()
        .map(|(i, &lp)| (i as i64, lp))
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);
    indexed
}

/// Index of the largest entry. Ties resolve to the lowest index.
pub fn argmax(row: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // ============== log_softmax_1d ==============

    #[test]
    fn test_log_softmax_1d_matches_softmax_log() {
        let logits = array![1.0, 2.0, 3.0];
        let log_probs = log_softmax_1d(&logits);

        let max = 3.0f32;
        let exp_sum: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
        for i in 0..3 {
            let expected = (logits[i] - max) - exp_sum.ln();
            assert!((log_probs[i] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_log_softmax_1d_all_non_positive() {
        let logits = array![0.5, 1.5, -2.0];
        let log_probs = log_softmax_1d(&logits);
        assert!(log_probs.iter().all(|&lp| lp <= 0.0));
    }

    #[test]
    fn test_log_softmax_1d_numerical_stability() {
        let logits = array![1000.0, 1001.0, 1002.0];
        let log_probs = log_softmax_1d(&logits);
        assert!(log_probs.iter().all(|lp| lp.is_finite()));
        // exp of the results must still sum to one
        let total: f32 = log_probs.iter().map(|&lp| lp.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    // ============== top_k_from_row ==============

    #[test]
    fn test_top_k_from_row_basic() {
        let row = array![-2.0, -1.0, -3.0, -0.5, -4.0];
        let top = top_k_from_row(row.view(), 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0], (3, -0.5));
        assert_eq!(top[1], (1, -1.0));
        assert_eq!(top[2], (0, -2.0));
    }

    #[test]
    fn test_top_k_from_row_k_exceeds_len() {
        let row = array![-1.0, -2.0];
        let top = top_k_from_row(row.view(), 10);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_top_k_from_row_ties_keep_id_order() {
        let row = array![-1.0, -0.5, -0.5, -2.0];
        let top = top_k_from_row(row.view(), 2);
        assert_eq!(top[0].0, 1);
        assert_eq!(top[1].0, 2);
    }

    // ============== argmax ==============

    #[test]
    fn test_argmax_basic() {
        let row = array![1.0, 5.0, 3.0];
        assert_eq!(argmax(row.view()), 1);
    }

    #[test]
    fn test_argmax_tie_picks_first() {
        let row = array![5.0, 5.0, 1.0];
        assert_eq!(argmax(row.view()), 0);
    }
}

//! Table-driven scoring backend.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::batch::mask_lengths;
use crate::common::log_softmax_1d;
use crate::tokenizer::WordTokenizer;
use crate::traits::{EncoderState, Seq2SeqModel};

/// Effectively-zero probability for continuations the table does not score.
/// Finite so normalized rows stay free of NaN.
const UNSCORED: f32 = -1.0e9;

/// On-disk form of a [`TableModel`].
///
/// `vocab` lists the word vocabulary (special ids 0..=3 are implicit, words
/// start at id 4, matching [`WordTokenizer`]). `transitions` maps a last
/// emitted token id to scored continuations; unlisted last tokens fall back
/// to a uniform row. `copy_weight` > 0 adds a bias toward the source token
/// aligned with the next output position, which turns the model into a
/// sequence copier and makes end-to-end pipeline runs easy to eyeball.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableModelSpec {
    pub vocab: Vec<String>,
    #[serde(default)]
    pub transitions: HashMap<i64, Vec<(i64, f32)>>,
    #[serde(default)]
    pub copy_weight: f32,
}

struct TableState {
    source_ids: Array2<i64>,
    lengths: Vec<usize>,
}

/// Deterministic `Seq2SeqModel` scored from a serialisable table.
pub struct TableModel {
    words: Vec<String>,
    vocab_size: usize,
    rows: HashMap<i64, Array1<f32>>,
    fallback: Array1<f32>,
    copy_weight: f32,
}

impl TableModel {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read model file '{}'", path.display()))?;
        let spec: TableModelSpec = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse model file '{}'", path.display()))?;
        Ok(Self::from_spec(spec))
    }

    pub fn from_spec(spec: TableModelSpec) -> Self {
        let vocab_size = WordTokenizer::RESERVED + spec.vocab.len();
        let rows = spec
            .transitions
            .into_iter()
            .map(|(last, entries)| {
                let mut row = Array1::from_elem(vocab_size, UNSCORED);
                for (token, weight) in entries {
                    if token >= 0 && (token as usize) < vocab_size {
                        row[token as usize] = weight;
                    }
                }
                (last, row)
            })
            .collect();
        Self {
            words: spec.vocab,
            vocab_size,
            rows,
            fallback: Array1::zeros(vocab_size),
            copy_weight: spec.copy_weight,
        }
    }

    /// Tokenizer over this model's word vocabulary.
    pub fn word_tokenizer(&self) -> WordTokenizer {
        WordTokenizer::new(self.words.iter().cloned())
    }
}

#[async_trait]
impl Seq2SeqModel for TableModel {
    async fn encode(
        &self,
        source_ids: &Array2<i64>,
        source_mask: &Array2<f32>,
    ) -> Result<EncoderState> {
        Ok(EncoderState::new(TableState {
            source_ids: source_ids.clone(),
            lengths: mask_lengths(source_mask),
        }))
    }

    async fn step(
        &self,
        prefixes: &Array2<i64>,
        state: &EncoderState,
        source_rows: &[usize],
    ) -> Result<Array2<f32>> {
        let state = state
            .downcast_ref::<TableState>()
            .ok_or_else(|| anyhow!("encoder state was not produced by a TableModel"))?;
        if source_rows.len() != prefixes.nrows() {
            bail!(
                "got {} source rows for {} prefixes",
                source_rows.len(),
                prefixes.nrows()
            );
        }

        let cur_len = prefixes.ncols();
        let mut out = Array2::zeros((prefixes.nrows(), self.vocab_size));
        for (i, prefix) in prefixes.outer_iter().enumerate() {
            let last = prefix[cur_len - 1];
            let mut row = self
                .rows
                .get(&last)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone());

            if self.copy_weight > 0.0 {
                let s = source_rows[i];
                if s >= state.lengths.len() {
                    bail!("source row {} out of range for batch of {}", s, state.lengths.len());
                }
                // The prefix holds bos plus the tokens emitted so far, so its
                // length is also the next aligned source position.
                let pos = cur_len;
                if pos < state.lengths[s] {
                    let target = state.source_ids[[s, pos]];
                    if target >= 0 && (target as usize) < self.vocab_size {
                        row[target as usize] += self.copy_weight;
                    }
                }
            }

            out.row_mut(i).assign(&log_softmax_1d(&row));
        }
        Ok(out)
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::batch::{frame, pad_batch};
    use crate::common::BeamSearchConfig;
    use crate::generation::EnsembleBeamSearch;
    use crate::tokenizer::Tokenizer;

    fn copier_spec() -> TableModelSpec {
        TableModelSpec {
            vocab: vec!["hallo".into(), "heimur".into(), "daginn".into()],
            transitions: HashMap::new(),
            copy_weight: 10.0,
        }
    }

    fn decode_setup(model: TableModel) -> (EnsembleBeamSearch, WordTokenizer) {
        let tokenizer = model.word_tokenizer();
        let search = EnsembleBeamSearch::new(
            vec![Arc::new(model) as Arc<dyn Seq2SeqModel>],
            BeamSearchConfig {
                beam_size: 2,
                ..Default::default()
            },
        )
        .unwrap();
        (search, tokenizer)
    }

    #[test]
    fn test_spec_json_roundtrip() {
        let spec = TableModelSpec {
            vocab: vec!["a".into(), "b".into()],
            transitions: HashMap::from([(2, vec![(4, -0.5), (3, -1.5)])]),
            copy_weight: 0.0,
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: TableModelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vocab, spec.vocab);
        assert_eq!(back.transitions[&2], vec![(4, -0.5), (3, -1.5)]);
    }

    #[test]
    fn test_from_file_missing_path_fails() {
        assert!(TableModel::from_file("/nonexistent/model.json").is_err());
    }

    #[test]
    fn test_from_file_reads_spec() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            serde_json::to_string(&copier_spec()).unwrap()
        )
        .unwrap();
        let model = TableModel::from_file(file.path()).unwrap();
        assert_eq!(model.vocab_size(), 7);
    }

    #[tokio::test]
    async fn test_copier_echoes_source() {
        let (search, tokenizer) = decode_setup(TableModel::from_spec(copier_spec()));

        let ids = tokenizer.text_to_ids("hallo heimur").unwrap();
        let framed = frame(&ids, tokenizer.bos_id(), tokenizer.eos_id());
        let (src, mask) = pad_batch(&[framed], tokenizer.pad_id()).unwrap();

        let outputs = search.generate(&src, &mask).await.unwrap();
        assert_eq!(*outputs[0].last().unwrap(), tokenizer.eos_id());
        assert_eq!(tokenizer.ids_to_text(&outputs[0]).unwrap(), "hallo heimur");
    }

    #[tokio::test]
    async fn test_transitions_drive_continuations() {
        // bos always goes to "hallo" (4), "hallo" always ends the sequence.
        let spec = TableModelSpec {
            vocab: vec!["hallo".into(), "heimur".into()],
            transitions: HashMap::from([
                (2, vec![(4, -0.1), (5, -4.0)]),
                (4, vec![(3, -0.1), (5, -4.0)]),
            ]),
            copy_weight: 0.0,
        };
        let (search, tokenizer) = decode_setup(TableModel::from_spec(spec));

        let framed = frame(&[5], tokenizer.bos_id(), tokenizer.eos_id());
        let (src, mask) = pad_batch(&[framed], tokenizer.pad_id()).unwrap();

        let outputs = search.generate(&src, &mask).await.unwrap();
        assert_eq!(outputs[0], vec![4, 3]);
    }
}

//! Tokenizer and text-processor seams.
//!
//! The search itself only sees token ids; everything that turns text into
//! ids and back lives behind these traits. `HfTokenizer` adapts a
//! HuggingFace `tokenizers` model for real subword vocabularies;
//! `WordTokenizer` is a plain word-vocabulary tokenizer used by the
//! reference backend and the test-suite.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};

/// Text-to-ids capability for one side of a translation model.
pub trait Tokenizer: Send + Sync {
    fn text_to_ids(&self, text: &str) -> Result<Vec<i64>>;
    fn ids_to_text(&self, ids: &[i64]) -> Result<String>;
    fn bos_id(&self) -> i64;
    fn eos_id(&self) -> i64;
    fn pad_id(&self) -> i64;
    fn unk_id(&self) -> i64;
    fn vocab_size(&self) -> usize;
}

/// Optional normalization/tokenization hooks applied around the tokenizer.
pub trait TextProcessor: Send + Sync {
    /// Source-side normalization, applied before `tokenize`.
    fn normalize(&self, text: &str) -> String;
    /// Source-side tokenization into a whitespace-separated form.
    fn tokenize(&self, text: &str) -> String;
    /// Target-side detokenization from whitespace-separated words.
    fn detokenize(&self, words: &[String]) -> String;
}

/// Whitespace-collapsing processor; tokenization is the identity.
pub struct WhitespaceProcessor;

impl TextProcessor for WhitespaceProcessor {
    fn normalize(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn tokenize(&self, text: &str) -> String {
        text.to_string()
    }

    fn detokenize(&self, words: &[String]) -> String {
        words
            .iter()
            .filter(|w| !w.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Word-level tokenizer over a fixed vocabulary.
///
/// Ids 0..=3 are reserved for pad/unk/bos/eos; vocabulary words start at 4.
pub struct WordTokenizer {
    words: Vec<String>,
    index: HashMap<String, i64>,
}

impl WordTokenizer {
    pub const PAD_ID: i64 = 0;
    pub const UNK_ID: i64 = 1;
    pub const BOS_ID: i64 = 2;
    pub const EOS_ID: i64 = 3;
    /// Number of reserved special ids before the first vocabulary word.
    pub const RESERVED: usize = 4;

    pub fn new(words: impl IntoIterator<Item = String>) -> Self {
        let words: Vec<String> = words.into_iter().collect();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), Self::RESERVED as i64 + i as i64))
            .collect();
        Self { words, index }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Tokenizer for WordTokenizer {
    fn text_to_ids(&self, text: &str) -> Result<Vec<i64>> {
        Ok(text
            .split_whitespace()
            .map(|w| self.index.get(w).copied().unwrap_or(Self::UNK_ID))
            .collect())
    }

    fn ids_to_text(&self, ids: &[i64]) -> Result<String> {
        let mut words = Vec::with_capacity(ids.len());
        for &id in ids {
            if id == Self::PAD_ID || id == Self::BOS_ID || id == Self::EOS_ID {
                continue;
            }
            let word_idx = (id - Self::RESERVED as i64) as usize;
            if id >= Self::RESERVED as i64 && word_idx < self.words.len() {
                words.push(self.words[word_idx].as_str());
            } else {
                words.push("<unk>");
            }
        }
        Ok(words.join(" "))
    }

    fn bos_id(&self) -> i64 {
        Self::BOS_ID
    }

    fn eos_id(&self) -> i64 {
        Self::EOS_ID
    }

    fn pad_id(&self) -> i64 {
        Self::PAD_ID
    }

    fn unk_id(&self) -> i64 {
        Self::UNK_ID
    }

    fn vocab_size(&self) -> usize {
        Self::RESERVED + self.words.len()
    }
}

/// Adapter over a HuggingFace `tokenizers` model.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    bos_id: i64,
    eos_id: i64,
    pad_id: i64,
    unk_id: i64,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow!("failed to load tokenizer '{}': {}", path.display(), e))?;
        Self::from_tokenizer(inner)
    }

    /// Wrap an already-loaded tokenizer, resolving the conventional special
    /// token spellings.
    pub fn from_tokenizer(inner: tokenizers::Tokenizer) -> Result<Self> {
        let resolve = |candidates: &[&str]| -> Option<i64> {
            candidates
                .iter()
                .find_map(|t| inner.token_to_id(t))
                .map(|id| id as i64)
        };
        let pad_id = resolve(&["<pad>", "[PAD]"])
            .ok_or_else(|| anyhow!("tokenizer defines no pad token"))?;
        let unk_id = resolve(&["<unk>", "[UNK]"])
            .ok_or_else(|| anyhow!("tokenizer defines no unk token"))?;
        let bos_id = resolve(&["<s>", "<bos>", "[CLS]"])
            .ok_or_else(|| anyhow!("tokenizer defines no bos token"))?;
        let eos_id = resolve(&["</s>", "<eos>", "[SEP]"])
            .ok_or_else(|| anyhow!("tokenizer defines no eos token"))?;
        Ok(Self {
            inner,
            bos_id,
            eos_id,
            pad_id,
            unk_id,
        })
    }
}

impl Tokenizer for HfTokenizer {
    fn text_to_ids(&self, text: &str) -> Result<Vec<i64>> {
        let encoding = self.inner.encode(text, false).map_err(|e| anyhow!(e))?;
        Ok(encoding.get_ids().iter().map(|&id| id as i64).collect())
    }

    fn ids_to_text(&self, ids: &[i64]) -> Result<String> {
        let ids: Vec<u32> = ids
            .iter()
            .filter(|&&id| id >= 0)
            .map(|&id| id as u32)
            .collect();
        self.inner.decode(&ids, true).map_err(|e| anyhow!(e))
    }

    fn bos_id(&self) -> i64 {
        self.bos_id
    }

    fn eos_id(&self) -> i64 {
        self.eos_id
    }

    fn pad_id(&self) -> i64 {
        self.pad_id
    }

    fn unk_id(&self) -> i64 {
        self.unk_id
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

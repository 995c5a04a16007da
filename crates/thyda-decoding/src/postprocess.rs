//! Output-side post-processing.

use anyhow::Result;

use crate::tokenizer::{TextProcessor, Tokenizer};

/// Replace ids outside the tokenizer vocabulary with the unk id.
///
/// Defends against stale or mismatched vocabularies: a model may score a
/// wider id range than the tokenizer can render. Always applied before any
/// id reaches text conversion.
pub fn clamp_to_vocab(ids: &mut [i64], vocab_size: usize, unk_id: i64) {
    for id in ids.iter_mut() {
        if *id < 0 || *id as usize >= vocab_size {
            *id = unk_id;
        }
    }
}

/// Convert raw output ids to text: clamp out-of-vocabulary ids, render
/// through the target tokenizer, then apply the optional detokenizer.
pub fn decode(
    ids: &[i64],
    tokenizer: &dyn Tokenizer,
    processor: Option<&dyn TextProcessor>,
) -> Result<String> {
    let mut ids = ids.to_vec();
    clamp_to_vocab(&mut ids, tokenizer.vocab_size(), tokenizer.unk_id());
    let text = tokenizer.ids_to_text(&ids)?;
    match processor {
        Some(p) => {
            let words: Vec<String> = text.split(' ').map(str::to_string).collect();
            Ok(p.detokenize(&words))
        }
        None => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{WhitespaceProcessor, WordTokenizer};

    #[test]
    fn test_clamp_replaces_out_of_vocab_ids() {
        let mut ids = vec![4, 5, 100, 6];
        clamp_to_vocab(&mut ids, 7, 1);
        assert_eq!(ids, vec![4, 5, 1, 6]);
    }

    #[test]
    fn test_clamp_replaces_negative_ids() {
        let mut ids = vec![-3, 4];
        clamp_to_vocab(&mut ids, 7, 1);
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_clamp_leaves_in_vocab_ids_alone() {
        let mut ids = vec![0, 3, 6];
        clamp_to_vocab(&mut ids, 7, 1);
        assert_eq!(ids, vec![0, 3, 6]);
    }

    #[test]
    fn test_decode_clamps_before_text_conversion() {
        let t = WordTokenizer::new(["hallo", "heimur"].map(String::from));
        // vocab_size is 6; inject an id past the end of the vocabulary.
        let injected = t.vocab_size() as i64 + 5;
        let text = decode(&[4, injected, WordTokenizer::EOS_ID], &t, None).unwrap();
        assert_eq!(text, "hallo <unk>");
    }

    #[test]
    fn test_decode_applies_detokenizer() {
        let t = WordTokenizer::new(["hallo", "heimur"].map(String::from));
        let text = decode(
            &[4, 5, WordTokenizer::EOS_ID],
            &t,
            Some(&WhitespaceProcessor),
        )
        .unwrap();
        assert_eq!(text, "hallo heimur");
    }
}

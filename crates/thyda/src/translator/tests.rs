//! Tests for the Translator module.

use std::sync::Arc;

use super::*;

use thyda_decoding::models::{TableModel, TableModelSpec};
use thyda_decoding::{Seq2SeqModel, Tokenizer, WordTokenizer};

/// A copying ensemble member plus its word tokenizer. `copy_weight` makes
/// the table backend echo its source, which keeps expectations readable.
fn copier(vocab: &[&str]) -> (Arc<dyn Seq2SeqModel>, Arc<dyn Tokenizer>) {
    let spec = TableModelSpec {
        vocab: vocab.iter().map(|s| s.to_string()).collect(),
        transitions: Default::default(),
        copy_weight: 10.0,
    };
    let model = TableModel::from_spec(spec);
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(model.word_tokenizer());
    let model: Arc<dyn Seq2SeqModel> = Arc::new(model);
    (model, tokenizer)
}

// Unit Tests - Builder

mod builder_tests {
    use super::*;

    #[test]
    fn test_missing_tokenizer_rejected() {
        let result = Translator::builder().build();
        assert!(matches!(
            result,
            Err(TranslatorError::MissingTokenizer("source"))
        ));
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        let (_, tokenizer) = copier(&["hallo"]);
        let result = Translator::builder().tokenizer(tokenizer).build();
        assert!(matches!(result, Err(TranslatorError::EmptyEnsemble)));
    }

    #[test]
    fn test_invalid_beam_size_rejected_eagerly() {
        let (model, tokenizer) = copier(&["hallo"]);
        let result = Translator::builder()
            .model(model)
            .tokenizer(tokenizer)
            .beam_size(0)
            .build();
        assert!(matches!(result, Err(TranslatorError::InvalidConfig(_))));
    }

    #[test]
    fn test_defaults_follow_tokenizer_and_stock_config() {
        let (model, tokenizer) = copier(&["hallo"]);
        let t = Translator::builder()
            .model(model)
            .tokenizer(tokenizer)
            .build()
            .unwrap();

        let config = t.config();
        assert_eq!(config.beam_size, 4);
        assert_eq!(config.max_sequence_length, 512);
        assert_eq!(config.max_delta_length, 5);
        assert!((config.len_pen - 0.6).abs() < 1e-6);
        assert_eq!(config.bos_id, WordTokenizer::BOS_ID);
        assert_eq!(config.eos_id, WordTokenizer::EOS_ID);
        assert_eq!(config.pad_id, WordTokenizer::PAD_ID);
        assert_eq!(t.ensemble_size(), 1);
    }

    #[test]
    fn test_greedy_sets_beam_one() {
        let (model, tokenizer) = copier(&["hallo"]);
        let t = Translator::builder()
            .model(model)
            .tokenizer(tokenizer)
            .greedy()
            .build()
            .unwrap();
        assert_eq!(t.config().beam_size, 1);
    }
}

// Unit Tests - Validation

mod validation_tests {
    use super::*;
    use crate::translator::validation::validate_ensemble;
    use thyda_decoding::BeamSearchConfig;

    #[test]
    fn test_width_disagreement_rejected() {
        let (small, tokenizer) = copier(&["hallo"]);
        let (large, _) = copier(&["hallo", "heimur"]);
        let result = Translator::builder()
            .models([small, large])
            .tokenizer(tokenizer)
            .build();
        assert!(matches!(
            result,
            Err(TranslatorError::VocabWidthMismatch { .. })
        ));
    }

    #[test]
    fn test_narrow_target_tokenizer_is_a_warning() {
        let (model, _) = copier(&["hallo", "heimur", "daginn"]);
        let narrow = WordTokenizer::new(["hallo".to_string()]);
        let validation =
            validate_ensemble(&[model], &BeamSearchConfig::default(), &narrow).unwrap();
        assert_eq!(validation.warnings.len(), 1);
        assert!(validation.warnings[0].contains("clamped"));
    }

    #[test]
    fn test_matching_widths_produce_no_warnings() {
        let (model, tokenizer) = copier(&["hallo"]);
        let validation =
            validate_ensemble(&[model], &BeamSearchConfig::default(), tokenizer.as_ref()).unwrap();
        assert!(validation.warnings.is_empty());
    }
}

// Unit Tests - Errors

mod error_tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message_carries_counts() {
        let err = TranslatorError::LengthMismatch {
            expected: 8,
            produced: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains('8'));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TranslatorError>();
    }
}

// Integration Tests - Pipeline

mod pipeline_tests {
    use super::*;

    fn echo_translator() -> Translator {
        let (model, tokenizer) = copier(&["hallo", "heimur", "daginn"]);
        Translator::builder()
            .model(model)
            .tokenizer(tokenizer)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_batch_preserves_content_and_order() {
        let t = echo_translator();
        let input = vec![
            "hallo heimur".to_string(),
            String::new(),
            "daginn".to_string(),
        ];
        let output = t.translate_batch(&input).await.unwrap();
        assert_eq!(output, vec!["hallo heimur", "", "daginn"]);
    }

    #[tokio::test]
    async fn test_single_sentence() {
        let t = echo_translator();
        assert_eq!(t.translate("heimur hallo").await.unwrap(), "heimur hallo");
    }

    #[tokio::test]
    async fn test_unknown_source_word_surfaces_as_unk() {
        let t = echo_translator();
        assert_eq!(t.translate("hallo jörð").await.unwrap(), "hallo <unk>");
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty_output() {
        let t = echo_translator();
        let output = t.translate_batch(&[]).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_two_member_ensemble_agrees_with_single_copier() {
        let (a, tokenizer) = copier(&["hallo", "heimur"]);
        let (b, _) = copier(&["hallo", "heimur"]);
        let t = Translator::builder()
            .models([a, b])
            .tokenizer(tokenizer)
            .build()
            .unwrap();
        assert_eq!(t.translate("hallo heimur").await.unwrap(), "hallo heimur");
    }

    #[tokio::test]
    async fn test_translation_is_idempotent() {
        let t = echo_translator();
        let input = vec!["daginn hallo".to_string()];
        let first = t.translate_batch(&input).await.unwrap();
        let second = t.translate_batch(&input).await.unwrap();
        assert_eq!(first, second);
    }
}

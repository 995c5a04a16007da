use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use thyda::{Seq2SeqModel, TableModel, Tokenizer, Translator};

pub async fn run(
    models: &str,
    srctext: &Path,
    tgtout: &Path,
    batch_size: usize,
    beam_size: usize,
    len_pen: f32,
    max_delta_length: usize,
    max_length: usize,
) -> Result<()> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let mut ensemble: Vec<Arc<dyn Seq2SeqModel>> = Vec::new();
    let mut tokenizer: Option<Arc<dyn Tokenizer>> = None;
    for path in models.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let model = TableModel::from_file(path)?;
        if tokenizer.is_none() {
            // The first model's tokenizer serves the whole ensemble.
            tokenizer = Some(Arc::new(model.word_tokenizer()));
        }
        ensemble.push(Arc::new(model));
    }
    let Some(tokenizer) = tokenizer else {
        bail!("no model files given");
    };

    info!("loaded {} model(s)", ensemble.len());

    let translator = Translator::builder()
        .models(ensemble)
        .tokenizer(tokenizer)
        .beam_size(beam_size)
        .len_pen(len_pen)
        .max_delta_length(max_delta_length)
        .max_sequence_length(max_length)
        .build()?;

    info!("translating {}", srctext.display());

    let reader = BufReader::new(
        File::open(srctext)
            .with_context(|| format!("failed to open input '{}'", srctext.display()))?,
    );
    let mut pending: Vec<String> = Vec::new();
    let mut translated: Vec<String> = Vec::new();
    for line in reader.lines() {
        pending.push(line?.trim().to_string());
        if pending.len() == batch_size {
            translated.extend(translator.translate_batch(&pending).await?);
            pending.clear();
        }
    }
    if !pending.is_empty() {
        translated.extend(translator.translate_batch(&pending).await?);
    }

    // Written only after every batch has decoded, so a failure part-way
    // through never leaves a partial output file behind.
    let mut out = File::create(tgtout)
        .with_context(|| format!("failed to create output '{}'", tgtout.display()))?;
    for line in &translated {
        writeln!(out, "{}", line)?;
    }

    info!(
        "wrote {} translation(s) to {}",
        translated.len(),
        tgtout.display()
    );
    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "thyda")]
#[command(about = "Ensemble beam-search translation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a text file line by line
    Translate {
        /// Comma-separated list of model files
        #[arg(long)]
        models: String,

        /// Input file to be translated, one sentence per line
        #[arg(long)]
        srctext: PathBuf,

        /// Output file to write translations to
        #[arg(long)]
        tgtout: PathBuf,

        /// Number of sentences to batch together
        #[arg(long, default_value_t = 256)]
        batch_size: usize,

        /// Beam size
        #[arg(long, default_value_t = 4)]
        beam_size: usize,

        /// Length penalty
        #[arg(long, default_value_t = 0.6)]
        len_pen: f32,

        /// Maximum length difference between input and output
        #[arg(long, default_value_t = 5)]
        max_delta_length: usize,

        /// Hard cap on generated tokens per sentence
        #[arg(long, default_value_t = 512)]
        max_length: usize,
    },
}

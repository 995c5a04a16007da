mod commands;

use anyhow::Result;
use clap::Parser;

use thyda_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Translate {
            models,
            srctext,
            tgtout,
            batch_size,
            beam_size,
            len_pen,
            max_delta_length,
            max_length,
        } => {
            commands::translate::run(
                &models,
                &srctext,
                &tgtout,
                batch_size,
                beam_size,
                len_pen,
                max_delta_length,
                max_length,
            )
            .await
        }
    }
}

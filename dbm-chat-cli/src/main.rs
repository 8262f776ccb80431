//! `dbm-chat`: command line front end of the chat training pipeline.
//!
//!   dbm-chat partition chat.csv        split a transcript into label folders
//!   dbm-chat train chat.csv            train embeddings + classifier
//!   dbm-chat classify -m chat.network "text"
//!   dbm-chat sample -c data/chat.txt   generate text from a corpus
//!   dbm-chat bot                       feed stdin lines to the chat bot

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commands::Command;
use dbm_chat_core::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "dbm-chat", version, about = "Chat transcript training and character sampling")]
struct Cli {
    /// Pipeline configuration file (TOML); defaults are used when absent
    #[arg(long, global = true, env = "DBM_CHAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    cli.command.run(config)
}

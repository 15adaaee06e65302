//! Command-line interface for plotguard.
//!
//! Every command reads an outline (JSON, or YAML when the file ends in
//! `.yaml`/`.yml`) and prints JSON, except `instructions` which prints the
//! rendered text block.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "plotguard")]
#[command(about = "Narrative contract extraction and QC for generated episodes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// QC profile: a preset name (`standard`, `strict`) or a YAML file
    #[arg(long, global = true, env = "PLOTGUARD_PROFILE", default_value = "standard")]
    pub profile: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check an outline before any generation
    Gate {
        outline: PathBuf,

        /// Expected number of episodes (0 skips the count check)
        #[arg(short, long, default_value = "0")]
        episodes: u32,
    },

    /// Extract the contract of one episode
    Contract {
        outline: PathBuf,

        #[arg(short, long)]
        episode: u32,
    },

    /// Split an episode contract into generation batches
    Plan {
        outline: PathBuf,

        #[arg(short, long)]
        episode: u32,

        #[arg(short, long, default_value = "4")]
        batches: u32,

        #[arg(short, long, default_value = "3")]
        scenes: u32,
    },

    /// Validate a finished script against its episode contract
    Script {
        outline: PathBuf,

        script: PathBuf,

        #[arg(short, long)]
        episode: u32,
    },

    /// Render the generator instructions for one batch
    Instructions {
        outline: PathBuf,

        #[arg(short, long)]
        episode: u32,

        /// 1-based batch number
        #[arg(long)]
        batch: u32,

        #[arg(long, default_value = "4")]
        batches: u32,

        #[arg(short, long, default_value = "3")]
        scenes: u32,

        /// Template file overriding the built-in set
        #[arg(long)]
        templates: Option<PathBuf>,
    },
}

use crate::utils::constants::MAX_WORKERS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meteo-processor")]
#[command(about = "Reconcile and extract Météo-France hourly observation archives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: ./meteo.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the registry stations to stations.csv.gz
    Stations(SourceArgs),

    /// Scan the observation shards and write stations-missings.csv.gz
    MissingStations(SourceArgs),

    /// Extract hourly temperatures, one table per period
    Temperatures(SourceArgs),

    /// Extract temperatures, then write registry and inferred stations together
    All(SourceArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(long, help = "Station registry CSV")]
    pub stations_file: Option<PathBuf>,

    #[arg(long, help = "Folder holding the historic/previous/latest shards")]
    pub observations_dir: Option<PathBuf>,

    #[arg(short, long, help = "Output folder")]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Periods to process: latest, previous, historic, >YYYY or a label substring"
    )]
    pub period: Option<String>,

    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u8).range(1..=95),
        help = "Single department to process"
    )]
    pub department: Option<u8>,

    #[arg(
        long,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=MAX_WORKERS as u64),
        help = "Worker threads, 1 to 64 [default: 8]"
    )]
    pub workers: Option<usize>,

    #[arg(long, help = "Rows buffered per shard before a write [default: 10000]")]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Write a JSON run summary to this path")]
    pub summary: Option<PathBuf>,
}

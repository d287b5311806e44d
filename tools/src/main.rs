mod annotation;
mod convert;
mod feature_set_size;
mod info;
mod pgn_converter;
mod stats;

use crate::convert::convert;
use crate::feature_set_size::feature_set_size;
use crate::info::info;
use crate::stats::stats;
use clap::{Parser, Subcommand};
use convert::ConvertCommand;
use feature_set_size::FeatureSetSizeCommand;
use info::InfoCommand;
use stats::StatsCommand;
use std::error::Error;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts annotated PGN games into a binary training corpus
    Convert(ConvertCommand),
    /// Prints the features of a position or the first records of a corpus
    Info(InfoCommand),
    /// Walks a corpus the way a training process would and reports what it saw
    Stats(StatsCommand),
    /// Displays the size of a feature set
    FeatureSetSize(FeatureSetSizeCommand),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match args.command {
        Commands::Convert(cmd) => convert(cmd),
        Commands::Info(cmd) => info(cmd),
        Commands::Stats(cmd) => stats(cmd),
        Commands::FeatureSetSize(cmd) => feature_set_size(cmd),
    }
}

mod convert;
mod stats;
mod step;
mod util;

use clap::{Parser, Subcommand};
use convert::{run_convert, ConvertArgs};
use stats::{run_stats, StatsArgs};
use step::{run_step, StepArgs};

#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Convert a cell state between the supported file formats
    Convert(ConvertArgs),
    /// Advance a cell state by a number of generations
    Step(StepArgs),
    /// Print population, bounding box and metadata of a cell state
    Stats(StatsArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = CLIParser::parse();

    match args.action {
        Action::Convert(args) => run_convert(args),
        Action::Step(args) => run_step(args),
        Action::Stats(args) => run_stats(args),
    }
}

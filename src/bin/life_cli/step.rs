use crate::util::{
    local_time, output_format, print_population, read_cell_state, write_cell_state, FormatArg,
};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use life_engines::{
    evolve, hashlife::DEFAULT_MEM_LIMIT_MIB, Algorithm, AlgorithmKind, CancelToken,
    GameOfLifeAlgorithm, Rule,
};

#[derive(Args, Debug)]
pub(super) struct StepArgs {
    /// Path to the file containing the pattern
    input: String,

    /// Path to the file where the resulting pattern will be saved
    #[arg(short, long)]
    output: String,

    /// Number of generations to advance
    #[arg(short, long)]
    generations: u64,

    /// The algorithm to use for the simulation
    #[arg(short, long, value_enum, default_value_t = Engine::Hashlife)]
    engine: Engine,

    /// Rule such as B36/S23; defaults to the rule declared by the input, then B3/S23
    #[arg(short, long)]
    rule: Option<String>,

    /// Soft limit (in MiB) of the HashLife node cache
    #[arg(short, long, default_value_t = DEFAULT_MEM_LIMIT_MIB)]
    mem_limit_mib: u32,

    /// Format of the input, overriding detection
    #[arg(long, value_enum)]
    input_format: Option<FormatArg>,

    /// Format of the output, inferred from the output extension by default
    #[arg(long, value_enum)]
    output_format: Option<FormatArg>,

    /// Print population of the resulting pattern
    #[arg(short, long)]
    population: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Count the neighbors of every alive cell, one generation at a time
    Naive,
    /// See https://conwaylife.com/wiki/HashLife
    Hashlife,
}

impl From<Engine> for AlgorithmKind {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Naive => AlgorithmKind::Naive,
            Engine::Hashlife => AlgorithmKind::HashLife,
        }
    }
}

pub(super) fn run_step(args: StepArgs) -> Result<()> {
    let format = output_format(&args.output, args.output_format)?;
    let mut parsed = read_cell_state(&args.input, args.input_format)?;

    let rule = match &args.rule {
        Some(x) => x.parse::<Rule>().context("Invalid --rule")?,
        None => parsed.metadata.rule.unwrap_or_default(),
    };
    let algorithm = Algorithm::new(args.engine.into(), args.mem_limit_mib);

    let timer = std::time::Instant::now();
    let evolution = evolve(
        &algorithm,
        &parsed.cell_state,
        &rule,
        args.generations,
        &CancelToken::new(),
    )
    .context("Simulation failed")?;
    println!(
        "[{}] Updated pattern by {} generations under {} in {:.1} secs",
        local_time(),
        args.generations,
        rule,
        timer.elapsed().as_secs_f64()
    );
    log::debug!("Algorithm caches use {} bytes", algorithm.bytes_total());

    if args.population {
        print_population(&evolution.cell_state);
    }
    parsed.metadata.rule = Some(rule);
    parsed.metadata.declared_size = None;
    write_cell_state(&args.output, &evolution.cell_state, &parsed.metadata, format)
}

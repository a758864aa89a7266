use crate::util::{print_population, read_cell_state, FormatArg};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub(super) struct StatsArgs {
    /// Path to the file containing the pattern
    input: String,

    /// Format of the input, overriding detection
    #[arg(long, value_enum)]
    input_format: Option<FormatArg>,
}

pub(super) fn run_stats(args: StatsArgs) -> Result<()> {
    let timer = std::time::Instant::now();
    let parsed = read_cell_state(&args.input, args.input_format)?;
    let metadata = &parsed.metadata;

    if let Some(name) = &metadata.name {
        println!("Name: {}", name);
    }
    for line in &metadata.description {
        println!("  {}", line);
    }
    println!("Rule: {}", metadata.rule.unwrap_or_default());
    if let Some((width, height)) = metadata.declared_size {
        println!("Declared size: {}x{}", width, height);
    }
    print_population(&parsed.cell_state);
    match parsed.cell_state.bounding_box() {
        Some(bbox) => println!(
            "Bounding box: {}x{} at ({}, {})",
            bbox.width(),
            bbox.height(),
            bbox.min.x,
            bbox.min.y
        ),
        None => println!("Bounding box: none"),
    }
    println!(
        "Computed stats in {:.1} secs",
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}

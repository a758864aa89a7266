use crate::util::{output_format, read_cell_state, write_cell_state, FormatArg};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub(super) struct ConvertArgs {
    /// Path to the input file; the format is detected from the extension and
    /// the content, gzip-compressed files are inflated
    input: String,

    /// Path to the output file; a trailing .gz compresses the output
    #[arg(short, long)]
    output: String,

    /// Format of the input, overriding detection
    #[arg(long, value_enum)]
    input_format: Option<FormatArg>,

    /// Format of the output, inferred from the output extension by default
    #[arg(long, value_enum)]
    output_format: Option<FormatArg>,

    /// Replace the pattern name
    #[arg(short, long)]
    name: Option<String>,
}

pub(super) fn run_convert(args: ConvertArgs) -> Result<()> {
    let format = output_format(&args.output, args.output_format)?;
    let mut parsed = read_cell_state(&args.input, args.input_format)?;
    if let Some(name) = args.name {
        parsed.metadata.name = Some(name);
    }
    write_cell_state(&args.output, &parsed.cell_state, &parsed.metadata, format)
}

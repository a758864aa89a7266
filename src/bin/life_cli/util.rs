use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::ValueEnum;
use life_engines::{
    format, CellState, CellStateFormat, CellStateMetadata, FixedFormat, ParsedCellState,
};
use num_format::{CustomFormat, Grouping, ToFormattedString};
use std::path::Path;

/// Format names accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum FormatArg {
    /// See https://conwaylife.com/wiki/Plaintext
    Plaintext,
    /// See https://conwaylife.com/wiki/Life_1.05
    Life105,
    /// See https://conwaylife.com/wiki/Life_1.06
    Life106,
    /// See https://conwaylife.com/wiki/Run_Length_Encoded
    Rle,
    /// See https://conwaylife.com/wiki/Macrocell
    Macrocell,
}

impl From<FormatArg> for FixedFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Plaintext => FixedFormat::Plaintext,
            FormatArg::Life105 => FixedFormat::Life105,
            FormatArg::Life106 => FixedFormat::Life106,
            FormatArg::Rle => FixedFormat::RunLengthEncoding,
            FormatArg::Macrocell => FixedFormat::Macrocell,
        }
    }
}

pub(super) fn read_cell_state(path: &str, format: Option<FormatArg>) -> Result<ParsedCellState> {
    let timer = std::time::Instant::now();
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let detected = match format {
        Some(x) => CellStateFormat::Fixed(x.into()),
        None => CellStateFormat::from_path(Path::new(path)),
    };
    let parsed = format::parse_bytes(detected, &data)
        .with_context(|| format!("Failed to parse {}", path))?;
    println!(
        "[{}] Loaded {} pattern in {:.1} secs",
        local_time(),
        parsed.format.name(),
        timer.elapsed().as_secs_f64()
    );
    Ok(parsed)
}

/// Picks the output format from the flag or else the file extension.
/// The ambiguous `.lif`/`.life` extension is written as Life 1.06.
pub(super) fn output_format(path: &str, format: Option<FormatArg>) -> Result<FixedFormat> {
    if let Some(x) = format {
        return Ok(x.into());
    }
    match CellStateFormat::from_path(Path::new(path)) {
        CellStateFormat::Fixed(x) => Ok(x),
        CellStateFormat::Life => Ok(FixedFormat::Life106),
        CellStateFormat::Unknown => Err(anyhow!(
            "Cannot infer the output format of {}, pass --output-format",
            path
        )),
    }
}

/// Serializes and writes the state, gzip-compressed if the path ends in `.gz`.
pub(super) fn write_cell_state(
    path: &str,
    cell_state: &CellState,
    metadata: &CellStateMetadata,
    target: FixedFormat,
) -> Result<()> {
    let timer = std::time::Instant::now();
    let text = format::serialize(cell_state, metadata, target);
    let data = if path.ends_with(".gz") {
        format::compress(&text).context("Failed to compress output")?
    } else {
        text.into_bytes()
    };
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path))?;
    println!(
        "[{}] Saved {} pattern in {:.1} secs",
        local_time(),
        target.name(),
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}

pub(super) fn print_population(cell_state: &CellState) {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()
        .unwrap();
    println!(
        "Population: {}",
        cell_state.population().to_formatted_string(&fmt)
    );
}

pub(super) fn local_time() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

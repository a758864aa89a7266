//! Detection, parsing and serialization of the supported cell state formats.
//!
//! See <https://conwaylife.com/wiki/Category:File_formats> for descriptions of
//! every format.

pub(crate) mod life105;
pub(crate) mod life106;
pub(crate) mod macrocell;
pub(crate) mod plaintext;
pub(crate) mod rle;

use crate::{CellState, ParseError, Rule};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::borrow::Cow;
use std::io::{Read, Write};

/// Result of format detection. Only [`CellStateFormat::Fixed`] formats can be
/// serialized; the other two need content sniffing before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStateFormat {
    Unknown,
    /// `.lif`/`.life`: either Life 1.05 or Life 1.06.
    Life,
    Fixed(FixedFormat),
}

/// A format that can be both parsed and serialized unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedFormat {
    /// [Plaintext](https://conwaylife.com/wiki/Plaintext): `!` comments, `.`/`O` rows.
    Plaintext,
    /// [Life 1.05](https://conwaylife.com/wiki/Life_1.05): `#P` blocks of `.`/`*` rows.
    Life105,
    /// [Life 1.06](https://conwaylife.com/wiki/Life_1.06): one `x y` pair per alive cell.
    Life106,
    /// [Extended RLE](https://golly.sourceforge.io/Help/formats.html#rle).
    RunLengthEncoding,
    /// [Macrocell](https://golly.sourceforge.io/Help/formats.html#mc): quadtree node table.
    Macrocell,
}

impl FixedFormat {
    pub const ALL: [FixedFormat; 5] = [
        FixedFormat::Plaintext,
        FixedFormat::Life105,
        FixedFormat::Life106,
        FixedFormat::RunLengthEncoding,
        FixedFormat::Macrocell,
    ];

    /// Preferred file extension, without the leading dot.
    pub fn file_extension(&self) -> &'static str {
        match self {
            FixedFormat::Plaintext => "cells",
            FixedFormat::Life105 | FixedFormat::Life106 => "lif",
            FixedFormat::RunLengthEncoding => "rle",
            FixedFormat::Macrocell => "mc",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FixedFormat::Plaintext => "Plaintext",
            FixedFormat::Life105 => "Life 1.05",
            FixedFormat::Life106 => "Life 1.06",
            FixedFormat::RunLengthEncoding => "RLE",
            FixedFormat::Macrocell => "Macrocell",
        }
    }
}

impl CellStateFormat {
    /// Maps a file extension (without the leading dot) to a format.
    /// Matching is exact and case-sensitive; anything unrecognized is `Unknown`.
    pub fn from_file_extension(extension: Option<&str>) -> Self {
        match extension {
            Some("cells") => CellStateFormat::Fixed(FixedFormat::Plaintext),
            Some("lif" | "life") => CellStateFormat::Life,
            Some("rle") => CellStateFormat::Fixed(FixedFormat::RunLengthEncoding),
            Some("mc") => CellStateFormat::Fixed(FixedFormat::Macrocell),
            _ => CellStateFormat::Unknown,
        }
    }

    /// Detects the format from a path. A trailing `.gz` is skipped, since
    /// compressed input is inflated before parsing anyway.
    pub fn from_path(path: &std::path::Path) -> Self {
        let path = match path.extension() {
            Some(ext) if ext == "gz" => Cow::Owned(path.with_extension("")),
            _ => Cow::Borrowed(path),
        };
        Self::from_file_extension(path.extension().and_then(|x| x.to_str()))
    }

    /// Resolves the format to a fixed one, sniffing the content if needed.
    pub fn resolve(self, text: &str) -> Result<FixedFormat, ParseError> {
        let sniffed = match self {
            CellStateFormat::Fixed(format) => return Ok(format),
            CellStateFormat::Life => sniff_life(text),
            CellStateFormat::Unknown => sniff(text),
        };
        log::debug!("Sniffed {:?} content as {:?}", self, sniffed);
        sniffed.ok_or(ParseError::UnrecognizedFormat)
    }
}

impl From<FixedFormat> for CellStateFormat {
    fn from(format: FixedFormat) -> Self {
        CellStateFormat::Fixed(format)
    }
}

/// Distinguishes Life 1.05 from Life 1.06 by the magic line, falling back to
/// Life 1.06 when the body consists only of coordinate pairs.
fn sniff_life(text: &str) -> Option<FixedFormat> {
    let first = text.lines().map(str::trim).find(|x| !x.is_empty())?;
    if first.starts_with(life105::MAGIC) {
        Some(FixedFormat::Life105)
    } else if first.starts_with(life106::MAGIC) || life106::is_coordinate_list(text) {
        Some(FixedFormat::Life106)
    } else {
        None
    }
}

fn sniff(text: &str) -> Option<FixedFormat> {
    let first = text.lines().map(str::trim).find(|x| !x.is_empty())?;
    if first.starts_with(macrocell::MAGIC) {
        return Some(FixedFormat::Macrocell);
    }
    if let Some(format) = sniff_life(text) {
        return Some(format);
    }
    if rle::find_header(text).is_some() {
        return Some(FixedFormat::RunLengthEncoding);
    }
    if plaintext::is_plaintext(text) {
        return Some(FixedFormat::Plaintext);
    }
    None
}

/// Optional data carried alongside a [`CellState`] through a parse/serialize
/// round-trip. Formats keep as much of it as they can express.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStateMetadata {
    pub name: Option<String>,
    /// Free-form comment lines.
    pub description: Vec<String>,
    /// Rule declared by the file, which may differ from the one used to simulate.
    pub rule: Option<Rule>,
    /// Width and height declared by an RLE header; informational only.
    pub declared_size: Option<(u128, u128)>,
}

/// A successfully parsed cell state with the format it was parsed as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCellState {
    pub cell_state: CellState,
    pub metadata: CellStateMetadata,
    pub format: FixedFormat,
}

/// Parses `text` in the given (possibly ambiguous) format.
pub fn parse(format: CellStateFormat, text: &str) -> Result<ParsedCellState, ParseError> {
    let format = format.resolve(text)?;
    let (cell_state, metadata) = match format {
        FixedFormat::Plaintext => plaintext::parse(text),
        FixedFormat::Life105 => life105::parse(text),
        FixedFormat::Life106 => life106::parse(text),
        FixedFormat::RunLengthEncoding => rle::parse(text),
        FixedFormat::Macrocell => macrocell::parse(text),
    }?;
    Ok(ParsedCellState {
        cell_state,
        metadata,
        format,
    })
}

/// Same as [`parse`], but accepts raw file bytes, possibly gzip-compressed.
pub fn parse_bytes(format: CellStateFormat, data: &[u8]) -> Result<ParsedCellState, ParseError> {
    parse(format, &decode_bytes(data)?)
}

/// Serializes a cell state. Every fixed format can represent every finite
/// cell state, so this never fails.
pub fn serialize(
    cell_state: &CellState,
    metadata: &CellStateMetadata,
    format: FixedFormat,
) -> String {
    match format {
        FixedFormat::Plaintext => plaintext::serialize(cell_state, metadata),
        FixedFormat::Life105 => life105::serialize(cell_state, metadata),
        FixedFormat::Life106 => life106::serialize(cell_state),
        FixedFormat::RunLengthEncoding => rle::serialize(cell_state, metadata),
        FixedFormat::Macrocell => macrocell::serialize(cell_state, metadata),
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Converts raw bytes to text, inflating gzip-compressed data first.
pub fn decode_bytes(data: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    if data.starts_with(&GZIP_MAGIC) {
        let mut decompressed = String::new();
        GzDecoder::new(data)
            .read_to_string(&mut decompressed)
            .map_err(|e| ParseError::malformed(format!("Failed to decompress data: {}", e)))?;
        return Ok(Cow::Owned(decompressed));
    }
    std::str::from_utf8(data)
        .map(Cow::Borrowed)
        .map_err(|_| ParseError::UnrecognizedFormat)
}

/// Gzip-compresses serialized text, the inverse of [`decode_bytes`].
pub fn compress(text: &str) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    encoder.finish()
}

/// Splits the text after a leading `#` into its one-character tag and the
/// trimmed value.
pub(crate) fn split_tag(comment: &str) -> (Option<char>, &str) {
    let mut chars = comment.chars();
    let tag = chars.next();
    (tag, chars.as_str().trim())
}

/// Parses an `x y` pair of signed integers separated by whitespace.
pub(crate) fn parse_pair(s: &str) -> Option<(i64, i64)> {
    let mut parts = s.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((x, y))
}

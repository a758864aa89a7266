use super::{parse_pair, split_tag, CellStateMetadata};
use crate::{CellCoordinate, CellState, CoordinateSet, ParseError, Rule};

pub(crate) const MAGIC: &str = "#Life 1.05";

/// Parses Life 1.05 content: a mandatory magic line, `#N`/`#D`/`#R` headers and
/// `#P x y` blocks of `.`/`*` rows. Rows before the first `#P` start at the origin.
pub(crate) fn parse(text: &str) -> Result<(CellState, CellStateMetadata), ParseError> {
    let mut lines = text.lines().map(str::trim_end).skip_while(|x| x.is_empty());
    if !lines
        .next()
        .is_some_and(|magic| magic.trim_start().starts_with(MAGIC))
    {
        return Err(ParseError::UnrecognizedFormat);
    }

    let mut metadata = CellStateMetadata::default();
    let mut cells = CoordinateSet::new();
    let (mut block_x, mut y) = (0i64, 0i128);

    for line in lines {
        if let Some(header) = line.strip_prefix('#') {
            let (tag, value) = split_tag(header);
            match tag {
                Some('D' | 'C') => metadata.description.push(value.to_string()),
                // a bare "#N" is the legacy "normal rules" marker
                Some('N') if !value.is_empty() => metadata.name = Some(value.to_string()),
                Some('N') => metadata.rule = Some(Rule::CONWAY),
                Some('R') => metadata.rule = Some(Rule::parse_declared(value)?),
                Some('P') => {
                    let (px, py) = parse_pair(value).ok_or_else(|| {
                        ParseError::malformed(format!("Invalid block position '{}'", value))
                    })?;
                    (block_x, y) = (px, py as i128);
                }
                _ => log::trace!("Skipping unknown Life 1.05 line '{}'", line),
            }
            continue;
        }

        for (x, c) in line.bytes().enumerate() {
            match c {
                b'*' => {
                    let out_of_range = || ParseError::malformed("Block exceeds coordinate range");
                    let cx = block_x.checked_add(x as i64).ok_or_else(out_of_range)?;
                    let cy = i64::try_from(y).map_err(|_| out_of_range())?;
                    cells.insert(CellCoordinate::new(cx, cy));
                }
                b'.' => (),
                _ => {
                    return Err(ParseError::malformed(format!(
                        "Invalid symbol '{}' in row {}",
                        c as char, y
                    )))
                }
            }
        }
        y += 1;
    }

    Ok((CellState::new(cells), metadata))
}

/// Writes one `#P` block per run of consecutive non-blank rows, so blank space
/// between distant parts of a pattern costs nothing.
pub(crate) fn serialize(cell_state: &CellState, metadata: &CellStateMetadata) -> String {
    let mut result = format!("{}\n", MAGIC);
    if let Some(name) = &metadata.name {
        result.push_str(&format!("#N {}\n", name));
    }
    for line in &metadata.description {
        result.push_str(&format!("#D {}\n", line));
    }
    if let Some(rule) = &metadata.rule {
        result.push_str(&format!("#R {}\n", rule));
    }

    let sorted = cell_state.alive_cells().sorted();
    let mut blocks: Vec<&[CellCoordinate]> = vec![];
    let mut start = 0;
    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i].y.abs_diff(sorted[i - 1].y) > 1 {
            blocks.push(&sorted[start..i]);
            start = i;
        }
    }

    for block in blocks {
        let x0 = block.iter().map(|c| c.x).min().unwrap_or_default();
        let mut y = block[0].y;
        result.push_str(&format!("#P {} {}\n", x0, y));
        let mut column = 0u128;
        for c in block {
            if c.y != y {
                result.push('\n');
                (y, column) = (c.y, 0);
            }
            let x = c.x.abs_diff(x0) as u128;
            while column < x {
                result.push('.');
                column += 1;
            }
            result.push('*');
            column += 1;
        }
        result.push('\n');
    }
    result
}

use super::{parse_pair, CellStateMetadata};
use crate::{CellCoordinate, CellState, CoordinateSet, ParseError};

pub(crate) const MAGIC: &str = "#Life 1.06";

/// Returns true if there is at least one line and every non-empty line is an `x y` pair.
pub(crate) fn is_coordinate_list(text: &str) -> bool {
    let mut lines = text.lines().map(str::trim).filter(|x| !x.is_empty()).peekable();
    lines.peek().is_some() && lines.all(|line| parse_pair(line).is_some())
}

/// Parses Life 1.06 content. The magic line may be missing when the whole body
/// is a list of coordinate pairs; other `#` lines are ignored.
pub(crate) fn parse(text: &str) -> Result<(CellState, CellStateMetadata), ParseError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .peekable();
    match lines.peek() {
        Some(magic) if magic.starts_with(MAGIC) => {
            lines.next();
        }
        Some(_) if is_coordinate_list(text) => (),
        _ => return Err(ParseError::UnrecognizedFormat),
    }

    let mut cells = CoordinateSet::new();
    for line in lines.filter(|x| !x.starts_with('#')) {
        let (x, y) = parse_pair(line).ok_or_else(|| {
            ParseError::malformed(format!("Expected two integers, got '{}'", line))
        })?;
        cells.insert(CellCoordinate::new(x, y));
    }
    Ok((CellState::new(cells), CellStateMetadata::default()))
}

/// Life 1.06 carries no metadata, only absolute coordinates.
pub(crate) fn serialize(cell_state: &CellState) -> String {
    let mut result = format!("{}\n", MAGIC);
    for c in cell_state.alive_cells().sorted() {
        result.push_str(&format!("{} {}\n", c.x, c.y));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let (state, metadata) = parse("#Life 1.06\n0 -1\n1 0\n-1 1\n0 1\n1 1\n1 0\n").unwrap();
        let expected: CellState = [(0, -1), (1, 0), (-1, 1), (0, 1), (1, 1)]
            .into_iter()
            .map(CellCoordinate::from)
            .collect();
        assert_eq!(state, expected);
        assert_eq!(metadata, CellStateMetadata::default());
    }

    #[test]
    fn test_parse_without_magic() {
        let (state, _) = parse("3 4\n").unwrap();
        assert!(state.is_alive(CellCoordinate::new(3, 4)));
        assert_eq!(parse("").unwrap_err(), ParseError::UnrecognizedFormat);
        assert_eq!(parse("#Life 1.05\n").unwrap_err(), ParseError::UnrecognizedFormat);
    }

    #[test]
    fn test_empty_body() {
        let (state, _) = parse("#Life 1.06\n").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_malformed_lines() {
        for text in ["#Life 1.06\n1\n", "#Life 1.06\n1 2 3\n", "#Life 1.06\nx y\n"] {
            assert!(
                matches!(parse(text), Err(ParseError::MalformedContent(_))),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_serialize_is_sorted() {
        let state: CellState = [(5, 2), (-1, 2), (3, -8)]
            .into_iter()
            .map(CellCoordinate::from)
            .collect();
        assert_eq!(serialize(&state), "#Life 1.06\n3 -8\n-1 2\n5 2\n");
    }
}

use super::{parse_pair, CellStateMetadata};
use crate::{CellCoordinate, CellState, CoordinateSet, ParseError};

const NAME_PREFIX: &str = "Name:";
const ORIGIN_PREFIX: &str = "Origin:";

/// Returns true if every non-empty line is either a comment or a row of `.`/`O`.
pub(crate) fn is_plaintext(text: &str) -> bool {
    let mut lines = text.lines().map(str::trim_end).filter(|x| !x.is_empty()).peekable();
    lines.peek().is_some()
        && lines.all(|line| line.starts_with('!') || line.bytes().all(|b| b == b'.' || b == b'O'))
}

/// Parses Plaintext content.
///
/// `!` lines are comments. The first one is the name, with or without a
/// `Name:` prefix, and a `!Origin: x y` line directly above the first row
/// places the top-left corner. All other comments form the description.
/// Every other line is a row, shorter rows being padded with dead cells.
/// Empty input yields an empty state.
pub(crate) fn parse(text: &str) -> Result<(CellState, CellStateMetadata), ParseError> {
    let mut metadata = CellStateMetadata::default();
    let mut seen_comment = false;
    let (mut dx, mut dy) = (0i64, 0i64);
    let mut cells = Vec::new();
    let mut y = 0i64;

    let mut lines = text.lines().map(str::trim_end).peekable();
    while let Some(line) = lines.next() {
        if let Some(comment) = line.strip_prefix('!') {
            let first = !seen_comment;
            seen_comment = true;
            let above_row = lines.peek().is_some_and(|next| !next.starts_with('!'));
            match (comment.strip_prefix(NAME_PREFIX), comment.strip_prefix(ORIGIN_PREFIX)) {
                (Some(name), _) if first => {
                    metadata.name = Some(name.trim().to_string()).filter(|x| !x.is_empty());
                }
                (_, Some(origin)) if above_row => {
                    (dx, dy) = parse_pair(origin).ok_or_else(|| {
                        ParseError::malformed(format!("Invalid origin '{}'", origin.trim()))
                    })?;
                }
                _ if first => {
                    metadata.name = Some(comment.trim().to_string()).filter(|x| !x.is_empty());
                }
                _ => metadata.description.push(comment.to_string()),
            }
            continue;
        }

        for (x, c) in line.bytes().enumerate() {
            match c {
                b'O' => cells.push((x as i64, y)),
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

    let cells = cells
        .into_iter()
        .map(|(x, y)| Some(CellCoordinate::new(x.checked_add(dx)?, y.checked_add(dy)?)))
        .collect::<Option<CoordinateSet>>()
        .ok_or_else(|| ParseError::malformed("Origin moves cells out of range"))?;
    Ok((CellState::new(cells), metadata))
}

pub(crate) fn serialize(cell_state: &CellState, metadata: &CellStateMetadata) -> String {
    let mut result = String::new();
    if let Some(name) = &metadata.name {
        result.push_str(&format!("!{} {}\n", NAME_PREFIX, name));
    } else if !metadata.description.is_empty() {
        // keeps the first description line from being read back as the name
        result.push_str("!\n");
    }
    for line in &metadata.description {
        result.push_str(&format!("!{}\n", line));
    }

    let Some(bbox) = cell_state.bounding_box() else {
        return result;
    };
    // a description line that looks like an origin must not end up directly above the rows
    let ambiguous = metadata
        .description
        .last()
        .is_some_and(|x| x.starts_with(ORIGIN_PREFIX));
    if bbox.min != CellCoordinate::default() || ambiguous {
        result.push_str(&format!("!{} {} {}\n", ORIGIN_PREFIX, bbox.min.x, bbox.min.y));
    }

    let mut row = Vec::new();
    let mut cells = cell_state.alive_cells().sorted().into_iter().peekable();
    for y in bbox.min.y..=bbox.max.y {
        row.clear();
        while let Some(c) = cells.next_if(|c| c.y == y) {
            let x = c.x.abs_diff(bbox.min.x) as usize;
            row.resize(x, b'.');
            row.push(b'O');
        }
        if row.is_empty() {
            row.push(b'.');
        }
        result.extend(row.iter().map(|&b| b as char));
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(i64, i64)]) -> CellState {
        coords.iter().map(|&c| CellCoordinate::from(c)).collect()
    }

    #[test]
    fn test_single_cell() {
        let (state, metadata) = parse("O").unwrap();
        assert_eq!(state, cells(&[(0, 0)]));
        assert_eq!(metadata, CellStateMetadata::default());
    }

    #[test]
    fn test_empty() {
        let (state, _) = parse("").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_comments_and_padding() {
        let text = "!Glider\n!A small spaceship.\n!Found in 1969.\n.O   \n..O\nOOO\n";
        let (state, metadata) = parse(text).unwrap();
        assert_eq!(state, cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]));
        assert_eq!(metadata.name.as_deref(), Some("Glider"));
        assert_eq!(metadata.description, vec!["A small spaceship.", "Found in 1969."]);
    }

    #[test]
    fn test_name_prefix() {
        let (_, metadata) = parse("!Name: Blinker\n!Name: not a name\nOOO").unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Blinker"));
        assert_eq!(metadata.description, vec!["Name: not a name"]);
    }

    #[test]
    fn test_origin_only_above_rows() {
        let (state, metadata) = parse("!Origin: 5 6\n!Origin: 1 2\nO").unwrap();
        assert_eq!(state, cells(&[(1, 2)]));
        assert_eq!(metadata.name.as_deref(), Some("Origin: 5 6"));
        let (state, metadata) = parse("!\n!Origin: 1 2").unwrap();
        assert!(state.is_empty());
        assert_eq!(metadata.description, vec!["Origin: 1 2"]);
    }

    #[test]
    fn test_description_resembling_headers() {
        let metadata = CellStateMetadata {
            name: None,
            description: vec!["Name: Blinker".to_string(), "Origin: 9 9".to_string()],
            ..Default::default()
        };
        for state in [cells(&[(0, 0), (1, 0), (2, 0)]), cells(&[(-3, 4)]), CellState::empty()] {
            let text = serialize(&state, &metadata);
            assert_eq!(parse(&text).unwrap(), (state, metadata.clone()));
        }
    }

    #[test]
    fn test_invalid_symbol() {
        assert!(matches!(parse("O*O"), Err(ParseError::MalformedContent(_))));
    }

    #[test]
    fn test_serialize() {
        let state = cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let metadata = CellStateMetadata {
            name: Some("Glider".to_string()),
            ..Default::default()
        };
        assert_eq!(serialize(&state, &metadata), "!Name: Glider\n.O\n..O\nOOO\n");
    }

    #[test]
    fn test_roundtrip_with_offset_and_blank_rows() {
        let state = cells(&[(-4, -7), (3, -7), (0, -2)]);
        let metadata = CellStateMetadata {
            description: vec!["no name".to_string()],
            ..Default::default()
        };
        let text = serialize(&state, &metadata);
        let (parsed, parsed_metadata) = parse(&text).unwrap();
        assert_eq!(parsed, state);
        assert_eq!(parsed_metadata, metadata);
    }
}

use super::{parse_pair, split_tag, CellStateMetadata};
use crate::{CellCoordinate, CellState, CoordinateSet, ParseError, Rule};

/// Maximum length of a body line written by [`serialize`].
const LINE_LENGTH: usize = 70;

fn is_header(line: &str) -> bool {
    line.strip_prefix('x')
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Returns the `x = ..., y = ...` header line if it is the first line that is
/// neither blank nor a `#` comment.
pub(crate) fn find_header(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|x| !x.is_empty() && !x.starts_with('#'))
        .filter(|x| is_header(x))
}

/// Parses the comma-separated `key = value` pairs of the header.
fn parse_header(line: &str, metadata: &mut CellStateMetadata) -> Result<(), ParseError> {
    let (mut width, mut height) = (None, None);
    for part in line.split(',').map(str::trim).filter(|x| !x.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| ParseError::malformed(format!("Invalid header entry '{}'", part)))?;
        let size = || {
            value
                .parse::<u128>()
                .map_err(|_| ParseError::malformed(format!("Invalid header size '{}'", value)))
        };
        match key {
            "x" => width = Some(size()?),
            "y" => height = Some(size()?),
            "rule" => metadata.rule = Some(Rule::parse_declared(value)?),
            _ => log::trace!("Skipping unknown RLE header entry '{}'", part),
        }
    }
    match (width, height) {
        (Some(w), Some(h)) => {
            metadata.declared_size = Some((w, h));
            Ok(())
        }
        _ => Err(ParseError::malformed("Header must declare both x and y")),
    }
}

/// Parses extended RLE.
///
/// `#N` is the name, `#C`/`#c`/`#O` lines form the description, `#r` declares
/// the rule and `#R x y`/`#P x y` place the top-left corner. The header is
/// mandatory even for an empty pattern and the body must be terminated by `!`;
/// anything after it is ignored.
pub(crate) fn parse(text: &str) -> Result<(CellState, CellStateMetadata), ParseError> {
    let mut metadata = CellStateMetadata::default();
    let (mut dx, mut dy) = (0i64, 0i64);

    let mut lines = text.lines().map(str::trim);
    loop {
        let Some(line) = lines.next() else {
            return Err(ParseError::UnrecognizedFormat);
        };
        if line.is_empty() {
            continue;
        }
        let Some(comment) = line.strip_prefix('#') else {
            if !is_header(line) {
                return Err(ParseError::UnrecognizedFormat);
            }
            parse_header(line, &mut metadata)?;
            break;
        };
        let (tag, value) = split_tag(comment);
        match tag {
            Some('N') => metadata.name = Some(value.to_string()).filter(|x| !x.is_empty()),
            Some('C' | 'c' | 'O') => metadata.description.push(value.to_string()),
            Some('r') => metadata.rule = Some(Rule::parse_declared(value)?),
            Some('R' | 'P') => {
                (dx, dy) = parse_pair(value).ok_or_else(|| {
                    ParseError::malformed(format!("Invalid offset '{}'", value))
                })?;
            }
            _ => log::trace!("Skipping unknown RLE line '{}'", line),
        }
    }

    let out_of_range = || ParseError::malformed("Pattern exceeds coordinate range");
    let to_i64 = |v: i128| i64::try_from(v).map_err(|_| out_of_range());
    let mut cells = CoordinateSet::new();
    // relative to the declared top-left corner
    let (mut x, mut y) = (0i128, 0i128);
    let mut count: Option<u64> = None;
    let mut terminated = false;

    'body: for line in lines.filter(|x| !x.starts_with('#')) {
        for b in line.bytes() {
            match b {
                b'0'..=b'9' => {
                    let n = count
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|n| n.checked_add((b - b'0') as u64))
                        .ok_or_else(|| ParseError::malformed("Run count is too large"))?;
                    count = Some(n);
                    continue;
                }
                b'b' | b'.' => x += count.unwrap_or(1) as i128,
                b'o' => {
                    let run = count.unwrap_or(1) as i128;
                    let first = dx as i128 + x;
                    if run > 0 {
                        // the whole run is checked before anything is inserted
                        let cy = to_i64(dy as i128 + y)?;
                        to_i64(first)?;
                        to_i64(first + run - 1)?;
                        cells.extend((first..first + run).map(|cx| CellCoordinate::new(cx as i64, cy)));
                    }
                    x += run;
                }
                b'$' => {
                    y += count.unwrap_or(1) as i128;
                    x = 0;
                }
                b'!' if count.is_none() => {
                    terminated = true;
                    break 'body;
                }
                b'!' => return Err(ParseError::malformed("Run count without a state before '!'")),
                b' ' | b'\t' => {
                    if count.is_some() {
                        return Err(ParseError::malformed("Run count separated from its state"));
                    }
                }
                _ => {
                    return Err(ParseError::malformed(format!(
                        "Invalid RLE character '{}'",
                        b as char
                    )))
                }
            }
            count = None;
        }
    }

    if !terminated {
        return Err(ParseError::malformed("Missing terminating '!'"));
    }
    Ok((CellState::new(cells), metadata))
}

/// Appends tokens to the body, starting a new line before any token that
/// would make the current one longer than [`LINE_LENGTH`].
struct BodyWriter {
    result: String,
    line_length: usize,
}

impl BodyWriter {
    fn push_run(&mut self, count: u64, tag: char) {
        match count {
            0 => (),
            1 => self.push_token(&tag.to_string()),
            _ => self.push_token(&format!("{}{}", count, tag)),
        }
    }

    fn push_token(&mut self, token: &str) {
        if self.line_length > 0 && self.line_length + token.len() > LINE_LENGTH {
            self.result.push('\n');
            self.line_length = 0;
        }
        self.line_length += token.len();
        self.result.push_str(token);
    }
}

/// Writes minimal RLE: maximal runs are merged, dead cells at the end of a row
/// and blank rows at the end of the pattern are never written, and consecutive
/// row ends collapse into one `N$` token.
pub(crate) fn serialize(cell_state: &CellState, metadata: &CellStateMetadata) -> String {
    let mut result = String::new();
    if let Some(name) = &metadata.name {
        result.push_str(&format!("#N {}\n", name));
    }
    for line in &metadata.description {
        result.push_str(&format!("#C {}\n", line));
    }
    let rule = metadata.rule.unwrap_or_default();

    let Some(bbox) = cell_state.bounding_box() else {
        result.push_str(&format!("x = 0, y = 0, rule = {}\n!", rule));
        return result;
    };
    if bbox.min != CellCoordinate::default() {
        result.push_str(&format!("#R {} {}\n", bbox.min.x, bbox.min.y));
    }
    result.push_str(&format!(
        "x = {}, y = {}, rule = {}\n",
        bbox.width(),
        bbox.height(),
        rule
    ));

    let mut body = BodyWriter {
        result,
        line_length: 0,
    };
    let (mut y, mut x) = (bbox.min.y, 0u64);
    let mut alive_run = 0u64;
    for c in cell_state.alive_cells().sorted() {
        let cx = c.x.abs_diff(bbox.min.x);
        if c.y != y {
            body.push_run(alive_run, 'o');
            body.push_run(c.y.abs_diff(y), '$');
            (y, x, alive_run) = (c.y, 0, 0);
        }
        if cx != x + alive_run {
            body.push_run(alive_run, 'o');
            body.push_run(cx - x - alive_run, 'b');
            (x, alive_run) = (cx, 0);
        }
        alive_run += 1;
    }
    body.push_run(alive_run, 'o');
    body.push_token("!");
    body.result
}

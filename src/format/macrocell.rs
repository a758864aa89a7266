use super::{parse_pair, split_tag, CellStateMetadata};
use crate::quadtree::{NodeIdx, NodeKey, QuadTree, Root, LEAF_LEVEL, MAX_LEVEL};
use crate::{CellCoordinate, CellState, CoordinateSet, ParseError, Rule, VERSION};
use ahash::AHashMap as HashMap;

pub(crate) const MAGIC: &str = "[M2]";

fn parse_leaf(line: &str) -> Result<u64, ParseError> {
    let mut cells = 0u64;
    let (mut i, mut j) = (0, 0);
    for c in line.bytes() {
        match c {
            b'$' => (i, j) = (i + 1, 0),
            b'*' | b'.' => {
                if i >= 8 || j >= 8 {
                    return Err(ParseError::malformed(format!(
                        "Leaf '{}' does not fit in 8x8",
                        line
                    )));
                }
                if c == b'*' {
                    cells |= 1 << (i * 8 + j);
                }
                j += 1;
            }
            _ => {
                return Err(ParseError::malformed(format!(
                    "Invalid symbol '{}' in leaf '{}'",
                    c as char, line
                )))
            }
        }
    }
    Ok(cells)
}

/// Parses Macrocell content into the shared quadtree, then expands the last
/// node into absolute coordinates.
///
/// Node lines are either 8x8 leaves of `.`/`*`/`$`, or `level nw ne sw se`
/// where children are 1-based indices of earlier node lines and `0` is an
/// empty child. `#P x y` places the top-left corner of the root, which
/// otherwise sits at the origin. A file without node lines is empty.
pub(crate) fn parse(text: &str) -> Result<(CellState, CellStateMetadata), ParseError> {
    let mut lines = text.lines().map(str::trim).filter(|x| !x.is_empty());
    if !lines.next().is_some_and(|magic| magic.starts_with(MAGIC)) {
        return Err(ParseError::UnrecognizedFormat);
    }

    let mut metadata = CellStateMetadata::default();
    let (mut dx, mut dy) = (0i64, 0i64);
    let mut tree = QuadTree::new();
    let mut codes: Vec<(NodeIdx, u32)> = vec![];

    for line in lines {
        if let Some(comment) = line.strip_prefix('#') {
            let (tag, value) = split_tag(comment);
            match tag {
                Some('N') => metadata.name = Some(value.to_string()).filter(|x| !x.is_empty()),
                Some('C' | 'D') => metadata.description.push(value.to_string()),
                Some('R') => metadata.rule = Some(Rule::parse_declared(value)?),
                Some('P') => {
                    (dx, dy) = parse_pair(value).ok_or_else(|| {
                        ParseError::malformed(format!("Invalid position '{}'", value))
                    })?;
                }
                _ => log::trace!("Skipping unknown Macrocell line '{}'", line),
            }
            continue;
        }

        let code = if line.as_bytes()[0].is_ascii_digit() {
            let numbers = line
                .split_whitespace()
                .map(|x| {
                    x.parse::<u32>().map_err(|_| {
                        ParseError::malformed(format!("Failed to parse integer from '{}'", x))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let &[level, nw, ne, sw, se] = &numbers[..] else {
                return Err(ParseError::malformed(format!(
                    "Expected 5 numbers, got {}",
                    numbers.len()
                )));
            };
            if !(LEAF_LEVEL + 1..=MAX_LEVEL).contains(&level) {
                return Err(ParseError::malformed(format!(
                    "Node {} has level {}, expected {}..={}",
                    codes.len() + 1,
                    level,
                    LEAF_LEVEL + 1,
                    MAX_LEVEL
                )));
            }

            let mut resolve = |x: u32| -> Result<NodeIdx, ParseError> {
                if x == 0 {
                    return Ok(tree.blank(level - 1));
                }
                let &(idx, child_level) = codes.get(x as usize - 1).ok_or_else(|| {
                    ParseError::malformed(format!("Reference to undeclared node {}", x))
                })?;
                if child_level != level - 1 {
                    return Err(ParseError::malformed(format!(
                        "Node {} has level {}, expected {}",
                        x,
                        child_level,
                        level - 1
                    )));
                }
                Ok(idx)
            };
            let nw = resolve(nw)?;
            let ne = resolve(ne)?;
            let sw = resolve(sw)?;
            let se = resolve(se)?;
            (tree.mem.find_or_create_node(nw, ne, sw, se), level)
        } else {
            (tree.mem.find_or_create_leaf(parse_leaf(line)?), LEAF_LEVEL)
        };
        codes.push(code);
    }

    let mut cells = CoordinateSet::new();
    if let Some(&(idx, level)) = codes.last() {
        let root = Root {
            idx,
            level,
            x: dx as i128,
            y: dy as i128,
        };
        tree.flatten(&root, &mut cells)
            .map_err(|_| ParseError::malformed("Pattern exceeds coordinate range"))?;
    }
    Ok((CellState::new(cells), metadata))
}

/// Writes every distinct non-blank node once, children before parents, so the
/// last line is the root.
pub(crate) fn serialize(cell_state: &CellState, metadata: &CellStateMetadata) -> String {
    fn inner(
        tree: &QuadTree,
        idx: NodeIdx,
        codes: &mut HashMap<NodeIdx, usize>,
        result: &mut String,
    ) -> usize {
        if let Some(&x) = codes.get(&idx) {
            return x;
        }
        let node = tree.mem.get(idx);
        if node.is_blank {
            return 0;
        }

        match node.key {
            NodeKey::Leaf(_) => {
                for row in node.leaf_cells() {
                    for i in 0..8 {
                        result.push(if (row >> i) & 1 != 0 { '*' } else { '.' });
                    }
                    while result.ends_with('.') {
                        result.pop();
                    }
                    result.push('$');
                }
                while result.ends_with("$$") {
                    result.pop();
                }
                result.push('\n');
            }
            NodeKey::Node { nw, ne, sw, se } => {
                let new_line = format!(
                    "{} {} {} {} {}\n",
                    node.level,
                    inner(tree, nw, codes, result),
                    inner(tree, ne, codes, result),
                    inner(tree, sw, codes, result),
                    inner(tree, se, codes, result),
                );
                result.push_str(&new_line);
            }
        }
        codes.insert(idx, codes.len() + 1);
        codes.len()
    }

    let mut result = format!("{} (life_engines {})\n", MAGIC, VERSION);
    if let Some(name) = &metadata.name {
        result.push_str(&format!("#N {}\n", name));
    }
    for line in &metadata.description {
        result.push_str(&format!("#C {}\n", line));
    }
    result.push_str(&format!("#R {}\n", metadata.rule.unwrap_or_default()));

    let mut tree = QuadTree::new();
    let Some(root) = tree.build(cell_state.alive_cells(), LEAF_LEVEL + 1) else {
        return result;
    };
    if (root.x, root.y) != (0, 0) {
        result.push_str(&format!("#P {} {}\n", root.x, root.y));
    }
    inner(&tree, root.idx, &mut HashMap::new(), &mut result);
    result
}

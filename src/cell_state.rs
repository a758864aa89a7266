use crate::{format, ParseError};
use ahash::AHashSet as HashSet;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Position of a single cell on the unbounded plane.
///
/// `x` grows to the right and `y` grows downwards, matching the row/column
/// order of every supported text format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellCoordinate {
    pub x: i64,
    pub y: i64,
}

impl CellCoordinate {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Key that orders cells row by row, the order used by all serializers.
    pub(crate) fn row_major(&self) -> (i64, i64) {
        (self.y, self.x)
    }
}

impl From<(i64, i64)> for CellCoordinate {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

/// Minimal axis-aligned rectangle containing a non-empty set of cells.
/// Both corners are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub min: CellCoordinate,
    pub max: CellCoordinate,
}

impl BoundingBox {
    /// Number of columns covered by the box, up to 2^64 for the whole `i64` range.
    pub fn width(&self) -> u128 {
        self.max.x.abs_diff(self.min.x) as u128 + 1
    }

    /// Number of rows covered by the box.
    pub fn height(&self) -> u128 {
        self.max.y.abs_diff(self.min.y) as u128 + 1
    }

    fn including(self, c: CellCoordinate) -> Self {
        Self {
            min: CellCoordinate::new(self.min.x.min(c.x), self.min.y.min(c.y)),
            max: CellCoordinate::new(self.max.x.max(c.x), self.max.y.max(c.y)),
        }
    }
}

/// Sparse set of live-cell coordinates. Absence means dead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoordinateSet {
    cells: HashSet<CellCoordinate>,
}

impl CoordinateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `true` if the coordinate was not present before.
    pub fn insert(&mut self, coordinate: CellCoordinate) -> bool {
        self.cells.insert(coordinate)
    }

    pub fn remove(&mut self, coordinate: &CellCoordinate) -> bool {
        self.cells.remove(coordinate)
    }

    pub fn contains(&self, coordinate: &CellCoordinate) -> bool {
        self.cells.contains(coordinate)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over the coordinates in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &CellCoordinate> + '_ {
        self.cells.iter()
    }

    /// Coordinates ordered row by row, then column by column.
    pub fn sorted(&self) -> Vec<CellCoordinate> {
        let mut cells: Vec<_> = self.cells.iter().copied().collect();
        cells.sort_unstable_by_key(CellCoordinate::row_major);
        cells
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut iter = self.cells.iter();
        let first = *iter.next()?;
        Some(iter.fold(
            BoundingBox {
                min: first,
                max: first,
            },
            |bbox, &c| bbox.including(c),
        ))
    }
}

impl FromIterator<CellCoordinate> for CoordinateSet {
    fn from_iter<T: IntoIterator<Item = CellCoordinate>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<CellCoordinate> for CoordinateSet {
    fn extend<T: IntoIterator<Item = CellCoordinate>>(&mut self, iter: T) {
        self.cells.extend(iter)
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a CellCoordinate;
    type IntoIter = std::collections::hash_set::Iter<'a, CellCoordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Immutable snapshot of the live cells on the plane.
///
/// Cloning is cheap: the coordinate set is shared behind an [`Arc`], so a
/// `CellState` can be handed to any number of concurrent readers. Every edit or
/// simulation step produces a new value instead of mutating a shared one.
#[derive(Clone, Default)]
pub struct CellState {
    cells: Arc<CoordinateSet>,
    bounding_box: Option<BoundingBox>,
}

impl CellState {
    pub fn new(cells: CoordinateSet) -> Self {
        let bounding_box = cells.bounding_box();
        Self {
            cells: Arc::new(cells),
            bounding_box,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn alive_cells(&self) -> &CoordinateSet {
        &self.cells
    }

    pub fn is_alive(&self, coordinate: CellCoordinate) -> bool {
        self.cells.contains(&coordinate)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn population(&self) -> usize {
        self.cells.len()
    }

    /// `None` for a state without alive cells.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Returns a copy of the state with a single cell set to `alive`.
    pub fn with_cell(&self, coordinate: CellCoordinate, alive: bool) -> Self {
        if self.is_alive(coordinate) == alive {
            return self.clone();
        }
        let mut cells = CoordinateSet::clone(&self.cells);
        if alive {
            cells.insert(coordinate);
        } else {
            cells.remove(&coordinate);
        }
        Self::new(cells)
    }

    /// Returns the same shape shifted by `(dx, dy)`, or `None` if a cell would
    /// leave the representable range.
    pub fn translated(&self, dx: i64, dy: i64) -> Option<Self> {
        self.cells
            .iter()
            .map(|c| Some(CellCoordinate::new(c.x.checked_add(dx)?, c.y.checked_add(dy)?)))
            .collect::<Option<CoordinateSet>>()
            .map(Self::new)
    }

    /// Creates a random soup of the given size with its top-left corner at the origin.
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Size of the filled rectangle.
    /// * `density` - Probability of every cell being alive, clamped to `0.0..=1.0`.
    /// * `seed` - Optional seed for the random number generator.
    ///   If None, seeds from the OS.
    pub fn random(width: u32, height: u32, density: f64, seed: Option<u64>) -> Self {
        let mut rng = if let Some(x) = seed {
            rand_chacha::ChaCha8Rng::seed_from_u64(x)
        } else {
            rand_chacha::ChaCha8Rng::from_os_rng()
        };
        let density = density.clamp(0.0, 1.0);
        let mut cells = CoordinateSet::new();
        for y in 0..height {
            for x in 0..width {
                if rng.random_bool(density) {
                    cells.insert(CellCoordinate::new(x as i64, y as i64));
                }
            }
        }
        Self::new(cells)
    }
}

impl PartialEq for CellState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells) || self.cells == other.cells
    }
}

impl Eq for CellState {}

impl FromIterator<CellCoordinate> for CellState {
    fn from_iter<T: IntoIterator<Item = CellCoordinate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<CoordinateSet> for CellState {
    fn from(cells: CoordinateSet) -> Self {
        Self::new(cells)
    }
}

/// Parses Plaintext (`.cells`) content, handy for writing patterns inline.
impl FromStr for CellState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        format::plaintext::parse(s).map(|(cell_state, _)| cell_state)
    }
}

impl fmt::Debug for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.cells.sorted()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const SEED: u64 = 42;

    fn cells(coords: &[(i64, i64)]) -> CellState {
        coords.iter().map(|&c| CellCoordinate::from(c)).collect()
    }

    #[test]
    fn test_bounding_box() {
        let state = cells(&[(3, -1), (-2, 4), (0, 0)]);
        let bbox = state.bounding_box().unwrap();
        assert_eq!(bbox.min, CellCoordinate::new(-2, -1));
        assert_eq!(bbox.max, CellCoordinate::new(3, 4));
        assert_eq!(bbox.width(), 6);
        assert_eq!(bbox.height(), 6);
        assert_eq!(CellState::empty().bounding_box(), None);
    }

    #[test]
    fn test_bounding_box_of_whole_plane() {
        let state = cells(&[(i64::MIN, 0), (i64::MAX, i64::MAX)]);
        let bbox = state.bounding_box().unwrap();
        assert_eq!(bbox.width(), 1 << 64);
        assert_eq!(bbox.height(), (1 << 63) + 1);
    }

    #[test]
    fn test_duplicates_are_idempotent() {
        let state = cells(&[(1, 1), (1, 1), (2, 1)]);
        assert_eq!(state.population(), 2);
    }

    #[test]
    fn test_with_cell_returns_new_value() {
        let original = cells(&[(0, 0)]);
        let edited = original.with_cell(CellCoordinate::new(1, 0), true);
        assert_eq!(original.population(), 1);
        assert_eq!(edited.population(), 2);
        assert_eq!(edited.with_cell(CellCoordinate::new(1, 0), false), original);
    }

    #[test]
    fn test_translated() {
        let state = cells(&[(0, 0), (1, 2)]);
        assert_eq!(state.translated(-5, 7), Some(cells(&[(-5, 7), (-4, 9)])));
        assert_eq!(state.translated(i64::MAX, 0), None);
    }

    #[test]
    fn test_random_is_deterministic_with_seed() {
        let a = CellState::random(16, 16, 0.5, Some(SEED));
        let b = CellState::random(16, 16, 0.5, Some(SEED));
        assert_eq!(a, b);
        assert!(a.population() > 0 && a.population() < 256);
        assert!(CellState::random(16, 16, 0.0, Some(SEED)).is_empty());
    }
}

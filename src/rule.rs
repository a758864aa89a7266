use crate::{InvalidArgument, ParseError};
use std::fmt;
use std::str::FromStr;

/// Outer-totalistic Life-like rule: which live-neighbor counts give birth to a
/// dead cell and which keep a live cell alive.
///
/// Counts are stored as bitmasks over `0..=8`, so a `Rule` is `Copy` and cheap
/// to compare. The only way to build one is through [`Rule::new`] or parsing,
/// which means simulators can trust every count to be in range.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    birth: u16,
    survival: u16,
}

impl Rule {
    /// Conway's Game of Life, `B3/S23`.
    pub const CONWAY: Rule = Rule {
        birth: 1 << 3,
        survival: (1 << 2) | (1 << 3),
    };

    pub fn new(birth: &[u8], survival: &[u8]) -> Result<Self, InvalidArgument> {
        Ok(Self {
            birth: Self::mask(birth)?,
            survival: Self::mask(survival)?,
        })
    }

    fn mask(counts: &[u8]) -> Result<u16, InvalidArgument> {
        counts.iter().try_fold(0u16, |mask, &n| {
            if n > 8 {
                Err(InvalidArgument::NeighborCountOutOfRange(n))
            } else {
                Ok(mask | 1 << n)
            }
        })
    }

    pub fn is_birth(&self, neighbors: u8) -> bool {
        neighbors <= 8 && self.birth >> neighbors & 1 != 0
    }

    pub fn is_survival(&self, neighbors: u8) -> bool {
        neighbors <= 8 && self.survival >> neighbors & 1 != 0
    }

    /// Whether a cell with `neighbors` live neighbors is alive in the next generation.
    ///
    /// A dead cell without live neighbors always stays dead, even under `B0`
    /// rules: on the unbounded plane the alternative would fill infinitely many
    /// cells in a single generation.
    pub fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        if alive {
            self.is_survival(neighbors)
        } else {
            neighbors != 0 && self.is_birth(neighbors)
        }
    }

    /// Birth counts in increasing order.
    pub fn birth(&self) -> Vec<u8> {
        (0..=8).filter(|&n| self.is_birth(n)).collect()
    }

    /// Survival counts in increasing order.
    pub fn survival(&self) -> Vec<u8> {
        (0..=8).filter(|&n| self.is_survival(n)).collect()
    }

    /// Birth mask with the zero-neighbor case removed, see [`Rule::next_state`].
    pub(crate) fn effective_birth_mask(&self) -> u16 {
        self.birth & !1
    }

    pub(crate) fn survival_mask(&self) -> u16 {
        self.survival
    }

    /// Parses a rule as declared by a file header: `B3/S23`, or the legacy `23/3`
    /// when no `B` is present.
    pub(crate) fn parse_declared(s: &str) -> Result<Self, ParseError> {
        if s.contains(['B', 'b']) {
            s.parse()
        } else {
            Self::from_survival_birth(s.trim())
        }
    }

    /// Parses the legacy `S/B` notation (`23/3`) still found in Life 1.05 files.
    pub(crate) fn from_survival_birth(s: &str) -> Result<Self, ParseError> {
        let (survival, birth) = s
            .split_once('/')
            .ok_or_else(|| ParseError::malformed(format!("Invalid rule '{}'", s)))?;
        Ok(Self {
            birth: parse_counts(birth, s)?,
            survival: parse_counts(survival, s)?,
        })
    }
}

/// Parses a run of strictly increasing digits from `0..=8` into a bitmask.
fn parse_counts(digits: &str, rule: &str) -> Result<u16, ParseError> {
    let mut mask = 0u16;
    let mut last = None;
    for c in digits.chars() {
        let n = c
            .to_digit(10)
            .filter(|&n| n <= 8)
            .ok_or_else(|| {
                ParseError::malformed(format!("Invalid neighbor count '{}' in rule '{}'", c, rule))
            })? as u8;
        if last.is_some_and(|last| n <= last) {
            return Err(ParseError::malformed(format!(
                "Neighbor counts in rule '{}' must be strictly increasing",
                rule
            )));
        }
        last = Some(n);
        mask |= 1 << n;
    }
    Ok(mask)
}

impl Default for Rule {
    fn default() -> Self {
        Self::CONWAY
    }
}

/// Parses `B<digits>/S<digits>`. The letters may be lowercase, as Golly writes them.
impl FromStr for Rule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let malformed = || ParseError::malformed(format!("Invalid rule '{}'", s));
        let (birth, survival) = s.split_once('/').ok_or_else(malformed)?;
        let birth = birth
            .strip_prefix(['B', 'b'])
            .ok_or_else(malformed)?;
        let survival = survival
            .strip_prefix(['S', 's'])
            .ok_or_else(malformed)?;
        Ok(Self {
            birth: parse_counts(birth, s)?,
            survival: parse_counts(survival, s)?,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B")?;
        for n in self.birth() {
            write!(f, "{}", n)?;
        }
        write!(f, "/S")?;
        for n in self.survival() {
            write!(f, "{}", n)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({})", self)
    }
}

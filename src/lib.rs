#![warn(clippy::all)]

mod cell_state;
mod error;
pub mod format;
pub mod hashlife;
mod naive;
mod quadtree;
mod rule;
mod traits;

pub use cell_state::{BoundingBox, CellCoordinate, CellState, CoordinateSet};
pub use error::{InvalidArgument, ParseError, StepError};
pub use format::{
    CellStateFormat, CellStateMetadata, FixedFormat, ParsedCellState,
};
pub use hashlife::HashLifeAlgorithm;
pub use naive::NaiveAlgorithm;
pub use rule::Rule;
pub use traits::{
    evolve, Algorithm, AlgorithmKind, CancelToken, Evolution, GameOfLifeAlgorithm, Statistics,
};

pub type DefaultAlgorithm = HashLifeAlgorithm;

pub const VERSION: &str = "0.1.0";

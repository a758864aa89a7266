/// Failure to turn raw text or bytes into a [`CellState`](crate::CellState).
///
/// Parsing is deterministic, so neither variant is worth retrying with the same input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No parser recognizes the magic line, header, or overall shape of the content.
    #[error("Unrecognized cell state format")]
    UnrecognizedFormat,

    /// The format was recognized, but its body is structurally invalid.
    #[error("Malformed content: {0}")]
    MalformedContent(String),
}

impl ParseError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedContent(reason.into())
    }
}

/// Contract violation detected while constructing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("Neighbor count {0} is outside of 0..=8")]
    NeighborCountOutOfRange(u8),
}

/// Failure of a simulation step. The input state is never partially updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Simulation was cancelled")]
    Cancelled,

    #[error("Pattern grew beyond the representable coordinate range")]
    CoordinateOverflow,
}

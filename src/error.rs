use thiserror::Error;

/// Rejected hand-built shape matrices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape has no rows")]
    Empty,
    #[error("shape row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("shape has no filled cells")]
    NoFilledCells,
    #[error("shape's first row and first column must each hold a filled cell")]
    NotTrimmed,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

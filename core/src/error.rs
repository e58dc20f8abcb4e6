use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board must hold an even number of cells")]
    OddCellCount,
    #[error("Board shape is not a square grid")]
    InvalidBoardShape,
    #[error("Board values do not pair up exactly twice each")]
    UnpairedValues,
    #[error("Invalid coordinates")]
    InvalidCoords,
}

pub type Result<T> = core::result::Result<T, GameError>;

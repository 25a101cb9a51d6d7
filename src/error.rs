use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board dimensions {rows}x{cols} are outside the supported range")]
    InvalidDimensions { rows: u32, cols: u32 },
    #[error("Mine count {mines} is invalid for a {rows}x{cols} board")]
    InvalidMineCount { rows: u32, cols: u32, mines: u32 },
    #[error("Unknown difficulty '{0}'")]
    UnknownDifficulty(String),
}

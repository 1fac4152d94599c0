//! Puzzle Program Errors

use thiserror::Error;

use crate::state::GridCoord;

/// Malformed level geometry, rejected when a [`Board`](crate::Board) is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board dimensions must be positive (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Board dimensions exceed {max} (got {width}x{height})")]
    DimensionTooLarge { width: u32, height: u32, max: u32 },

    #[error("Start cell {0} is outside the board")]
    StartOutOfBounds(GridCoord),

    #[error("Road cell {0} is outside the board")]
    RoadOutOfBounds(GridCoord),

    #[error("Target cell {0} is outside the board")]
    TargetOutOfBounds(GridCoord),

    #[error("Target cell {0} is listed more than once")]
    DuplicateTarget(GridCoord),
}

/// Malformed instruction tree, rejected before any movement happens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("Program has no instructions")]
    Empty,

    #[error("Repeat count must be positive (got {count} at depth {depth})")]
    InvalidRepeatCount { count: u32, depth: usize },

    #[error("Program expands to more than {limit} actions")]
    TooManyActions { limit: usize },

    #[error("Repeat nesting depth {depth} exceeds the allowed {allowed}")]
    RepeatTooDeep { depth: usize, allowed: usize },
}

/// Construction-time failures surfaced to the caller; a run never starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Invalid board: {0}")]
    InvalidBoard(#[from] BoardError),

    #[error("Invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),
}

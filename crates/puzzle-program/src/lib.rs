//! Puzzle Program - grid puzzle execution engine
//!
//! Takes a player-authored instruction program (moves, collects and nested
//! repeat groups) and simulates an avatar walking it across a level board.
//!
//! Pieces:
//! - Board: static level geometry (start, roads, targets; everything else blocks)
//! - Program: the instruction tree and its flat expansion
//! - Simulator: step-by-step execution producing a trace and a terminal status

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

pub use error::{BoardError, ProgramError, PuzzleError};
pub use instruction::{Action, Instruction, Program};
pub use processor::{RunOutcome, RunStatus, SimulationState, Simulator, Step};
pub use state::{Board, Direction, Facing, GridCoord};

/// Constants
pub mod constants {
    /// Upper bound on a program's expanded length
    pub const MAX_FLAT_ACTIONS: usize = 10_000;

    /// Stars awarded for clearing a level
    pub const WIN_STARS: u8 = 3;
}

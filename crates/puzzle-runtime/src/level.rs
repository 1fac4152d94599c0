//! Level payloads
//!
//! Levels arrive as JSON with cells addressed by a 1-based linear index,
//! row-major from the bottom-left corner. This module decodes them into a
//! validated [`Board`].

use puzzle_program::{Board, BoardError, GridCoord};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, path::Path};
use thiserror::Error;

use crate::{DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};

/// Errors while decoding a level payload
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("Cell index must be 1-based (got 0)")]
    ZeroIndex,

    #[error("Cell index {index} does not fit a board of width {width}")]
    IndexOutOfRange { index: u32, width: u32 },

    #[error("Cell index {0} is marked both passable and rock")]
    ConflictingCell(u32),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("Failed to parse level data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read level file: {0}")]
    Io(#[from] std::io::Error),
}

/// Game mode a level belongs to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Basic,
    Sequence,
    Loop,
    Function,
    Condition,
}

impl GameMode {
    pub const ALL: [GameMode; 5] = [
        GameMode::Basic,
        GameMode::Sequence,
        GameMode::Loop,
        GameMode::Function,
        GameMode::Condition,
    ];

    /// Stable numeric id, used in storage keys
    pub fn id(self) -> u8 {
        match self {
            GameMode::Basic => 0,
            GameMode::Sequence => 1,
            GameMode::Loop => 2,
            GameMode::Function => 3,
            GameMode::Condition => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }

    /// How deep repeat blocks may nest when authoring in this mode
    ///
    /// Loop blocks cannot be dropped inside other loop blocks.
    pub fn max_repeat_depth(self) -> usize {
        match self {
            GameMode::Loop | GameMode::Condition => 1,
            GameMode::Basic | GameMode::Sequence | GameMode::Function => 0,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Basic => "basic",
            GameMode::Sequence => "sequence",
            GameMode::Loop => "loop",
            GameMode::Function => "function",
            GameMode::Condition => "condition",
        };
        f.write_str(name)
    }
}

/// Identifies a level: mode plus 0-based position in that mode
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelKey {
    pub mode: GameMode,
    pub index: u32,
}

impl LevelKey {
    pub fn new(mode: GameMode, index: u32) -> Self {
        Self { mode, index }
    }

    /// Storage key: mode id then big-endian index, so keys sort by level
    pub fn to_key_bytes(&self) -> [u8; 5] {
        let mut key = [0u8; 5];
        key[0] = self.mode.id();
        key[1..].copy_from_slice(&self.index.to_be_bytes());
        key
    }

    pub fn from_key_bytes(bytes: &[u8]) -> Option<Self> {
        let (&mode, index) = bytes.split_first()?;
        let index: [u8; 4] = index.try_into().ok()?;
        Some(Self {
            mode: GameMode::from_id(mode)?,
            index: u32::from_be_bytes(index),
        })
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.mode, self.index)
    }
}

/// What a listed cell holds
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Walkable road
    Board,
    /// Target to collect (also walkable)
    Target,
    /// Explicit obstacle
    Rock,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelCell {
    pub index: u32,
    pub kind: CellKind,
}

fn default_width() -> u32 {
    DEFAULT_BOARD_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_BOARD_HEIGHT
}

/// One level as delivered by the level service
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LevelPayload {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Linear index of the start cell
    pub start: u32,
    #[serde(default)]
    pub cells: Vec<LevelCell>,
}

impl LevelPayload {
    /// Decode cells and build a validated board
    pub fn to_board(&self) -> Result<Board, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(BoardError::ZeroDimension {
                width: self.width,
                height: self.height,
            }
            .into());
        }

        let start = decode_index(self.start, self.width)?;
        let mut roads = Vec::new();
        let mut targets = Vec::new();
        let mut passable = HashSet::new();
        let mut rocks = HashSet::new();

        for cell in &self.cells {
            let coord = decode_index(cell.index, self.width)?;
            match cell.kind {
                CellKind::Board => roads.push(coord),
                CellKind::Target => targets.push(coord),
                CellKind::Rock => {
                    rocks.insert(cell.index);
                    continue;
                }
            }
            passable.insert(cell.index);
        }

        if let Some(index) = passable.intersection(&rocks).min() {
            return Err(LevelError::ConflictingCell(*index));
        }
        if rocks.contains(&self.start) {
            return Err(LevelError::ConflictingCell(self.start));
        }

        Ok(Board::new(self.width, self.height, start, roads, targets)?)
    }
}

/// All levels of one mode, in play order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LevelPack {
    pub mode: GameMode,
    pub levels: Vec<LevelPayload>,
}

impl LevelPack {
    pub fn from_json(data: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}

/// 1-based linear index to (col, row): col = (idx-1) % width + 1, row = (idx-1) / width + 1
pub fn decode_index(index: u32, width: u32) -> Result<GridCoord, LevelError> {
    if index == 0 {
        return Err(LevelError::ZeroIndex);
    }
    if width == 0 {
        return Err(LevelError::IndexOutOfRange { index, width });
    }

    let zero_based = index - 1;
    let col = i32::try_from(zero_based % width + 1)
        .map_err(|_| LevelError::IndexOutOfRange { index, width })?;
    let row = i32::try_from(zero_based / width + 1)
        .map_err(|_| LevelError::IndexOutOfRange { index, width })?;

    Ok(GridCoord::new(col, row))
}

/// Inverse of [`decode_index`]
pub fn encode_index(coord: GridCoord, width: u32) -> Option<u32> {
    if coord.col < 1 || coord.row < 1 || coord.col as u32 > width {
        return None;
    }
    (coord.row as u32 - 1)
        .checked_mul(width)?
        .checked_add(coord.col as u32)
}

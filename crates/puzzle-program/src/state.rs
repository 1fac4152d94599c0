//! Puzzle Program State
//!
//! Static board geometry for a single level.
//! Coordinates are 1-indexed, rows grow upward.

use std::collections::{HashMap, HashSet};
use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// A cell on the board as (column, row)
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
pub struct GridCoord {
    pub col: i32,
    pub row: i32,
}

impl GridCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Neighbouring cell one step in `direction`
    pub fn offset(self, direction: Direction) -> Self {
        let (dc, dr) = direction.unit_vector();
        Self {
            col: self.col.saturating_add(dc),
            row: self.row.saturating_add(dr),
        }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Movement direction of a single move instruction
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// (column delta, row delta)
    pub fn unit_vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Which way the avatar sprite looks
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Facing after moving from `from` to `to`; vertical moves keep `current`
    pub fn after_move(current: Facing, from: GridCoord, to: GridCoord) -> Facing {
        match to.col.cmp(&from.col) {
            std::cmp::Ordering::Less => Facing::Left,
            std::cmp::Ordering::Greater => Facing::Right,
            std::cmp::Ordering::Equal => current,
        }
    }
}

/// Rectangular level grid
///
/// Immutable once built. Any in-bounds cell that is not the start, a road or a
/// target is an obstacle.
#[derive(Clone, Debug)]
pub struct Board {
    width: u32,
    height: u32,
    start: GridCoord,
    roads: HashSet<GridCoord>,
    targets: Vec<GridCoord>,
    target_lookup: HashMap<GridCoord, usize>,
}

impl Board {
    /// Build and validate a board
    pub fn new(
        width: u32,
        height: u32,
        start: GridCoord,
        roads: impl IntoIterator<Item = GridCoord>,
        targets: impl IntoIterator<Item = GridCoord>,
    ) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::ZeroDimension { width, height });
        }
        let max = i32::MAX as u32;
        if width > max || height > max {
            return Err(BoardError::DimensionTooLarge { width, height, max });
        }

        let mut board = Self {
            width,
            height,
            start,
            roads: HashSet::new(),
            targets: Vec::new(),
            target_lookup: HashMap::new(),
        };

        if !board.is_in_bounds(start) {
            return Err(BoardError::StartOutOfBounds(start));
        }

        for road in roads {
            if !board.is_in_bounds(road) {
                return Err(BoardError::RoadOutOfBounds(road));
            }
            board.roads.insert(road);
        }

        for target in targets {
            if !board.is_in_bounds(target) {
                return Err(BoardError::TargetOutOfBounds(target));
            }
            if board.target_lookup.contains_key(&target) {
                return Err(BoardError::DuplicateTarget(target));
            }
            board.target_lookup.insert(target, board.targets.len());
            board.targets.push(target);
        }

        Ok(board)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn start(&self) -> GridCoord {
        self.start
    }

    /// Targets in level order
    pub fn targets(&self) -> &[GridCoord] {
        &self.targets
    }

    pub fn roads(&self) -> &HashSet<GridCoord> {
        &self.roads
    }

    /// True iff 1 <= col <= width and 1 <= row <= height
    pub fn is_in_bounds(&self, coord: GridCoord) -> bool {
        coord.col >= 1
            && coord.row >= 1
            && coord.col as i64 <= self.width as i64
            && coord.row as i64 <= self.height as i64
    }

    /// True iff the cell is in bounds and is the start, a road or a target
    pub fn is_passable(&self, coord: GridCoord) -> bool {
        self.is_in_bounds(coord)
            && (coord == self.start
                || self.roads.contains(&coord)
                || self.target_lookup.contains_key(&coord))
    }

    pub fn is_target(&self, coord: GridCoord) -> bool {
        self.target_lookup.contains_key(&coord)
    }

    /// Position of `coord` in [`Board::targets`]
    pub fn target_index(&self, coord: GridCoord) -> Option<usize> {
        self.target_lookup.get(&coord).copied()
    }

    /// Facing the avatar takes on reset: toward the first target's column
    pub fn facing_hint(&self) -> Facing {
        match self.targets.first() {
            Some(first) if first.col < self.start.col => Facing::Left,
            _ => Facing::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Board {
        // 3x2, start (1,1), road (2,1), target (3,1); row 2 is all obstacles
        Board::new(
            3,
            2,
            GridCoord::new(1, 1),
            [GridCoord::new(2, 1)],
            [GridCoord::new(3, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_bounds() {
        let board = corridor();
        assert!(board.is_in_bounds(GridCoord::new(1, 1)));
        assert!(board.is_in_bounds(GridCoord::new(3, 2)));
        assert!(!board.is_in_bounds(GridCoord::new(0, 1)));
        assert!(!board.is_in_bounds(GridCoord::new(1, 0)));
        assert!(!board.is_in_bounds(GridCoord::new(4, 1)));
        assert!(!board.is_in_bounds(GridCoord::new(1, 3)));
    }

    #[test]
    fn test_passable_cells() {
        let board = corridor();
        assert!(board.is_passable(GridCoord::new(1, 1)));
        assert!(board.is_passable(GridCoord::new(2, 1)));
        assert!(board.is_passable(GridCoord::new(3, 1)));
        // In bounds but never declared, so an obstacle
        assert!(!board.is_passable(GridCoord::new(2, 2)));
        assert!(!board.is_passable(GridCoord::new(4, 1)));
    }

    #[test]
    fn test_target_lookup() {
        let board = corridor();
        assert!(board.is_target(GridCoord::new(3, 1)));
        assert_eq!(board.target_index(GridCoord::new(3, 1)), Some(0));
        assert_eq!(board.target_index(GridCoord::new(2, 1)), None);
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let err = Board::new(0, 4, GridCoord::new(1, 1), [], []).unwrap_err();
        assert_eq!(err, BoardError::ZeroDimension { width: 0, height: 4 });
    }

    #[test]
    fn test_rejects_oversized_dimension() {
        let err = Board::new(u32::MAX, 4, GridCoord::new(1, 1), [], []).unwrap_err();
        assert_eq!(
            err,
            BoardError::DimensionTooLarge {
                width: u32::MAX,
                height: 4,
                max: i32::MAX as u32
            }
        );
        assert!(Board::new(i32::MAX as u32, 1, GridCoord::new(1, 1), [], []).is_ok());
    }

    #[test]
    fn test_rejects_out_of_bounds_cells() {
        let err = Board::new(2, 2, GridCoord::new(3, 1), [], []).unwrap_err();
        assert_eq!(err, BoardError::StartOutOfBounds(GridCoord::new(3, 1)));

        let err = Board::new(2, 2, GridCoord::new(1, 1), [GridCoord::new(0, 2)], []).unwrap_err();
        assert_eq!(err, BoardError::RoadOutOfBounds(GridCoord::new(0, 2)));

        let err = Board::new(2, 2, GridCoord::new(1, 1), [], [GridCoord::new(2, 3)]).unwrap_err();
        assert_eq!(err, BoardError::TargetOutOfBounds(GridCoord::new(2, 3)));
    }

    #[test]
    fn test_rejects_duplicate_target() {
        let err = Board::new(
            2,
            2,
            GridCoord::new(1, 1),
            [],
            [GridCoord::new(2, 2), GridCoord::new(2, 2)],
        )
        .unwrap_err();
        assert_eq!(err, BoardError::DuplicateTarget(GridCoord::new(2, 2)));
    }

    #[test]
    fn test_offset_and_facing() {
        let origin = GridCoord::new(2, 2);
        assert_eq!(origin.offset(Direction::Up), GridCoord::new(2, 3));
        assert_eq!(origin.offset(Direction::Down), GridCoord::new(2, 1));
        assert_eq!(origin.offset(Direction::Left), GridCoord::new(1, 2));
        assert_eq!(origin.offset(Direction::Right), GridCoord::new(3, 2));

        assert_eq!(corridor().facing_hint(), Facing::Right);
        let leftward = Board::new(3, 1, GridCoord::new(3, 1), [], [GridCoord::new(1, 1)]).unwrap();
        assert_eq!(leftward.facing_hint(), Facing::Left);

        assert_eq!(
            Facing::after_move(Facing::Right, origin, GridCoord::new(1, 2)),
            Facing::Left
        );
        assert_eq!(
            Facing::after_move(Facing::Left, origin, GridCoord::new(2, 3)),
            Facing::Left
        );
    }
}

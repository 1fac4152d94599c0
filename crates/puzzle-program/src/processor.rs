//! Puzzle Program Processor
//!
//! Walks a flat action list against a [`Board`], one action at a time,
//! recording a step trace and a terminal status.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    error::ProgramError,
    instruction::{Action, Program},
    state::{Board, GridCoord},
};

/// Outcome of executing one atomic action
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Avatar moved to a passable cell
    Moved { from: GridCoord, to: GridCoord },
    /// Move hit an obstacle or the board edge; the run fails here
    Blocked { from: GridCoord, to: GridCoord },
    /// A target was picked up
    Collected { at: GridCoord },
    /// Collect on an empty or already collected cell
    CollectedNothing { at: GridCoord },
}

/// Run status
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Win,
    Fail,
    Incomplete,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Per-run mutable state. Dropping it at any point abandons the run.
#[derive(Clone, Debug)]
pub struct SimulationState {
    cursor: GridCoord,
    collected: Vec<bool>,
    trace: Vec<Step>,
    status: RunStatus,
}

impl SimulationState {
    fn new(board: &Board) -> Self {
        Self {
            cursor: board.start(),
            collected: vec![false; board.targets().len()],
            trace: Vec::new(),
            status: RunStatus::Running,
        }
    }

    /// Back to the start cell with nothing collected and an empty trace
    pub fn reset(&mut self, board: &Board) {
        *self = Self::new(board);
    }

    pub fn cursor(&self) -> GridCoord {
        self.cursor
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn trace(&self) -> &[Step] {
        &self.trace
    }

    /// Collected flag per target, in [`Board::targets`] order
    pub fn collected(&self) -> &[bool] {
        &self.collected
    }

    pub fn collected_count(&self) -> usize {
        self.collected.iter().filter(|c| **c).count()
    }

    pub fn all_collected(&self) -> bool {
        self.collected.iter().all(|c| *c)
    }

    fn into_outcome(self) -> RunOutcome {
        RunOutcome {
            status: self.status,
            final_position: self.cursor,
            collected: self.collected_count(),
            trace: self.trace,
        }
    }
}

/// Result of a finished run
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub final_position: GridCoord,
    /// Number of targets collected
    pub collected: usize,
    pub trace: Vec<Step>,
}

impl RunOutcome {
    pub fn is_win(&self) -> bool {
        self.status == RunStatus::Win
    }

    /// Canonical byte encoding (used for trace digests)
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("RunOutcome serialization should not fail")
    }
}

/// Deterministic executor bound to one board
///
/// Holds the board by reference only, so any number of runs can share it.
#[derive(Clone, Copy, Debug)]
pub struct Simulator<'a> {
    board: &'a Board,
}

impl<'a> Simulator<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    /// Fresh state at the board's start cell
    pub fn start(&self) -> SimulationState {
        SimulationState::new(self.board)
    }

    /// Expand and execute a whole program
    pub fn run(&self, program: &Program) -> Result<RunOutcome, ProgramError> {
        let actions = program.expand()?;
        Ok(self.run_actions(&actions))
    }

    /// Execute an already flat action list until a terminal status
    pub fn run_actions(&self, actions: &[Action]) -> RunOutcome {
        let mut state = self.start();

        for action in actions {
            self.apply(&mut state, *action);
            if state.status.is_terminal() {
                break;
            }
        }

        self.finish(&mut state);
        state.into_outcome()
    }

    /// Apply a single action and return the step it produced
    ///
    /// Calling this on a state that is already terminal does nothing and
    /// returns `None`.
    pub fn apply(&self, state: &mut SimulationState, action: Action) -> Option<Step> {
        if state.status.is_terminal() {
            return None;
        }

        let step = match action {
            Action::Move(direction) => {
                let from = state.cursor;
                let to = from.offset(direction);

                if !self.board.is_in_bounds(to) || !self.board.is_passable(to) {
                    state.status = RunStatus::Fail;
                    tracing::debug!("Blocked moving {:?} from {} to {}", direction, from, to);
                    Step::Blocked { from, to }
                } else {
                    state.cursor = to;
                    Step::Moved { from, to }
                }
            }
            Action::Collect => {
                let at = state.cursor;
                // A state started on another board may have fewer slots
                let slot = self
                    .board
                    .target_index(at)
                    .and_then(|index| state.collected.get_mut(index));
                match slot {
                    Some(done) if !*done => {
                        *done = true;
                        Step::Collected { at }
                    }
                    _ => Step::CollectedNothing { at },
                }
            }
        };

        state.trace.push(step);

        // Zero-target boards only win once the whole program has run
        if state.status == RunStatus::Running
            && !state.collected.is_empty()
            && state.all_collected()
        {
            state.status = RunStatus::Win;
            tracing::debug!("All {} targets collected after {} steps", state.collected.len(), state.trace.len());
        }

        Some(step)
    }

    /// Settle a state whose action list has run out
    pub fn finish(&self, state: &mut SimulationState) {
        if state.status != RunStatus::Running {
            return;
        }

        state.status = if state.all_collected() {
            RunStatus::Win
        } else {
            RunStatus::Incomplete
        };

        tracing::debug!(
            "Program exhausted: {:?} ({}/{} targets)",
            state.status,
            state.collected_count(),
            state.collected.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use crate::state::Direction::{self, *};

    fn mv(direction: Direction) -> Instruction {
        Instruction::Move(direction)
    }

    fn c(col: i32, row: i32) -> GridCoord {
        GridCoord::new(col, row)
    }

    /// 4x3 board:
    ///
    /// row 3: .  .  .  .
    /// row 2: R  T2 .  .
    /// row 1: S  R  T1 .
    fn two_target_board() -> Board {
        Board::new(4, 3, c(1, 1), [c(2, 1), c(1, 2)], [c(3, 1), c(2, 2)]).unwrap()
    }

    #[test]
    fn test_bounds_failure_on_single_cell_board() {
        let board = Board::new(1, 1, c(1, 1), [], []).unwrap();
        let outcome = Simulator::new(&board)
            .run(&Program::new(vec![mv(Up)]))
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Fail);
        assert_eq!(outcome.trace, vec![Step::Blocked { from: c(1, 1), to: c(1, 2) }]);
        assert_eq!(outcome.final_position, c(1, 1));
    }

    #[test]
    fn test_obstacle_blocks_and_stops() {
        let board = two_target_board();
        // (2,1) -> up is (2,2) target, right from (1,1) is road; (3,2) is an obstacle
        let program = Program::new(vec![mv(Right), mv(Right), mv(Up), Instruction::Collect]);
        let outcome = Simulator::new(&board).run(&program).unwrap();

        assert_eq!(outcome.status, RunStatus::Fail);
        assert_eq!(
            outcome.trace,
            vec![
                Step::Moved { from: c(1, 1), to: c(2, 1) },
                Step::Moved { from: c(2, 1), to: c(3, 1) },
                Step::Blocked { from: c(3, 1), to: c(3, 2) },
            ]
        );
    }

    #[test]
    fn test_collect_is_idempotent() {
        let board = Board::new(2, 1, c(1, 1), [], [c(2, 1), c(1, 1)]).unwrap();
        let simulator = Simulator::new(&board);
        let mut state = simulator.start();

        assert_eq!(
            simulator.apply(&mut state, Action::Collect),
            Some(Step::Collected { at: c(1, 1) })
        );
        assert_eq!(
            simulator.apply(&mut state, Action::Collect),
            Some(Step::CollectedNothing { at: c(1, 1) })
        );
        assert_eq!(state.collected(), &[false, true]);
        assert_eq!(state.status(), RunStatus::Running);
    }

    #[test]
    fn test_collect_on_empty_cell_is_not_a_failure() {
        let board = two_target_board();
        let outcome = Simulator::new(&board)
            .run(&Program::new(vec![Instruction::Collect, mv(Right)]))
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Incomplete);
        assert_eq!(outcome.trace[0], Step::CollectedNothing { at: c(1, 1) });
        assert_eq!(outcome.trace.len(), 2);
    }

    #[test]
    fn test_win_after_collecting_every_target() {
        let board = two_target_board();
        let program = Program::new(vec![
            mv(Right),
            mv(Right),
            Instruction::Collect,
            mv(Left),
            mv(Up),
            Instruction::Collect,
        ]);
        let outcome = Simulator::new(&board).run(&program).unwrap();

        assert_eq!(outcome.status, RunStatus::Win);
        assert_eq!(outcome.collected, 2);
        assert_eq!(outcome.final_position, c(2, 2));
        assert_eq!(outcome.trace.last(), Some(&Step::Collected { at: c(2, 2) }));
    }

    #[test]
    fn test_win_stops_remaining_actions() {
        let board = two_target_board();
        let program = Program::new(vec![
            mv(Right),
            mv(Up),
            Instruction::Collect,
            mv(Down),
            mv(Right),
            Instruction::Collect,
            // Would walk off the board if it ran
            mv(Right),
            mv(Right),
        ]);
        let outcome = Simulator::new(&board).run(&program).unwrap();

        assert_eq!(outcome.status, RunStatus::Win);
        assert_eq!(outcome.trace.len(), 6);
    }

    #[test]
    fn test_partial_collection() {
        let board = two_target_board();

        let incomplete = Program::new(vec![mv(Right), mv(Right), Instruction::Collect]);
        let outcome = Simulator::new(&board).run(&incomplete).unwrap();
        assert_eq!(outcome.status, RunStatus::Incomplete);
        assert_eq!(outcome.collected, 1);

        let fails = Program::new(vec![mv(Right), mv(Right), Instruction::Collect, mv(Down)]);
        let outcome = Simulator::new(&board).run(&fails).unwrap();
        assert_eq!(outcome.status, RunStatus::Fail);
        assert_eq!(outcome.collected, 1);
    }

    #[test]
    fn test_no_targets_wins_when_program_exhausts() {
        let board = Board::new(3, 1, c(1, 1), [c(2, 1), c(3, 1)], []).unwrap();
        let simulator = Simulator::new(&board);

        let outcome = simulator.run(&Program::new(vec![mv(Right), mv(Right)])).unwrap();
        assert_eq!(outcome.status, RunStatus::Win);
        assert_eq!(outcome.trace.len(), 2);

        // Still fails if it leaves the board before running out
        let outcome = simulator
            .run(&Program::new(vec![mv(Right), mv(Right), mv(Right)]))
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Fail);
    }

    #[test]
    fn test_repeat_program_runs() {
        let board = Board::new(5, 1, c(1, 1), [c(2, 1), c(3, 1), c(4, 1)], [c(5, 1)]).unwrap();
        let program = Program::new(vec![
            Instruction::repeat(4, vec![mv(Right)]),
            Instruction::Collect,
        ]);
        let outcome = Simulator::new(&board).run(&program).unwrap();
        assert_eq!(outcome.status, RunStatus::Win);
        assert_eq!(outcome.trace.len(), 5);
    }

    #[test]
    fn test_invalid_program_rejected_before_movement() {
        let board = two_target_board();
        let program = Program::new(vec![mv(Right), Instruction::repeat(0, vec![mv(Up)])]);
        let err = Simulator::new(&board).run(&program).unwrap_err();
        assert_eq!(err, ProgramError::InvalidRepeatCount { count: 0, depth: 1 });
    }

    #[test]
    fn test_runs_are_deterministic() {
        let board = two_target_board();
        let program = Program::new(vec![
            Instruction::repeat(2, vec![mv(Right), Instruction::Collect]),
            mv(Up),
            Instruction::Collect,
        ]);
        let simulator = Simulator::new(&board);

        let first = simulator.run(&program).unwrap();
        let second = simulator.run(&program).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn test_apply_after_terminal_is_ignored() {
        let board = Board::new(1, 1, c(1, 1), [], []).unwrap();
        let simulator = Simulator::new(&board);
        let mut state = simulator.start();

        simulator.apply(&mut state, Action::Move(Left));
        assert_eq!(state.status(), RunStatus::Fail);
        assert_eq!(simulator.apply(&mut state, Action::Collect), None);
        assert_eq!(state.trace().len(), 1);

        state.reset(&board);
        assert_eq!(state.status(), RunStatus::Running);
        assert_eq!(state.cursor(), c(1, 1));
        assert!(state.trace().is_empty());
    }

    #[test]
    fn test_state_from_another_board_does_not_panic() {
        let empty = Board::new(1, 1, c(1, 1), [], []).unwrap();
        let with_target = Board::new(1, 1, c(1, 1), [], [c(1, 1)]).unwrap();

        let mut state = Simulator::new(&empty).start();
        let simulator = Simulator::new(&with_target);

        assert_eq!(
            simulator.apply(&mut state, Action::Collect),
            Some(Step::CollectedNothing { at: c(1, 1) })
        );
        assert_eq!(state.status(), RunStatus::Running);

        // Resetting onto the right board restores the target slots
        state.reset(&with_target);
        assert_eq!(
            simulator.apply(&mut state, Action::Collect),
            Some(Step::Collected { at: c(1, 1) })
        );
        assert_eq!(state.status(), RunStatus::Win);
    }
}

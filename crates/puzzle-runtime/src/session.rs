//! Play session for a single level
//!
//! A session owns the attempt history of one player on one level. Every
//! `play` starts from a fresh simulation state, so a failed run needs no
//! cleanup before the next one.

use puzzle_program::{
    constants::WIN_STARS, Board, Program, ProgramError, PuzzleError, RunOutcome, Simulator,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{level::LevelKey, persistence::ProgressSink};

/// Result of one play attempt
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub level: LevelKey,
    /// 1-based attempt number within the session
    pub attempt: u32,
    pub outcome: RunOutcome,
    /// blake3 of the encoded outcome, hex
    pub digest: String,
}

/// Compute the reproducibility digest of an outcome
pub fn outcome_digest(outcome: &RunOutcome) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&outcome.to_bytes());
    hasher.finalize().to_hex().to_string()
}

/// What gets persisted when a level is cleared
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompletionRecord {
    pub level: LevelKey,
    pub stars: u8,
    /// Attempts it took, including the winning one
    pub attempts: u32,
    /// Session start (unix millis)
    pub started_at_ms: i64,
    /// Winning attempt (unix millis)
    pub finished_at_ms: i64,
    /// The program that won
    pub solution: Program,
}

impl CompletionRecord {
    pub fn elapsed_ms(&self) -> i64 {
        self.finished_at_ms.saturating_sub(self.started_at_ms)
    }
}

/// Attempts of one player on one level
pub struct PlaySession {
    level: LevelKey,
    board: Arc<Board>,
    started_at_ms: i64,
    attempts: u32,
    last_report: Option<RunReport>,
    win: Option<(u32, i64, Program)>,
}

impl PlaySession {
    pub fn new(level: LevelKey, board: Arc<Board>) -> Self {
        Self {
            level,
            board,
            started_at_ms: chrono::Utc::now().timestamp_millis(),
            attempts: 0,
            last_report: None,
            win: None,
        }
    }

    pub fn level(&self) -> LevelKey {
        self.level
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    pub fn is_cleared(&self) -> bool {
        self.win.is_some()
    }

    /// Validate the program against the mode's authoring rules, then run it
    ///
    /// Rejected programs do not count as attempts.
    pub fn play(&mut self, program: &Program) -> Result<RunReport, PuzzleError> {
        let depth = program.repeat_depth();
        let allowed = self.level.mode.max_repeat_depth();
        if depth > allowed {
            return Err(ProgramError::RepeatTooDeep { depth, allowed }.into());
        }

        let outcome = Simulator::new(&self.board).run(program)?;
        self.attempts += 1;

        tracing::info!(
            "Level {} attempt {}: {:?} after {} steps",
            self.level,
            self.attempts,
            outcome.status,
            outcome.trace.len()
        );

        if outcome.is_win() && self.win.is_none() {
            self.win = Some((
                self.attempts,
                chrono::Utc::now().timestamp_millis(),
                program.clone(),
            ));
        }

        let report = RunReport {
            level: self.level,
            attempt: self.attempts,
            digest: outcome_digest(&outcome),
            outcome,
        };
        self.last_report = Some(report.clone());

        Ok(report)
    }

    /// Completion record for the first winning attempt, if any
    pub fn completion(&self) -> Option<CompletionRecord> {
        let (attempts, finished_at_ms, solution) = self.win.as_ref()?;
        Some(CompletionRecord {
            level: self.level,
            stars: WIN_STARS,
            attempts: *attempts,
            started_at_ms: self.started_at_ms,
            finished_at_ms: *finished_at_ms,
            solution: solution.clone(),
        })
    }

    /// Hand the completion to the progress sink; false if not cleared yet
    pub fn report_completion(&self, sink: &dyn ProgressSink) -> anyhow::Result<bool> {
        match self.completion() {
            Some(record) => {
                sink.record_completion(&record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! Puzzle Runtime - host side of the puzzle engine
//!
//! This crate wraps the engine for a running game:
//! - Level payload decoding and an in-memory level catalog
//! - Play sessions with attempt tracking and trace digests
//! - Timed playback of step traces for the renderer
//! - Progress persistence on sled

pub mod level;
pub mod level_store;
pub mod persistence;
pub mod playback;
pub mod session;


pub use level::{GameMode, LevelError, LevelKey, LevelPack, LevelPayload};
pub use level_store::LevelCatalog;
pub use persistence::{ProgressSink, ProgressStore};
pub use playback::{Playback, PlaybackConfig, PlaybackFrame, PlaybackHandle, PlaybackStats};
pub use session::{CompletionRecord, PlaySession, RunReport};

/// Board width when a payload omits it
pub const DEFAULT_BOARD_WIDTH: u32 = 8;

/// Board height when a payload omits it
pub const DEFAULT_BOARD_HEIGHT: u32 = 6;

/// Playback time per step in milliseconds
pub const DEFAULT_STEP_TIME_MS: u64 = 500;

/// Hold after a blocked move (1s)
pub const DEFAULT_FAIL_PAUSE_MS: u64 = 1_000;

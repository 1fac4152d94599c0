//! Runner Configuration

use puzzle_runtime::{DEFAULT_FAIL_PAUSE_MS, DEFAULT_STEP_TIME_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory of the progress store
    pub data_dir: PathBuf,
    /// Playback time per step in milliseconds
    pub step_time_ms: u64,
    /// Hold after a blocked move in milliseconds
    pub fail_pause_ms: u64,
    /// Persist completions on a win
    pub save_progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            step_time_ms: DEFAULT_STEP_TIME_MS,
            fail_pause_ms: DEFAULT_FAIL_PAUSE_MS,
            save_progress: true,
        }
    }
}

impl RunnerConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

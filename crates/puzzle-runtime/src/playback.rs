//! Playback - timed replay of a step trace
//!
//! The simulator produces the whole trace up front. Playback feeds it to the
//! presentation layer one frame per tick, and can be abandoned at any frame
//! without touching simulation state.

use parking_lot::RwLock;
use puzzle_program::{Facing, GridCoord, Step};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::broadcast;

use crate::{DEFAULT_FAIL_PAUSE_MS, DEFAULT_STEP_TIME_MS};

/// One replayed step, as the renderer sees it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlaybackFrame {
    /// Position of the step in the trace
    pub index: usize,
    pub step: Step,
    /// Avatar cell once the step is shown
    pub position: GridCoord,
    pub facing: Facing,
}

/// Playback configuration
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Time per step in milliseconds
    pub step_time_ms: u64,
    /// Extra hold after a blocked move before playback ends
    pub fail_pause_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_time_ms: DEFAULT_STEP_TIME_MS,
            fail_pause_ms: DEFAULT_FAIL_PAUSE_MS,
        }
    }
}

/// Stats about a playback run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackStats {
    pub frames_emitted: usize,
    pub stopped_early: bool,
}

/// Cloneable control for a running playback
#[derive(Clone)]
pub struct PlaybackHandle {
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<PlaybackStats>>,
}

impl PlaybackHandle {
    /// Abandon playback; no further frames are emitted
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats.read().clone()
    }
}

/// Trace replayer
pub struct Playback {
    trace: Vec<Step>,
    initial_facing: Facing,
    config: PlaybackConfig,
    /// Frame broadcaster; closes when playback ends
    frame_sender: broadcast::Sender<PlaybackFrame>,
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<PlaybackStats>>,
}

impl Playback {
    /// Create a playback for `trace`, starting with the avatar facing `initial_facing`
    pub fn new(trace: Vec<Step>, initial_facing: Facing, config: PlaybackConfig) -> Self {
        // Room for every frame, so a slow subscriber never lags
        let (frame_sender, _) = broadcast::channel(trace.len().max(1));

        Self {
            trace,
            initial_facing,
            config,
            frame_sender,
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(RwLock::new(PlaybackStats::default())),
        }
    }

    /// Subscribe to frames. Must be called before [`Playback::run_async`].
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackFrame> {
        self.frame_sender.subscribe()
    }

    pub fn handle(&self) -> PlaybackHandle {
        PlaybackHandle {
            running: self.running.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Emit one frame per tick until the trace ends or playback is stopped
    pub async fn run_async(self) -> PlaybackStats {
        let step_duration = Duration::from_millis(self.config.step_time_ms.max(1));
        let mut interval = tokio::time::interval(step_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::debug!(
            "Playback started ({} steps, {}ms per step)",
            self.trace.len(),
            self.config.step_time_ms
        );

        let mut facing = self.initial_facing;

        for (index, step) in self.trace.iter().enumerate() {
            interval.tick().await;

            if !self.running.load(Ordering::SeqCst) {
                self.stats.write().stopped_early = true;
                tracing::debug!("Playback stopped at frame {}", index);
                break;
            }

            let position = match *step {
                Step::Moved { from, to } => {
                    facing = Facing::after_move(facing, from, to);
                    to
                }
                Step::Blocked { from, .. } => from,
                Step::Collected { at } | Step::CollectedNothing { at } => at,
            };

            // Ignore send errors when nobody is watching
            let _ = self.frame_sender.send(PlaybackFrame {
                index,
                step: *step,
                position,
                facing,
            });
            self.stats.write().frames_emitted += 1;

            if matches!(step, Step::Blocked { .. }) && self.config.fail_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.fail_pause_ms)).await;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        let stats = self.stats.read().clone();
        tracing::debug!("Playback finished: {} frames", stats.frames_emitted);
        stats
    }
}

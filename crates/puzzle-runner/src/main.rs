//! Puzzle Runner
//!
//! Loads a level pack and a player program, simulates the program on one
//! level and prints the run report as JSON. Optionally replays the trace with
//! step timing and records a win in the progress store.

use anyhow::{Context, Result};
use clap::Parser;
use puzzle_program::Program;
use puzzle_runtime::{
    LevelCatalog, LevelKey, LevelPack, PlaySession, Playback, PlaybackConfig, ProgressStore,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::RunnerConfig;

/// Grid puzzle program runner
#[derive(Parser, Debug)]
#[command(name = "puzzle-runner")]
#[command(about = "Run a block program against a puzzle level", long_about = None)]
struct Args {
    /// Level pack (JSON)
    #[arg(long)]
    levels: PathBuf,

    /// Level index within the pack (0-based)
    #[arg(long, default_value = "0")]
    level: u32,

    /// Player program (JSON instruction list)
    #[arg(long)]
    program: PathBuf,

    /// Replay the trace with step timing
    #[arg(long)]
    replay: bool,

    /// Playback time per step in milliseconds
    #[arg(long)]
    step_ms: Option<u64>,

    /// Runner config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for progress
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Do not record completions
    #[arg(long)]
    no_save: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { args.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => RunnerConfig::default(),
    };
    if let Some(step_ms) = args.step_ms {
        config.step_time_ms = step_ms;
    }
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if args.no_save {
        config.save_progress = false;
    }

    run(&args, &config).await
}

async fn run(args: &Args, config: &RunnerConfig) -> Result<()> {
    let pack = LevelPack::load(&args.levels)
        .with_context(|| format!("Failed to load level pack {:?}", args.levels))?;
    let catalog = LevelCatalog::new();
    catalog.load_pack(&pack)?;

    let key = LevelKey::new(pack.mode, args.level);
    let board = catalog.get(&key).ok_or_else(|| {
        anyhow::anyhow!("Level {} not in pack ({} levels)", key, catalog.len())
    })?;

    let program_data = std::fs::read_to_string(&args.program)
        .with_context(|| format!("Failed to read program {:?}", args.program))?;
    let program: Program = serde_json::from_str(&program_data)?;

    let store = if config.save_progress {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = ProgressStore::open(&config.data_dir)?;
        let unlocked = store.unlocked_level(key.mode)?;
        if key.index > unlocked {
            tracing::warn!("Level {} is past the unlocked level {}", key, unlocked);
        }
        Some(store)
    } else {
        None
    };

    tracing::info!(
        "Playing {} ({}x{}, {} targets, {} instructions)",
        key,
        board.width(),
        board.height(),
        board.targets().len(),
        program.len()
    );

    let mut session = PlaySession::new(key, board);
    let report = session.play(&program)?;

    if args.replay {
        let playback = Playback::new(
            report.outcome.trace.clone(),
            session.board().facing_hint(),
            PlaybackConfig {
                step_time_ms: config.step_time_ms,
                fail_pause_ms: config.fail_pause_ms,
            },
        );
        let mut frames = playback.subscribe();

        let printer = tokio::spawn(async move {
            while let Ok(frame) = frames.recv().await {
                tracing::info!(
                    "[{}] {:?} -> at {} facing {:?}",
                    frame.index,
                    frame.step,
                    frame.position,
                    frame.facing
                );
            }
        });

        tokio::select! {
            stats = playback.run_async() => {
                tracing::debug!("Replayed {} frames", stats.frames_emitted);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Replay interrupted");
            }
        }

        if let Err(e) = printer.await {
            tracing::error!("Frame printer failed: {}", e);
        }
    }

    match &store {
        Some(store) if report.outcome.is_win() => {
            session.report_completion(store)?;
        }
        _ => {}
    }

    tracing::info!("Result: {:?} ({})", report.outcome.status, report.digest);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

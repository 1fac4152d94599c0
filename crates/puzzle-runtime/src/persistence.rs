//! Persistence Layer for player progress
//!
//! Uses sled embedded database to keep level completions and the unlocked
//! level frontier per mode across restarts.

use sled::Db;
use std::path::Path;

use crate::{
    level::{GameMode, LevelKey},
    session::CompletionRecord,
};

/// Persistent storage for player progress
pub struct ProgressStore {
    /// Sled database instance
    db: Db,
    /// Best completion per level
    completions: sled::Tree,
    /// Next playable level per mode
    unlocked: sled::Tree,
}

impl ProgressStore {
    /// Open or create a progress store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let db = sled::open(&path)?;
        let completions = db.open_tree("completions")?;
        let unlocked = db.open_tree("unlocked")?;

        tracing::info!("Opened progress store at {:?}", path.as_ref());

        Ok(Self {
            db,
            completions,
            unlocked,
        })
    }

    /// Store a completion if it beats the stored one
    ///
    /// Returns true when the record was written. The unlocked frontier only
    /// advances when the completed level is the current frontier.
    pub fn save_completion(&self, record: &CompletionRecord) -> anyhow::Result<bool> {
        let key = record.level.to_key_bytes();

        let improved = match self.get_completion(&record.level)? {
            Some(existing) => record.stars > existing.stars,
            None => true,
        };
        if improved {
            let bytes = bincode::serialize(record)?;
            self.completions.insert(key, bytes)?;
        }

        let mode = record.level.mode;
        if self.unlocked_level(mode)? == record.level.index {
            let next = record.level.index.saturating_add(1);
            self.unlocked.insert([mode.id()], next.to_le_bytes().to_vec())?;
            tracing::info!("Unlocked {} level {}", mode, next);
        }

        Ok(improved)
    }

    /// Get the stored completion of a level
    pub fn get_completion(&self, level: &LevelKey) -> anyhow::Result<Option<CompletionRecord>> {
        match self.completions.get(level.to_key_bytes())? {
            Some(bytes) => {
                let record: CompletionRecord = bincode::deserialize(&bytes)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// All completions of one mode, in level order
    pub fn completions_for_mode(&self, mode: GameMode) -> anyhow::Result<Vec<CompletionRecord>> {
        let mut records = Vec::new();

        for result in self.completions.scan_prefix([mode.id()]) {
            let (_, value) = result?;
            let record: CompletionRecord = bincode::deserialize(&value)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Index of the first level of `mode` not yet cleared in order
    pub fn unlocked_level(&self, mode: GameMode) -> anyhow::Result<u32> {
        let level = match self.unlocked.get([mode.id()])? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("Invalid unlocked level for {}", mode))?;
                u32::from_le_bytes(arr)
            }
            None => 0,
        };
        Ok(level)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> anyhow::Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the number of stored completions
    pub fn completion_count(&self) -> usize {
        self.completions.len()
    }

    /// Clear all data (for testing)
    pub fn clear(&self) -> anyhow::Result<()> {
        self.completions.clear()?;
        self.unlocked.clear()?;
        Ok(())
    }
}

/// Receiver of cleared levels
///
/// Sessions report through this instead of reaching for a global save service.
pub trait ProgressSink {
    fn record_completion(&self, record: &CompletionRecord) -> anyhow::Result<()>;
}

impl ProgressSink for ProgressStore {
    fn record_completion(&self, record: &CompletionRecord) -> anyhow::Result<()> {
        let improved = self.save_completion(record)?;
        self.flush()?;

        tracing::info!(
            "Saved completion of {} ({} stars, {} attempts, {}ms){}",
            record.level,
            record.stars,
            record.attempts,
            record.elapsed_ms(),
            if improved { "" } else { " - kept previous best" }
        );

        Ok(())
    }
}

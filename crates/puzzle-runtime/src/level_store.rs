//! In-memory level catalog using DashMap for concurrent access

use dashmap::DashMap;
use puzzle_program::Board;
use std::sync::Arc;

use crate::level::{GameMode, LevelError, LevelKey, LevelPack};

/// Thread-safe catalog of decoded boards
///
/// Boards are immutable, so they are handed out as `Arc` and shared by every
/// session playing that level.
#[derive(Clone, Default)]
pub struct LevelCatalog {
    levels: Arc<DashMap<LevelKey, Arc<Board>>>,
}

impl LevelCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a board by key
    pub fn get(&self, key: &LevelKey) -> Option<Arc<Board>> {
        self.levels.get(key).map(|r| r.value().clone())
    }

    /// Store a board, replacing any previous one under the same key
    pub fn insert(&self, key: LevelKey, board: Board) -> Arc<Board> {
        let board = Arc::new(board);
        self.levels.insert(key, board.clone());
        board
    }

    /// Check if a level exists
    pub fn contains(&self, key: &LevelKey) -> bool {
        self.levels.contains_key(key)
    }

    /// Decode every level in a pack; stops at the first malformed level
    pub fn load_pack(&self, pack: &LevelPack) -> Result<usize, LevelError> {
        for (index, payload) in pack.levels.iter().enumerate() {
            let board = payload.to_board().map_err(|e| {
                tracing::warn!("Level {}#{} is malformed: {}", pack.mode, index, e);
                e
            })?;
            self.insert(LevelKey::new(pack.mode, index as u32), board);
        }

        tracing::info!("Loaded {} {} levels", pack.levels.len(), pack.mode);
        Ok(pack.levels.len())
    }

    /// Keys of one mode, in play order
    pub fn keys_for_mode(&self, mode: GameMode) -> Vec<LevelKey> {
        let mut keys: Vec<LevelKey> = self
            .levels
            .iter()
            .map(|r| *r.key())
            .filter(|key| key.mode == mode)
            .collect();
        keys.sort();
        keys
    }

    /// Get level count
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove a level
    pub fn remove(&self, key: &LevelKey) -> Option<Arc<Board>> {
        self.levels.remove(key).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{CellKind, LevelCell, LevelPayload};
    use puzzle_program::GridCoord;

    fn payload(target: u32) -> LevelPayload {
        LevelPayload {
            width: 4,
            height: 2,
            start: 1,
            cells: vec![LevelCell { index: target, kind: CellKind::Target }],
        }
    }

    #[test]
    fn test_load_pack_and_get() {
        let catalog = LevelCatalog::new();
        let pack = LevelPack {
            mode: GameMode::Loop,
            levels: vec![payload(2), payload(5)],
        };

        assert_eq!(catalog.load_pack(&pack).unwrap(), 2);
        assert_eq!(catalog.len(), 2);

        let board = catalog.get(&LevelKey::new(GameMode::Loop, 1)).unwrap();
        assert_eq!(board.targets(), &[GridCoord::new(1, 2)]);
        assert!(catalog.get(&LevelKey::new(GameMode::Basic, 0)).is_none());
    }

    #[test]
    fn test_keys_for_mode_sorted() {
        let catalog = LevelCatalog::new();
        for index in [3, 0, 2] {
            catalog.insert(
                LevelKey::new(GameMode::Sequence, index),
                payload(2).to_board().unwrap(),
            );
        }
        catalog.insert(LevelKey::new(GameMode::Basic, 1), payload(2).to_board().unwrap());

        let keys = catalog.keys_for_mode(GameMode::Sequence);
        let indices: Vec<u32> = keys.iter().map(|k| k.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_bad_level_aborts_pack() {
        let catalog = LevelCatalog::new();
        let pack = LevelPack {
            mode: GameMode::Basic,
            levels: vec![payload(2), payload(0)],
        };

        assert!(catalog.load_pack(&pack).is_err());
        assert!(catalog.contains(&LevelKey::new(GameMode::Basic, 0)));
        assert!(!catalog.contains(&LevelKey::new(GameMode::Basic, 1)));
    }
}

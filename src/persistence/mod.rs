//! Best score and resume-on-reload persistence
//!
//! Everything is stored as JSON strings under fixed keys. Storage failures
//! degrade to an in-memory store and never interrupt play.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::consts::{EXCHANGE_USES, GRID_SIZE, MAX_TILE_VALUE, REMOVE_USES, UNDO_USES};
use crate::sim::SavedGame;

/// Key for the best score
pub const BEST_SCORE_KEY: &str = "nova2048_best";
/// Key for the game in progress
pub const GAME_STATE_KEY: &str = "nova2048_game";
/// Key for user settings
pub const SETTINGS_KEY: &str = "nova2048_settings";

/// String key/value store
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false if the write failed
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str);
}

/// Volatile store used natively, in tests and when LocalStorage is unavailable
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.items.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// None if storage is disabled or fails a write probe (private mode)
    pub fn open() -> Option<Self> {
        let inner = web_sys::window()?.local_storage().ok()??;
        const PROBE: &str = "nova2048_probe";
        inner.set_item(PROBE, PROBE).ok()?;
        let _ = inner.remove_item(PROBE);
        Some(Self { inner })
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.inner.set_item(key, value).is_ok()
    }

    fn remove(&mut self, key: &str) {
        let _ = self.inner.remove_item(key);
    }
}

/// Best available store for this platform
pub fn open_storage() -> Box<dyn Storage> {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(storage) = LocalStorage::open() {
            log::info!("Using LocalStorage");
            return Box::new(storage);
        }
        log::warn!("LocalStorage unavailable, progress will not survive reload");
    }
    Box::new(MemoryStorage::new())
}

impl Storage for Box<dyn Storage> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

/// Read a JSON value, treating malformed data as absent
pub fn load_json<T: DeserializeOwned, S: Storage + ?Sized>(storage: &S, key: &str) -> Option<T> {
    let json = storage.get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding malformed {}: {}", key, e);
            None
        }
    }
}

/// Write a JSON value. Returns false on failure.
pub fn save_json<T: Serialize, S: Storage + ?Sized>(storage: &mut S, key: &str, value: &T) -> bool {
    let Ok(json) = serde_json::to_string(value) else {
        log::warn!("Failed to serialize {}", key);
        return false;
    };
    let ok = storage.set(key, &json);
    if !ok {
        log::warn!("Failed to write {}", key);
    }
    ok
}

/// Typed access to the best score and the saved game
pub struct SaveStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SaveStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn best_score(&self) -> u64 {
        load_json(&self.storage, BEST_SCORE_KEY).unwrap_or(0)
    }

    pub fn set_best_score(&mut self, score: u64) {
        save_json(&mut self.storage, BEST_SCORE_KEY, &score);
    }

    /// Saved game, if present and consistent
    pub fn game_state(&self) -> Option<SavedGame> {
        let saved: SavedGame = load_json(&self.storage, GAME_STATE_KEY)?;
        let budgets = saved.budgets;
        let valid = saved.size == GRID_SIZE
            && board_is_valid(&saved.values)
            && saved.history.iter().all(|s| board_is_valid(&s.values))
            && budgets.undo <= UNDO_USES
            && budgets.exchange <= EXCHANGE_USES
            && budgets.remove <= REMOVE_USES;
        if !valid {
            log::warn!("Ignoring inconsistent saved game");
            return None;
        }
        Some(saved)
    }

    pub fn set_game_state(&mut self, saved: &SavedGame) {
        save_json(&mut self.storage, GAME_STATE_KEY, saved);
    }

    pub fn clear_game_state(&mut self) {
        self.storage.remove(GAME_STATE_KEY);
    }
}

/// Full-size board of tile values that merges can produce
fn board_is_valid(values: &[Option<u32>]) -> bool {
    values.len() == GRID_SIZE * GRID_SIZE
        && values
            .iter()
            .flatten()
            .all(|v| v.is_power_of_two() && (2..=MAX_TILE_VALUE).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_best_score_defaults_to_zero() {
        let store = SaveStore::new(MemoryStorage::new());
        assert_eq!(store.best_score(), 0);
    }

    #[test]
    fn test_best_score_persists() {
        let mut store = SaveStore::new(MemoryStorage::new());
        store.set_best_score(1234);
        assert_eq!(store.best_score(), 1234);
        assert_eq!(store.storage().get(BEST_SCORE_KEY).as_deref(), Some("1234"));
    }

    #[test]
    fn test_game_state_roundtrip_and_clear() {
        let mut rng = Pcg32::seed_from_u64(5);
        let state = GameState::new_game(4, &mut rng);
        let mut store = SaveStore::new(MemoryStorage::new());

        store.set_game_state(&state.to_saved());
        assert_eq!(store.game_state(), Some(state.to_saved()));

        store.clear_game_state();
        assert_eq!(store.game_state(), None);
    }

    #[test]
    fn test_malformed_data_is_ignored() {
        let mut storage = MemoryStorage::new();
        storage.set(BEST_SCORE_KEY, "not a number");
        storage.set(GAME_STATE_KEY, "{\"size\": 4}");
        let store = SaveStore::new(storage);
        assert_eq!(store.best_score(), 0);
        assert_eq!(store.game_state(), None);
    }

    #[test]
    fn test_inconsistent_game_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut saved = GameState::new_game(4, &mut rng).to_saved();
        saved.values.truncate(10);
        let mut store = SaveStore::new(MemoryStorage::new());
        store.set_game_state(&saved);
        assert_eq!(store.game_state(), None);
    }

    #[test]
    fn test_oversized_board_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut saved = GameState::new_game(4, &mut rng).to_saved();
        saved.size = usize::MAX;
        let mut store = SaveStore::new(MemoryStorage::new());
        store.set_game_state(&saved);
        assert_eq!(store.game_state(), None);

        saved.size = 5;
        saved.values = vec![None; 25];
        store.set_game_state(&saved);
        assert_eq!(store.game_state(), None);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut rng = Pcg32::seed_from_u64(5);
        let good = GameState::new_game(4, &mut rng).to_saved();
        let mut store = SaveStore::new(MemoryStorage::new());

        let mut huge = good.clone();
        huge.values[0] = Some(1 << 31);
        store.set_game_state(&huge);
        assert_eq!(store.game_state(), None);

        let mut bad_history = good.clone();
        let mut snap = GameState::from_saved(&good).snapshot();
        snap.values[3] = Some(3);
        bad_history.history.push(snap);
        store.set_game_state(&bad_history);
        assert_eq!(store.game_state(), None);

        let mut budgets = good.clone();
        budgets.budgets.undo = 200;
        store.set_game_state(&budgets);
        assert_eq!(store.game_state(), None);

        let mut top = good;
        top.values[0] = Some(MAX_TILE_VALUE);
        store.set_game_state(&top);
        assert_eq!(store.game_state(), Some(top));
    }

    #[test]
    fn test_boxed_storage_delegates() {
        let mut storage = open_storage();
        assert!(storage.set("k", "v"));
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }
}

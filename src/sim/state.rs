//! Game state and core types
//!
//! All state that must be persisted for resume-on-reload lives here.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid};
use super::moves::Direction;
use crate::consts::*;

/// Derived lifecycle of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Accepting moves
    Playing,
    /// Reached the win value; terminated until the player chooses to keep playing
    Won,
    /// No moves left
    Over,
}

/// Progress through the two-tile exchange interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExchangeStage {
    /// Waiting for the first tile
    Choosing,
    /// First tile chosen
    Selected(Cell),
    /// Both tiles chosen; input locked until `commit_at`
    Dwell {
        first: Cell,
        second: Cell,
        commit_at: f64,
    },
}

/// Progress through the remove interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoveStage {
    Choosing,
    /// Tile armed; input locked until `commit_at`
    Pending { cell: Cell, commit_at: f64 },
}

/// Special interaction modes, mutually exclusive and only active while playing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Exchange(ExchangeStage),
    Remove(RemoveStage),
}

impl Mode {
    /// True during a dwell/pending window where no input is accepted
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            Mode::Exchange(ExchangeStage::Dwell { .. }) | Mode::Remove(RemoveStage::Pending { .. })
        )
    }

    /// Scheduled commit time, if any
    pub fn commit_at(&self) -> Option<f64> {
        match *self {
            Mode::Exchange(ExchangeStage::Dwell { commit_at, .. })
            | Mode::Remove(RemoveStage::Pending { commit_at, .. }) => Some(commit_at),
            _ => None,
        }
    }
}

/// Remaining special-move uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    pub undo: u8,
    pub exchange: u8,
    pub remove: u8,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            undo: UNDO_USES,
            exchange: EXCHANGE_USES,
            remove: REMOVE_USES,
        }
    }
}

/// Undo point: cell values, score and terminal flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub values: Vec<Option<u32>>,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
}

/// Something that happened during a state transition.
///
/// Drained by the app after every action to drive rendering, effects and audio.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Moved { direction: Direction },
    Merged { cell: Cell, value: u32 },
    Spawned { cell: Cell, value: u32 },
    Won,
    GameOver,
    KeptPlaying,
    Undone,
    ExchangeEntered,
    ExchangeSelected { cell: Cell },
    ExchangeDeselected,
    ExchangeArmed { first: Cell, second: Cell },
    Swapped { first: Cell, second: Cell },
    RemoveEntered,
    RemoveArmed { cell: Cell },
    Removed { cell: Cell, value: u32 },
    /// A special mode was left without committing
    ModeCancelled,
    Restarted,
}

/// Serializable form of a game in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    pub size: usize,
    pub values: Vec<Option<u32>>,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
    pub budgets: Budgets,
    #[serde(default)]
    pub history: Vec<Snapshot>,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub grid: Grid,
    pub score: u64,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
    pub budgets: Budgets,
    pub mode: Mode,
    /// Successful moves this game
    pub turns: u32,
    history: VecDeque<Snapshot>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create an empty board with full budgets
    pub fn new(size: usize) -> Self {
        Self {
            grid: Grid::new(size),
            score: 0,
            over: false,
            won: false,
            keep_playing: false,
            budgets: Budgets::default(),
            mode: Mode::Normal,
            turns: 0,
            history: VecDeque::with_capacity(UNDO_HISTORY),
            events: Vec::new(),
        }
    }

    /// Create a board with the starting tiles placed
    pub fn new_game<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut state = Self::new(size);
        for _ in 0..START_TILES {
            state.add_random_tile(rng);
        }
        state
    }

    pub fn phase(&self) -> GamePhase {
        if self.over {
            GamePhase::Over
        } else if self.won && !self.keep_playing {
            GamePhase::Won
        } else {
            GamePhase::Playing
        }
    }

    /// Over, or won without choosing to continue
    pub fn is_terminated(&self) -> bool {
        self.phase() != GamePhase::Playing
    }

    /// Spawn a 2 (90%) or 4 (10%) on a random empty cell
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(Cell, u32)> {
        let cell = self.grid.random_empty_cell(rng)?;
        let value = if rng.random_bool(SPAWN_FOUR_CHANCE) { 4 } else { 2 };
        self.grid.spawn(value, cell);
        self.push_event(GameEvent::Spawned { cell, value });
        Some((cell, value))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.grid.values(),
            score: self.score,
            over: self.over,
            won: self.won,
            keep_playing: self.keep_playing,
        }
    }

    /// Retain an undo point, evicting the oldest beyond capacity
    pub fn push_history(&mut self, snapshot: Snapshot) {
        if self.history.len() == UNDO_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }

    pub fn pop_history(&mut self) -> Option<Snapshot> {
        self.history.pop_back()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Undo is possible right now
    pub fn can_undo(&self) -> bool {
        self.budgets.undo > 0 && !self.history.is_empty() && !self.is_terminated()
    }

    /// Replace the board with a snapshot's contents.
    ///
    /// Each restored tile is paired with the nearest unused current tile of the
    /// same value (Manhattan distance, greedy) so it can slide back from there.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let size = self.grid.size();
        let current: Vec<(Cell, u32)> = self.grid.tiles().map(|t| (t.pos, t.value)).collect();
        let mut used = vec![false; current.len()];

        let cells: Vec<Cell> = self.grid.cells().collect();
        for cell in &cells {
            self.grid.remove(*cell);
        }

        for (idx, value) in snapshot.values.iter().enumerate().take(size * size) {
            let Some(value) = *value else { continue };
            let cell = Cell::new(idx / size, idx % size);

            let nearest = current
                .iter()
                .enumerate()
                .filter(|(i, (_, v))| !used[*i] && *v == value)
                .min_by_key(|(_, (pos, _))| pos.manhattan(cell))
                .map(|(i, (pos, _))| (i, *pos));

            self.grid.spawn(value, cell);
            if let Some(tile) = self.grid.get_mut(cell) {
                match nearest {
                    Some((i, from)) => {
                        used[i] = true;
                        tile.just_spawned = false;
                        tile.previous = Some(from);
                    }
                    None => tile.just_spawned = true,
                }
            }
        }

        self.score = snapshot.score;
        self.over = snapshot.over;
        self.won = snapshot.won;
        self.keep_playing = snapshot.keep_playing;
    }

    /// Clear per-tile animation flags so the next render is a still frame
    pub fn clear_transient(&mut self) {
        self.grid.clear_transient();
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn to_saved(&self) -> SavedGame {
        SavedGame {
            size: self.grid.size(),
            values: self.grid.values(),
            score: self.score,
            over: self.over,
            won: self.won,
            keep_playing: self.keep_playing,
            budgets: self.budgets,
            history: self.history.iter().cloned().collect(),
        }
    }

    pub fn from_saved(saved: &SavedGame) -> Self {
        let mut state = Self::new(saved.size);
        state.grid = Grid::from_values(saved.size, &saved.values);
        state.score = saved.score;
        state.over = saved.over;
        state.won = saved.won;
        state.keep_playing = saved.keep_playing;
        state.budgets = saved.budgets;
        for snapshot in saved.history.iter().rev().take(UNDO_HISTORY).rev() {
            state.push_history(snapshot.clone());
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn values_with(tiles: &[(usize, usize, u32)]) -> Vec<Option<u32>> {
        let mut values = vec![None; 16];
        for &(x, y, v) in tiles {
            values[x * 4 + y] = Some(v);
        }
        values
    }

    #[test]
    fn test_new_game_has_start_tiles() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut state = GameState::new_game(4, &mut rng);
        assert_eq!(state.grid.tile_count(), START_TILES);
        assert!(state.grid.tiles().all(|t| t.value == 2 || t.value == 4));
        let spawned = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Spawned { .. }))
            .count();
        assert_eq!(spawned, START_TILES);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_phase_derivation() {
        let mut state = GameState::new(4);
        state.won = true;
        assert_eq!(state.phase(), GamePhase::Won);
        assert!(state.is_terminated());
        state.keep_playing = true;
        assert_eq!(state.phase(), GamePhase::Playing);
        state.over = true;
        assert_eq!(state.phase(), GamePhase::Over);
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut state = GameState::new(4);
        for score in 1..=3 {
            let mut snap = state.snapshot();
            snap.score = score;
            state.push_history(snap);
        }
        assert_eq!(state.history_len(), UNDO_HISTORY);
        assert_eq!(state.pop_history().map(|s| s.score), Some(3));
        assert_eq!(state.pop_history().map(|s| s.score), Some(2));
        assert_eq!(state.pop_history(), None);
    }

    #[test]
    fn test_restore_pairs_nearest_equal_tiles() {
        let mut state = GameState::new(4);
        state.grid = Grid::from_values(4, &values_with(&[(0, 0, 4), (3, 3, 2)]));

        let snapshot = Snapshot {
            values: values_with(&[(1, 0, 4), (2, 3, 2), (0, 3, 8)]),
            score: 12,
            over: false,
            won: false,
            keep_playing: false,
        };
        state.restore(&snapshot);

        assert_eq!(state.grid.values(), snapshot.values);
        assert_eq!(state.score, 12);
        let four = state.grid.get(Cell::new(1, 0));
        assert_eq!(four.and_then(|t| t.previous), Some(Cell::new(0, 0)));
        let two = state.grid.get(Cell::new(2, 3));
        assert_eq!(two.and_then(|t| t.previous), Some(Cell::new(3, 3)));
        let eight = state.grid.get(Cell::new(0, 3));
        assert_eq!(eight.map(|t| (t.previous, t.just_spawned)), Some((None, true)));
    }

    #[test]
    fn test_restore_uses_each_current_tile_once() {
        let mut state = GameState::new(4);
        state.grid = Grid::from_values(4, &values_with(&[(0, 0, 2)]));
        let snapshot = Snapshot {
            values: values_with(&[(0, 1, 2), (0, 2, 2)]),
            score: 0,
            over: false,
            won: false,
            keep_playing: false,
        };
        state.restore(&snapshot);

        let paired = state.grid.tiles().filter(|t| t.previous.is_some()).count();
        assert_eq!(paired, 1);
        assert_eq!(state.grid.get(Cell::new(0, 1)).and_then(|t| t.previous), Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_saved_game_roundtrip() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut state = GameState::new_game(4, &mut rng);
        state.score = 96;
        state.budgets.undo = 1;
        let snap = state.snapshot();
        state.push_history(snap);

        let json = serde_json::to_string(&state.to_saved()).unwrap();
        let saved: SavedGame = serde_json::from_str(&json).unwrap();
        let restored = GameState::from_saved(&saved);

        assert_eq!(restored.grid.values(), state.grid.values());
        assert_eq!(restored.score, 96);
        assert_eq!(restored.budgets.undo, 1);
        assert_eq!(restored.history_len(), 1);
    }

    #[test]
    fn test_mode_lock() {
        let cell = Cell::new(0, 0);
        assert!(!Mode::Normal.is_locked());
        assert!(!Mode::Exchange(ExchangeStage::Selected(cell)).is_locked());
        let dwell = Mode::Exchange(ExchangeStage::Dwell {
            first: cell,
            second: Cell::new(1, 0),
            commit_at: 600.0,
        });
        assert!(dwell.is_locked());
        assert_eq!(dwell.commit_at(), Some(600.0));
        assert!(Mode::Remove(RemoveStage::Pending { cell, commit_at: 1.0 }).is_locked());
    }
}

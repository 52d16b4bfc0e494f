//! Game state machine
//!
//! `apply` handles one input; `advance` commits scheduled dwell/pending
//! transitions once the virtual clock reaches them. Rejected inputs return
//! `false` and leave the state untouched.

use rand::Rng;

use super::grid::Cell;
use super::moves::{Direction, moves_available, slide};
use super::state::{ExchangeStage, GameEvent, GamePhase, GameState, Mode, RemoveStage};
use crate::consts::*;

/// Input commands, decoded by the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    Move(Direction),
    Restart,
    Undo,
    ExchangeToggle,
    RemoveToggle,
    TileClick(Cell),
    KeepPlaying,
}

/// Apply one input at clock time `now` (ms). Returns true if state changed.
pub fn apply<R: Rng + ?Sized>(state: &mut GameState, input: GameInput, now: f64, rng: &mut R) -> bool {
    match input {
        GameInput::Restart => {
            restart(state, rng);
            true
        }
        _ if state.mode.is_locked() => false,
        GameInput::Move(direction) => make_move(state, direction, rng),
        GameInput::Undo => undo(state),
        GameInput::ExchangeToggle => toggle_exchange(state),
        GameInput::RemoveToggle => toggle_remove(state),
        GameInput::TileClick(cell) => click(state, cell, now),
        GameInput::KeepPlaying => keep_playing(state),
    }
}

/// Commit a due dwell/pending action. Returns true if state changed.
pub fn advance(state: &mut GameState, now: f64) -> bool {
    match state.mode {
        Mode::Exchange(ExchangeStage::Dwell {
            first,
            second,
            commit_at,
        }) if now >= commit_at => {
            commit_exchange(state, first, second);
            true
        }
        Mode::Remove(RemoveStage::Pending { cell, commit_at }) if now >= commit_at => {
            commit_remove(state, cell);
            true
        }
        _ => false,
    }
}

fn restart<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) {
    let mut fresh = GameState::new(state.grid.size());
    fresh.push_event(GameEvent::Restarted);
    for _ in 0..START_TILES {
        fresh.add_random_tile(rng);
    }
    *state = fresh;
    log::info!("New game started");
}

/// Leave any special mode without committing
fn cancel_mode(state: &mut GameState) -> bool {
    if state.mode == Mode::Normal {
        return false;
    }
    state.mode = Mode::Normal;
    state.clear_transient();
    state.push_event(GameEvent::ModeCancelled);
    true
}

fn make_move<R: Rng + ?Sized>(state: &mut GameState, direction: Direction, rng: &mut R) -> bool {
    if state.is_terminated() {
        return false;
    }
    let cancelled = cancel_mode(state);

    let before = state.snapshot();
    let outcome = slide(&mut state.grid, direction);
    if !outcome.moved {
        return cancelled;
    }

    state.score += outcome.score as u64;
    state.push_history(before);
    state.turns += 1;
    state.push_event(GameEvent::Moved { direction });

    for merge in &outcome.merges {
        state.push_event(GameEvent::Merged {
            cell: merge.cell,
            value: merge.value,
        });
        if merge.value >= WIN_VALUE && !state.won {
            state.won = true;
            state.push_event(GameEvent::Won);
            log::info!("Reached {} with score {}", merge.value, state.score);
        }
    }

    state.add_random_tile(rng);

    if !moves_available(&state.grid) {
        state.over = true;
        state.push_event(GameEvent::GameOver);
        log::info!("Game over: score {} after {} turns", state.score, state.turns);
    }
    true
}

fn undo(state: &mut GameState) -> bool {
    if !state.can_undo() {
        return false;
    }
    let Some(snapshot) = state.pop_history() else {
        return false;
    };
    cancel_mode(state);
    state.budgets.undo -= 1;
    state.restore(&snapshot);
    state.push_event(GameEvent::Undone);
    log::debug!("Undo used, {} left", state.budgets.undo);
    true
}

fn toggle_exchange(state: &mut GameState) -> bool {
    if state.is_terminated() {
        return false;
    }
    if let Mode::Exchange(_) = state.mode {
        return cancel_mode(state);
    }
    if state.budgets.exchange == 0 || state.grid.tile_count() < 2 {
        return false;
    }
    cancel_mode(state);
    state.clear_transient();
    state.mode = Mode::Exchange(ExchangeStage::Choosing);
    state.push_event(GameEvent::ExchangeEntered);
    true
}

fn toggle_remove(state: &mut GameState) -> bool {
    if state.is_terminated() {
        return false;
    }
    if let Mode::Remove(_) = state.mode {
        return cancel_mode(state);
    }
    // The last tile on the board is never removable
    if state.budgets.remove == 0 || state.grid.tile_count() < 2 {
        return false;
    }
    cancel_mode(state);
    state.clear_transient();
    state.mode = Mode::Remove(RemoveStage::Choosing);
    state.push_event(GameEvent::RemoveEntered);
    true
}

fn click(state: &mut GameState, cell: Cell, now: f64) -> bool {
    if !state.grid.is_occupied(cell) {
        return false;
    }
    match state.mode {
        Mode::Exchange(ExchangeStage::Choosing) => {
            state.mode = Mode::Exchange(ExchangeStage::Selected(cell));
            state.push_event(GameEvent::ExchangeSelected { cell });
        }
        Mode::Exchange(ExchangeStage::Selected(first)) if first == cell => {
            state.mode = Mode::Exchange(ExchangeStage::Choosing);
            state.push_event(GameEvent::ExchangeDeselected);
        }
        Mode::Exchange(ExchangeStage::Selected(first)) => {
            state.mode = Mode::Exchange(ExchangeStage::Dwell {
                first,
                second: cell,
                commit_at: now + EXCHANGE_DWELL_MS,
            });
            state.push_event(GameEvent::ExchangeArmed {
                first,
                second: cell,
            });
        }
        Mode::Remove(RemoveStage::Choosing) => {
            state.mode = Mode::Remove(RemoveStage::Pending {
                cell,
                commit_at: now + REMOVE_PENDING_MS,
            });
            state.push_event(GameEvent::RemoveArmed { cell });
        }
        _ => return false,
    }
    true
}

fn keep_playing(state: &mut GameState) -> bool {
    if state.phase() != GamePhase::Won {
        return false;
    }
    state.keep_playing = true;
    state.push_event(GameEvent::KeptPlaying);
    true
}

fn commit_exchange(state: &mut GameState, first: Cell, second: Cell) {
    let before = state.snapshot();
    state.clear_transient();
    state.mode = Mode::Normal;

    if state.grid.swap(first, second) {
        state.push_history(before);
        state.budgets.exchange -= 1;
        state.push_event(GameEvent::Swapped { first, second });
        log::debug!("Swapped {:?} <-> {:?}, {} left", first, second, state.budgets.exchange);

        if !moves_available(&state.grid) {
            state.over = true;
            state.push_event(GameEvent::GameOver);
        }
    } else {
        state.push_event(GameEvent::ModeCancelled);
    }
}

fn commit_remove(state: &mut GameState, cell: Cell) {
    let before = state.snapshot();
    state.clear_transient();
    state.mode = Mode::Normal;

    if state.grid.tile_count() < 2 {
        state.push_event(GameEvent::ModeCancelled);
        return;
    }
    match state.grid.remove(cell) {
        Some(tile) => {
            state.push_history(before);
            state.budgets.remove -= 1;
            state.push_event(GameEvent::Removed {
                cell,
                value: tile.value,
            });
            log::debug!("Removed {} at {:?}, {} left", tile.value, cell, state.budgets.remove);
        }
        None => state.push_event(GameEvent::ModeCancelled),
    }
}

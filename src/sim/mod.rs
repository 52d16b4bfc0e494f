//! Deterministic game logic
//!
//! All gameplay lives here. This module must stay pure and deterministic:
//! - Seeded RNG only, passed in by the caller
//! - Time only through the explicit `now` (ms) argument
//! - No rendering, audio or platform dependencies

pub mod grid;
pub mod moves;
pub mod schedule;
pub mod state;
pub mod tick;

pub use grid::{Cell, Grid, Tile};
pub use moves::{Direction, SlideOutcome, moves_available, slide};
pub use schedule::Timeline;
pub use state::{
    Budgets, ExchangeStage, GameEvent, GamePhase, GameState, Mode, RemoveStage, SavedGame, Snapshot,
};
pub use tick::{GameInput, advance, apply};

//! Nova 2048 - A sliding-tile puzzle with a cosmic effects layer
//!
//! Core modules:
//! - `sim`: Deterministic game logic (grid, moves, undo/exchange/remove state machine)
//! - `fx`: Tiered particle and overlay effects driven by a virtual clock
//! - `audio`: Synthesized sound recipes and the sustained charge loop
//! - `renderer`: WebGPU particle canvas
//! - `persistence`: Best score and resume-on-reload storage
//! - `platform`: Input decoding and DOM adapters
//! - `app`: Orchestrates input, state, view, effects and audio

pub mod app;
pub mod audio;
pub mod fx;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod view;

pub use app::App;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Board is GRID_SIZE x GRID_SIZE cells
    pub const GRID_SIZE: usize = 4;
    /// Tiles placed on a fresh board
    pub const START_TILES: usize = 2;
    /// Probability that a spawned tile is a 4 instead of a 2
    pub const SPAWN_FOUR_CHANCE: f64 = 0.1;
    /// Merge result that wins the game
    pub const WIN_VALUE: u32 = 2048;
    /// Largest tile a 4x4 board can reach; saved games above it are rejected
    pub const MAX_TILE_VALUE: u32 = 1 << 17;

    /// Undo uses per game
    pub const UNDO_USES: u8 = 2;
    /// Snapshots retained for undo (oldest evicted first)
    pub const UNDO_HISTORY: usize = 2;
    /// Exchange (swap) uses per game
    pub const EXCHANGE_USES: u8 = 2;
    /// Remove uses per game
    pub const REMOVE_USES: u8 = 2;

    /// Dwell after choosing the second exchange tile before the swap commits
    pub const EXCHANGE_DWELL_MS: f64 = 600.0;
    /// Delay between arming a removal and the tile disappearing
    pub const REMOVE_PENDING_MS: f64 = 700.0;

    /// Hard ceiling on live particles regardless of quality preset
    pub const MAX_PARTICLES: usize = 900;
    /// Recent positions kept for trail-bearing particles
    pub const TRAIL_LENGTH: usize = 8;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

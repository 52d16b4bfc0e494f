//! Application orchestrator
//!
//! Routes input through the state machine, then fans the resulting events out
//! to the view, effect engine, audio and persistence. Generic over its
//! collaborators so the whole loop runs headless in tests.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::{AudioBackend, AudioManager, SoundEvent};
use crate::consts::GRID_SIZE;
use crate::fx::EffectEngine;
use crate::persistence::{SaveStore, Storage};
use crate::settings::Settings;
use crate::sim::{self, GameEvent, GameInput, GameState};
use crate::view::{BoardView, RenderMeta};

/// Merges at or above this value use the heavier sound
const BIG_MERGE: u32 = 256;

pub struct App<V: BoardView, B: AudioBackend, S: Storage> {
    state: GameState,
    rng: Pcg32,
    view: V,
    fx: EffectEngine,
    audio: AudioManager<B>,
    store: SaveStore<S>,
    settings: Settings,
    best: u64,
}

impl<V: BoardView, B: AudioBackend, S: Storage> App<V, B, S> {
    /// Resume the saved game if there is one, otherwise start fresh
    pub fn new(view: V, backend: Option<B>, storage: S, seed: u64) -> Self {
        let settings = Settings::load(&storage);
        let store = SaveStore::new(storage);
        let best = store.best_score();
        let mut rng = Pcg32::seed_from_u64(seed);

        let state = match store.game_state() {
            Some(saved) if !saved.over => {
                log::info!("Resuming saved game (score {})", saved.score);
                GameState::from_saved(&saved)
            }
            _ => {
                log::info!("Starting new game");
                GameState::new_game(GRID_SIZE, &mut rng)
            }
        };

        let mut app = Self {
            state,
            rng,
            view,
            fx: EffectEngine::new(&settings, seed ^ 0x9e37_79b9),
            audio: AudioManager::new(backend, &settings),
            store,
            settings,
            best,
        };
        app.fx.set_viewport(app.view.layout().region().size);
        app.state.drain_events();
        app.persist();
        app.render(false);
        app
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn fx(&self) -> &EffectEngine {
        &self.fx
    }

    pub fn audio(&self) -> &AudioManager<B> {
        &self.audio
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    pub fn store(&self) -> &SaveStore<S> {
        &self.store
    }

    /// Viewport size in px, used for full-screen overlays
    pub fn set_viewport(&mut self, size: glam::Vec2) {
        self.fx.set_viewport(size);
    }

    pub fn set_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        self.fx.apply_settings(&settings);
        self.audio.apply_settings(&settings);
        settings.save(self.store.storage_mut());
        self.settings = settings;
    }

    /// Returns the new muted state
    pub fn toggle_mute(&mut self) -> bool {
        let mut settings = self.settings.clone();
        settings.muted = !settings.muted;
        self.set_settings(settings);
        self.settings.muted
    }

    /// Handle one input at clock time `now` (ms).
    ///
    /// Returns true if the host should make sure its frame loop is running.
    pub fn handle(&mut self, input: GameInput, now: f64) -> bool {
        self.audio.resume();
        let locked = self.state.mode.is_locked();
        if !sim::apply(&mut self.state, input, now, &mut self.rng) {
            let audible_reject = matches!(
                input,
                GameInput::Undo | GameInput::ExchangeToggle | GameInput::RemoveToggle
            );
            if audible_reject && !locked {
                self.audio.play(SoundEvent::Invalid);
            }
            return false;
        }
        self.after_change(now)
    }

    /// Advance scheduled commits and effects to `now`.
    ///
    /// Returns false once nothing is left to animate or commit.
    pub fn frame(&mut self, now: f64) -> bool {
        if sim::advance(&mut self.state, now) {
            self.after_change(now);
        }

        let frame = self.fx.frame(now);
        for (id, overlay) in &frame.spawned {
            self.view.spawn_overlay(*id, overlay);
        }
        for id in &frame.expired {
            self.view.remove_overlay(*id);
        }
        self.needs_frame()
    }

    /// Effects are live or a commit is pending
    pub fn needs_frame(&self) -> bool {
        self.fx.is_running() || self.state.mode.is_locked()
    }

    /// Release audio and effects
    pub fn shutdown(&mut self) {
        self.audio.shutdown();
        self.fx.shutdown();
    }

    fn meta(&self, animate: bool) -> RenderMeta {
        RenderMeta {
            score: self.state.score,
            best: self.best,
            phase: self.state.phase(),
            budgets: self.state.budgets,
            mode: self.state.mode,
            can_undo: self.state.can_undo(),
            animate,
        }
    }

    fn render(&mut self, animate: bool) {
        let meta = self.meta(animate);
        self.view.render(&self.state.grid, &meta);
    }

    fn persist(&mut self) {
        if self.state.score > self.best {
            self.best = self.state.score;
            self.store.set_best_score(self.best);
        }
        if self.state.over {
            self.store.clear_game_state();
        } else {
            self.store.set_game_state(&self.state.to_saved());
        }
    }

    /// Fan events out to view, effects, audio and storage
    fn after_change(&mut self, now: f64) -> bool {
        let events = self.state.drain_events();
        self.persist();

        let animate = events.iter().any(|e| {
            matches!(
                e,
                GameEvent::Moved { .. }
                    | GameEvent::Undone
                    | GameEvent::Swapped { .. }
                    | GameEvent::Removed { .. }
                    | GameEvent::Restarted
            )
        });
        self.render(animate);

        let layout = self.view.layout();
        let mut wake = false;
        let mut moved = false;
        let mut top_merge = None;

        for event in &events {
            match *event {
                GameEvent::Restarted => {
                    self.audio.charge_stop();
                    self.audio.reset_latch();
                    self.audio.play(SoundEvent::NewGame);
                }
                GameEvent::Moved { .. } => moved = true,
                GameEvent::Merged { cell, value } => {
                    wake |= self.fx.trigger(value, layout.cell_center(cell), now);
                    top_merge = top_merge.max(Some(value));
                }
                GameEvent::Spawned { .. } | GameEvent::KeptPlaying => {}
                GameEvent::Won => {
                    self.audio.play(SoundEvent::Win);
                }
                GameEvent::GameOver => {
                    self.audio.play(SoundEvent::GameOver);
                }
                GameEvent::Undone => {
                    wake |= self.fx.trigger_split(layout.region(), now);
                    self.audio.play(SoundEvent::Undo);
                }
                GameEvent::ExchangeEntered
                | GameEvent::ExchangeSelected { .. }
                | GameEvent::ExchangeArmed { .. } => {
                    self.audio.play(SoundEvent::Select);
                }
                GameEvent::ExchangeDeselected => {
                    self.audio.play(SoundEvent::Deselect);
                }
                GameEvent::Swapped { first, second } => {
                    wake |= self.fx.trigger_swap(layout.cell_center(first), layout.cell_center(second), now);
                    self.audio.play(SoundEvent::Swap);
                }
                GameEvent::RemoveEntered => self.audio.charge_start(),
                GameEvent::RemoveArmed { .. } => self.audio.charge_advance(),
                GameEvent::Removed { cell, .. } => {
                    wake |= self.fx.trigger_black_hole(layout.cell_center(cell), now);
                    self.audio.resolve(SoundEvent::BlackHole);
                }
                GameEvent::ModeCancelled => {
                    self.audio.charge_stop();
                    self.audio.play(SoundEvent::Deselect);
                }
            }
        }

        if moved {
            let sound = match top_merge {
                Some(value) if value >= BIG_MERGE => SoundEvent::BigMerge,
                Some(_) => SoundEvent::Merge,
                None => SoundEvent::Move,
            };
            self.audio.play(sound);
        }

        wake || self.state.mode.is_locked()
    }
}

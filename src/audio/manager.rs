//! Audio manager: mute/volume, event dispatch and the sustained charge loop

use super::backend::{AudioBackend, LoopId};
use super::recipe::{CHARGE_BRIGHTEN, CHARGE_CHIME, CHARGE_LOOP, LOOP_FADE_OUT, SoundEvent, recipe};
use crate::settings::Settings;

/// Owns the audio backend (if any) and all per-game audio state
pub struct AudioManager<B: AudioBackend> {
    backend: Option<B>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// One-shot events already fired this game
    latched: Vec<SoundEvent>,
    charge: Option<LoopId>,
}

impl<B: AudioBackend> AudioManager<B> {
    /// A `None` backend yields a manager that accepts every call silently
    pub fn new(backend: Option<B>, settings: &Settings) -> Self {
        if backend.is_none() {
            log::warn!("No audio backend - sound disabled");
        }
        let mut manager = Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            latched: Vec::new(),
            charge: None,
        };
        manager.apply_settings(settings);
        manager
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Resume the output (required after a user gesture in browsers)
    pub fn resume(&mut self) {
        if let Some(backend) = &mut self.backend {
            backend.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Muting also silences a running charge loop
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.charge_stop();
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play an event's recipe. Returns true if anything was scheduled.
    ///
    /// Win and game-over fire at most once until `reset_latch`.
    pub fn play(&mut self, event: SoundEvent) -> bool {
        if event.is_one_shot() {
            if self.latched.contains(&event) {
                return false;
            }
            self.latched.push(event);
        }

        let vol = self.effective_volume();
        if vol <= 0.0 {
            return false;
        }
        let Some(backend) = &mut self.backend else {
            return false;
        };

        backend.resume();
        let at = backend.now();
        let mut played = false;
        for voice in recipe(event) {
            played |= backend.play_voice(voice, at, vol).is_some();
        }
        if !played {
            log::debug!("Sound {:?} could not be built", event);
        }
        played
    }

    /// Re-arm the one-shot events for a new game
    pub fn reset_latch(&mut self) {
        self.latched.clear();
    }

    pub fn is_charging(&self) -> bool {
        self.charge.is_some()
    }

    /// Start the charge loop, tearing down any previous instance first
    pub fn charge_start(&mut self) {
        self.charge_stop();
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = &mut self.backend else {
            return;
        };
        backend.resume();
        self.charge = backend.start_loop(&CHARGE_LOOP, vol);
        if self.charge.is_none() {
            log::debug!("Charge loop could not be built");
        }
    }

    /// Brighten the live loop and layer the chime. No-op without a loop.
    pub fn charge_advance(&mut self) {
        let Some(id) = self.charge else { return };
        let vol = self.effective_volume();
        let Some(backend) = &mut self.backend else {
            return;
        };
        if backend.retarget_loop(id, &CHARGE_BRIGHTEN, vol).is_none() {
            log::debug!("Charge loop {:?} vanished", id);
            self.charge = None;
            return;
        }
        let at = backend.now();
        for voice in CHARGE_CHIME {
            backend.play_voice(voice, at, vol);
        }
    }

    /// Fade out and release the loop. Safe when idle.
    pub fn charge_stop(&mut self) {
        let Some(id) = self.charge.take() else { return };
        if let Some(backend) = &mut self.backend {
            backend.stop_loop(id, LOOP_FADE_OUT);
        }
    }

    /// Terminal sound of the charge interaction: the loop stops before it plays
    pub fn resolve(&mut self, event: SoundEvent) -> bool {
        self.charge_stop();
        self.play(event)
    }

    /// Release everything held by the manager
    pub fn shutdown(&mut self) {
        self.charge_stop();
        self.latched.clear();
    }
}

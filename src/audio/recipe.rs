//! Declarative sound recipes
//!
//! Every event is a fixed list of voices. A voice is an oscillator or a
//! filtered noise source shaped by an attack/peak/decay envelope and started
//! after an optional delay. All times are in seconds on the audio clock.

/// Named sound events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    /// Tiles slid without merging
    Move,
    Merge,
    /// Merge reaching 256 or more
    BigMerge,
    Undo,
    /// Tile picked in exchange mode
    Select,
    Deselect,
    Swap,
    /// Rejected action
    Invalid,
    /// Tile removal resolving the charge
    BlackHole,
    Win,
    GameOver,
    NewGame,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 12] = [
        SoundEvent::Move,
        SoundEvent::Merge,
        SoundEvent::BigMerge,
        SoundEvent::Undo,
        SoundEvent::Select,
        SoundEvent::Deselect,
        SoundEvent::Swap,
        SoundEvent::Invalid,
        SoundEvent::BlackHole,
        SoundEvent::Win,
        SoundEvent::GameOver,
        SoundEvent::NewGame,
    ];

    /// Fires at most once per game
    pub fn is_one_shot(self) -> bool {
        matches!(self, SoundEvent::Win | SoundEvent::GameOver)
    }
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Noise filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Gain envelope: linear rise to `peak` over `attack`, then exponential fall over `decay`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f64,
    pub peak: f32,
    pub decay: f64,
}

/// Frequency over the life of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FreqCurve {
    Fixed(f32),
    /// Exponential glide from `from` to `to` over `secs`
    Glide { from: f32, to: f32, secs: f64 },
    /// Jumps at the given offsets (secs, hz); the first entry is the start pitch
    Steps(&'static [(f64, f32)]),
}

impl FreqCurve {
    pub fn initial(&self) -> f32 {
        match *self {
            FreqCurve::Fixed(hz) => hz,
            FreqCurve::Glide { from, .. } => from,
            FreqCurve::Steps(steps) => steps.first().map(|s| s.1).unwrap_or(440.0),
        }
    }
}

/// Sound source of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    Tone {
        waveform: Waveform,
        freq: FreqCurve,
    },
    Noise {
        filter: FilterKind,
        cutoff: FreqCurve,
        q: f32,
    },
}

/// One transient voice of a recipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub source: Source,
    pub envelope: Envelope,
    /// Start offset from the moment the event is played
    pub delay: f64,
}

impl Voice {
    /// Offset at which the voice has fully decayed
    pub fn end(&self) -> f64 {
        self.delay + self.envelope.attack + self.envelope.decay
    }
}

const fn env(attack: f64, peak: f32, decay: f64) -> Envelope {
    Envelope {
        attack,
        peak,
        decay,
    }
}

const fn tone(waveform: Waveform, freq: FreqCurve, envelope: Envelope, delay: f64) -> Voice {
    Voice {
        source: Source::Tone { waveform, freq },
        envelope,
        delay,
    }
}

const fn noise(filter: FilterKind, cutoff: FreqCurve, q: f32, envelope: Envelope, delay: f64) -> Voice {
    Voice {
        source: Source::Noise { filter, cutoff, q },
        envelope,
        delay,
    }
}

const fn glide(from: f32, to: f32, secs: f64) -> FreqCurve {
    FreqCurve::Glide { from, to, secs }
}

use FilterKind::*;
use FreqCurve::Fixed;
use Waveform::*;

/// Soft swish
const MOVE: &[Voice] = &[
    noise(Bandpass, glide(900.0, 300.0, 0.1), 1.2, env(0.005, 0.08, 0.09), 0.0),
    tone(Sine, glide(180.0, 120.0, 0.08), env(0.003, 0.05, 0.08), 0.0),
];

/// Consonant fifth with a bright tail
const MERGE: &[Voice] = &[
    tone(Sine, Fixed(523.0), env(0.005, 0.2, 0.18), 0.0),
    tone(Sine, Fixed(784.0), env(0.005, 0.14, 0.2), 0.0),
    tone(Triangle, Fixed(1046.0), env(0.004, 0.08, 0.14), 0.03),
];

/// Rising sweep, arpeggio sparkle, noise burst and sub thump
const BIG_MERGE: &[Voice] = &[
    tone(Sine, glide(220.0, 660.0, 0.25), env(0.01, 0.25, 0.35), 0.0),
    tone(Triangle, Fixed(880.0), env(0.004, 0.12, 0.16), 0.06),
    tone(Triangle, Fixed(1108.0), env(0.004, 0.12, 0.16), 0.11),
    tone(Triangle, Fixed(1318.0), env(0.004, 0.12, 0.22), 0.16),
    noise(Lowpass, glide(2400.0, 200.0, 0.45), 0.8, env(0.002, 0.18, 0.45), 0.0),
    tone(Sine, glide(70.0, 40.0, 0.25), env(0.002, 0.3, 0.25), 0.0),
];

/// Reverse sweep
const UNDO: &[Voice] = &[
    tone(Triangle, glide(900.0, 280.0, 0.26), env(0.02, 0.18, 0.26), 0.0),
    noise(Highpass, glide(5000.0, 900.0, 0.3), 0.7, env(0.05, 0.07, 0.25), 0.0),
];

const SELECT: &[Voice] = &[tone(Sine, Fixed(660.0), env(0.003, 0.16, 0.08), 0.0)];

const DESELECT: &[Voice] = &[tone(Sine, Fixed(440.0), env(0.003, 0.12, 0.08), 0.0)];

/// Two pitches crossing
const SWAP: &[Voice] = &[
    tone(Triangle, glide(400.0, 800.0, 0.2), env(0.01, 0.16, 0.2), 0.0),
    tone(Triangle, glide(800.0, 400.0, 0.2), env(0.01, 0.16, 0.2), 0.0),
    noise(Bandpass, glide(1200.0, 2400.0, 0.2), 2.0, env(0.02, 0.05, 0.18), 0.0),
];

/// Low double buzz
const INVALID: &[Voice] = &[tone(
    Square,
    FreqCurve::Steps(&[(0.0, 110.0), (0.06, 92.0)]),
    env(0.002, 0.1, 0.12),
    0.0,
)];

/// Ominous descent into rumble
const BLACK_HOLE: &[Voice] = &[
    tone(Sine, glide(300.0, 20.0, 0.8), env(0.01, 0.4, 0.8), 0.0),
    tone(Sawtooth, glide(90.0, 30.0, 0.7), env(0.02, 0.12, 0.7), 0.0),
    noise(Lowpass, glide(1400.0, 80.0, 0.9), 1.0, env(0.05, 0.22, 0.85), 0.0),
];

/// Triumphant fanfare
const WIN: &[Voice] = &[
    tone(Triangle, Fixed(523.0), env(0.005, 0.3, 0.4), 0.0),
    tone(Triangle, Fixed(659.0), env(0.005, 0.3, 0.4), 0.1),
    tone(Triangle, Fixed(784.0), env(0.005, 0.3, 0.4), 0.2),
    tone(Triangle, Fixed(1047.0), env(0.005, 0.32, 0.7), 0.3),
    noise(Highpass, Fixed(6000.0), 0.5, env(0.2, 0.05, 0.6), 0.3),
];

/// Sad descending line
const GAME_OVER: &[Voice] = &[
    tone(Sine, Fixed(400.0), env(0.005, 0.3, 0.3), 0.0),
    tone(Sine, Fixed(350.0), env(0.005, 0.3, 0.3), 0.2),
    tone(Sine, Fixed(300.0), env(0.005, 0.3, 0.3), 0.4),
    tone(Sine, Fixed(200.0), env(0.005, 0.3, 0.6), 0.6),
];

/// Upward whoosh
const NEW_GAME: &[Voice] = &[
    tone(Triangle, glide(200.0, 600.0, 0.15), env(0.005, 0.3, 0.2), 0.0),
    noise(Bandpass, glide(600.0, 3000.0, 0.2), 1.0, env(0.03, 0.06, 0.18), 0.0),
];

/// Voices for an event
pub fn recipe(event: SoundEvent) -> &'static [Voice] {
    match event {
        SoundEvent::Move => MOVE,
        SoundEvent::Merge => MERGE,
        SoundEvent::BigMerge => BIG_MERGE,
        SoundEvent::Undo => UNDO,
        SoundEvent::Select => SELECT,
        SoundEvent::Deselect => DESELECT,
        SoundEvent::Swap => SWAP,
        SoundEvent::Invalid => INVALID,
        SoundEvent::BlackHole => BLACK_HOLE,
        SoundEvent::Win => WIN,
        SoundEvent::GameOver => GAME_OVER,
        SoundEvent::NewGame => NEW_GAME,
    }
}

// === Charge loop ===

/// Persistent drone: two oscillators and a looping noise bed under one gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSpec {
    pub drones: [(Waveform, f32); 2],
    /// Drones glide this factor above their base pitch over `drift_secs`
    pub drift: f32,
    pub drift_secs: f64,
    pub filter: FilterKind,
    pub noise_cutoff: f32,
    pub noise_q: f32,
    /// Noise level relative to the shared gain
    pub noise_level: f32,
    pub gain: f32,
    pub fade_in: f64,
}

/// New targets for a live loop, reached over `ramp`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTarget {
    pub freqs: [f32; 2],
    pub noise_cutoff: f32,
    pub gain: f32,
    pub ramp: f64,
}

pub const CHARGE_LOOP: LoopSpec = LoopSpec {
    drones: [(Sawtooth, 55.0), (Triangle, 82.5)],
    drift: 1.03,
    drift_secs: 4.0,
    filter: Lowpass,
    noise_cutoff: 420.0,
    noise_q: 3.0,
    noise_level: 0.5,
    gain: 0.16,
    fade_in: 0.35,
};

/// Brighter, louder state once a tile is armed
pub const CHARGE_BRIGHTEN: LoopTarget = LoopTarget {
    freqs: [110.0, 165.0],
    noise_cutoff: 2200.0,
    gain: 0.24,
    ramp: 0.6,
};

/// Ascending chime layered over the loop on advance
pub const CHARGE_CHIME: &[Voice] = &[
    tone(Sine, Fixed(880.0), env(0.004, 0.1, 0.18), 0.0),
    tone(Sine, Fixed(1175.0), env(0.004, 0.1, 0.18), 0.08),
    tone(Sine, Fixed(1568.0), env(0.004, 0.1, 0.25), 0.16),
];

/// Fade applied by `stop` before the loop nodes are halted
pub const LOOP_FADE_OUT: f64 = 0.025;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_event_has_voices() {
        for event in SoundEvent::ALL {
            let voices = recipe(event);
            assert!(!voices.is_empty(), "{:?} is silent", event);
            for voice in voices {
                assert!(voice.envelope.peak > 0.0 && voice.envelope.peak <= 1.0);
                assert!(voice.envelope.decay > 0.0);
                assert!(voice.delay >= 0.0);
            }
        }
    }

    #[test]
    fn test_only_win_and_game_over_latch() {
        let latched: Vec<SoundEvent> = SoundEvent::ALL
            .into_iter()
            .filter(|e| e.is_one_shot())
            .collect();
        assert_eq!(latched, vec![SoundEvent::Win, SoundEvent::GameOver]);
    }

    #[test]
    fn test_chime_ascends() {
        let pitches: Vec<f32> = CHARGE_CHIME
            .iter()
            .map(|v| match v.source {
                Source::Tone { freq, .. } => freq.initial(),
                Source::Noise { cutoff, .. } => cutoff.initial(),
            })
            .collect();
        assert!(pitches.windows(2).all(|w| w[0] < w[1]));
        assert!(CHARGE_BRIGHTEN.gain > CHARGE_LOOP.gain);
    }

    #[test]
    fn test_voice_end() {
        let voice = tone(Sine, Fixed(100.0), env(0.1, 0.5, 0.4), 0.25);
        assert!((voice.end() - 0.75).abs() < 1e-9);
    }
}

//! Audio backends
//!
//! `AudioBackend` realizes recipes. Every operation returns `Option` so a
//! blocked or missing audio stack degrades to silence at the call site.

use super::recipe::{LoopSpec, LoopTarget, Voice};

/// Identity of a live sustained loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopId(pub u64);

pub trait AudioBackend {
    /// Audio clock in seconds
    fn now(&self) -> f64;

    /// Unsuspend the output after a user gesture
    fn resume(&mut self) {}

    /// Schedule one voice to start at `at` (plus its own delay), scaled by `volume`
    fn play_voice(&mut self, voice: &Voice, at: f64, volume: f32) -> Option<()>;

    /// Build and fade in a sustained loop
    fn start_loop(&mut self, spec: &LoopSpec, volume: f32) -> Option<LoopId>;

    /// Glide a live loop toward new targets without restarting it
    fn retarget_loop(&mut self, id: LoopId, target: &LoopTarget, volume: f32) -> Option<()>;

    /// Fade the loop out over `fade` seconds, then halt and release its nodes.
    /// Unknown ids are ignored.
    fn stop_loop(&mut self, id: LoopId, fade: f64);
}

/// Operation recorded by `SilentBackend`
#[derive(Debug, Clone, PartialEq)]
pub enum AudioOp {
    Voice { at: f64, volume: f32 },
    LoopStart(LoopId),
    LoopRetarget(LoopId),
    LoopStop(LoopId),
}

/// Backend that produces no sound and records what it was asked to do
#[derive(Debug, Clone, Default)]
pub struct SilentBackend {
    /// Audio clock, advanced manually
    pub clock: f64,
    /// Simulate a backend that refuses to build nodes
    pub broken: bool,
    ops: Vec<AudioOp>,
    live: Vec<LoopId>,
    next_loop: u64,
}

impl SilentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose node construction always fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> &[AudioOp] {
        &self.ops
    }

    pub fn voices_played(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, AudioOp::Voice { .. }))
            .count()
    }

    pub fn live_loops(&self) -> &[LoopId] {
        &self.live
    }
}

impl AudioBackend for SilentBackend {
    fn now(&self) -> f64 {
        self.clock
    }

    fn play_voice(&mut self, voice: &Voice, at: f64, volume: f32) -> Option<()> {
        if self.broken {
            return None;
        }
        self.ops.push(AudioOp::Voice {
            at: at + voice.delay,
            volume,
        });
        Some(())
    }

    fn start_loop(&mut self, _spec: &LoopSpec, _volume: f32) -> Option<LoopId> {
        if self.broken {
            return None;
        }
        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        self.live.push(id);
        self.ops.push(AudioOp::LoopStart(id));
        Some(id)
    }

    fn retarget_loop(&mut self, id: LoopId, _target: &LoopTarget, _volume: f32) -> Option<()> {
        if !self.live.contains(&id) {
            return None;
        }
        self.ops.push(AudioOp::LoopRetarget(id));
        Some(())
    }

    fn stop_loop(&mut self, id: LoopId, _fade: f64) {
        let before = self.live.len();
        self.live.retain(|l| *l != id);
        if self.live.len() != before {
            self.ops.push(AudioOp::LoopStop(id));
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioBackend;

#[cfg(target_arch = "wasm32")]
mod web {
    use rand::Rng;
    use web_sys::{
        AudioBuffer, AudioBufferSourceNode, AudioContext, AudioParam, BiquadFilterNode,
        BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
    };

    use super::{AudioBackend, LoopId};
    use crate::audio::recipe::{FilterKind, FreqCurve, LoopSpec, LoopTarget, Source, Voice, Waveform};

    /// Gain floor for exponential ramps (which cannot reach zero)
    const SILENCE: f32 = 0.001;
    /// Seconds of white noise in the shared buffer
    const NOISE_SECS: f32 = 1.0;

    struct LiveLoop {
        id: LoopId,
        drones: [OscillatorNode; 2],
        noise: AudioBufferSourceNode,
        filter: BiquadFilterNode,
        gain: GainNode,
    }

    /// Web Audio API backend
    pub struct WebAudioBackend {
        ctx: AudioContext,
        noise: Option<AudioBuffer>,
        loops: Vec<LiveLoop>,
        next_loop: u64,
    }

    fn osc_type(waveform: Waveform) -> OscillatorType {
        match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }

    fn filter_type(kind: FilterKind) -> BiquadFilterType {
        match kind {
            FilterKind::Lowpass => BiquadFilterType::Lowpass,
            FilterKind::Highpass => BiquadFilterType::Highpass,
            FilterKind::Bandpass => BiquadFilterType::Bandpass,
        }
    }

    /// Apply a frequency curve to a param starting at `t`
    fn schedule_curve(param: &AudioParam, curve: &FreqCurve, t: f64) {
        match *curve {
            FreqCurve::Fixed(hz) => {
                param.set_value_at_time(hz, t).ok();
            }
            FreqCurve::Glide { from, to, secs } => {
                param.set_value_at_time(from, t).ok();
                param
                    .exponential_ramp_to_value_at_time(to.max(1.0), t + secs)
                    .ok();
            }
            FreqCurve::Steps(steps) => {
                for (offset, hz) in steps {
                    param.set_value_at_time(*hz, t + offset).ok();
                }
            }
        }
    }

    impl WebAudioBackend {
        /// None if the browser refuses an AudioContext
        pub fn new() -> Option<Self> {
            let Ok(ctx) = AudioContext::new() else {
                log::warn!("Failed to create AudioContext - audio disabled");
                return None;
            };
            let noise = Self::build_noise(&ctx);
            if noise.is_none() {
                log::warn!("Noise buffer unavailable; noise voices will be skipped");
            }
            Some(Self {
                ctx,
                noise,
                loops: Vec::new(),
                next_loop: 0,
            })
        }

        fn build_noise(ctx: &AudioContext) -> Option<AudioBuffer> {
            let rate = ctx.sample_rate();
            let len = (rate * NOISE_SECS) as u32;
            let buffer = ctx.create_buffer(1, len, rate).ok()?;
            let mut rng = rand::rng();
            let mut data: Vec<f32> = (0..len).map(|_| rng.random_range(-1.0..=1.0)).collect();
            buffer.copy_to_channel(&mut data[..], 0).ok()?;
            Some(buffer)
        }

        fn noise_source(&self, looping: bool) -> Option<AudioBufferSourceNode> {
            let buffer = self.noise.as_ref()?;
            let source = self.ctx.create_buffer_source().ok()?;
            source.set_buffer(Some(buffer));
            source.set_loop(looping);
            Some(source)
        }

        fn connect_out(&self, gain: &GainNode) -> Option<()> {
            gain.connect_with_audio_node(&self.ctx.destination()).ok()?;
            Some(())
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn now(&self) -> f64 {
            self.ctx.current_time()
        }

        fn resume(&mut self) {
            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }
        }

        fn play_voice(&mut self, voice: &Voice, at: f64, volume: f32) -> Option<()> {
            let t = at + voice.delay;
            let env = voice.envelope;
            let stop = t + env.attack + env.decay + 0.02;

            let gain = self.ctx.create_gain().ok()?;
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time((env.peak * volume).max(SILENCE), t + env.attack)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(SILENCE, t + env.attack + env.decay)
                .ok();

            match voice.source {
                Source::Tone { waveform, freq } => {
                    let osc = self.ctx.create_oscillator().ok()?;
                    osc.set_type(osc_type(waveform));
                    schedule_curve(&osc.frequency(), &freq, t);
                    osc.connect_with_audio_node(&gain).ok()?;
                    self.connect_out(&gain)?;
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(stop).ok();
                }
                Source::Noise { filter, cutoff, q } => {
                    let source = self.noise_source(false)?;
                    let biquad = self.ctx.create_biquad_filter().ok()?;
                    biquad.set_type(filter_type(filter));
                    biquad.q().set_value(q);
                    schedule_curve(&biquad.frequency(), &cutoff, t);
                    source.connect_with_audio_node(&biquad).ok()?;
                    biquad.connect_with_audio_node(&gain).ok()?;
                    self.connect_out(&gain)?;
                    source.start_with_when(t).ok();
                    source.stop_with_when(stop).ok();
                }
            }
            Some(())
        }

        fn start_loop(&mut self, spec: &LoopSpec, volume: f32) -> Option<LoopId> {
            let t = self.ctx.current_time();

            let gain = self.ctx.create_gain().ok()?;
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(spec.gain * volume, t + spec.fade_in)
                .ok();
            self.connect_out(&gain)?;

            let mut drones = Vec::with_capacity(2);
            for (waveform, hz) in spec.drones {
                let osc = self.ctx.create_oscillator().ok()?;
                osc.set_type(osc_type(waveform));
                osc.frequency().set_value_at_time(hz, t).ok();
                osc.frequency()
                    .linear_ramp_to_value_at_time(hz * spec.drift, t + spec.drift_secs)
                    .ok();
                osc.connect_with_audio_node(&gain).ok()?;
                drones.push(osc);
            }
            let [a, b]: [OscillatorNode; 2] = drones.try_into().ok()?;

            let noise = self.noise_source(true)?;
            let filter = self.ctx.create_biquad_filter().ok()?;
            filter.set_type(filter_type(spec.filter));
            filter.frequency().set_value(spec.noise_cutoff);
            filter.q().set_value(spec.noise_q);
            let noise_gain = self.ctx.create_gain().ok()?;
            noise_gain.gain().set_value(spec.noise_level);
            noise.connect_with_audio_node(&filter).ok()?;
            filter.connect_with_audio_node(&noise_gain).ok()?;
            noise_gain.connect_with_audio_node(&gain).ok()?;

            a.start().ok();
            b.start().ok();
            noise.start().ok();

            let id = LoopId(self.next_loop);
            self.next_loop += 1;
            self.loops.push(LiveLoop {
                id,
                drones: [a, b],
                noise,
                filter,
                gain,
            });
            log::debug!("Charge loop {:?} started", id);
            Some(id)
        }

        fn retarget_loop(&mut self, id: LoopId, target: &LoopTarget, volume: f32) -> Option<()> {
            let t = self.ctx.current_time();
            let live = self.loops.iter().find(|l| l.id == id)?;
            for (osc, hz) in live.drones.iter().zip(target.freqs) {
                let freq = osc.frequency();
                freq.cancel_scheduled_values(t).ok();
                freq.set_value_at_time(freq.value(), t).ok();
                freq.exponential_ramp_to_value_at_time(hz, t + target.ramp).ok();
            }
            let cutoff = live.filter.frequency();
            cutoff.cancel_scheduled_values(t).ok();
            cutoff.set_value_at_time(cutoff.value(), t).ok();
            cutoff
                .exponential_ramp_to_value_at_time(target.noise_cutoff, t + target.ramp)
                .ok();
            let gain = live.gain.gain();
            gain.cancel_scheduled_values(t).ok();
            gain.set_value_at_time(gain.value(), t).ok();
            gain.linear_ramp_to_value_at_time(target.gain * volume, t + target.ramp)
                .ok();
            Some(())
        }

        fn stop_loop(&mut self, id: LoopId, fade: f64) {
            let Some(index) = self.loops.iter().position(|l| l.id == id) else {
                return;
            };
            let live = self.loops.swap_remove(index);
            let t = self.ctx.current_time();

            let gain = live.gain.gain();
            gain.cancel_scheduled_values(t).ok();
            gain.set_value_at_time(gain.value(), t).ok();
            gain.linear_ramp_to_value_at_time(0.0, t + fade).ok();

            for osc in &live.drones {
                osc.stop_with_when(t + fade).ok();
            }
            live.noise.stop_with_when(t + fade).ok();
            log::debug!("Charge loop {:?} stopped", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::recipe::{CHARGE_BRIGHTEN, CHARGE_LOOP, SoundEvent, recipe};

    #[test]
    fn test_silent_backend_records_voices_with_delay() {
        let mut backend = SilentBackend::new();
        backend.clock = 2.0;
        for voice in recipe(SoundEvent::Win) {
            backend.play_voice(voice, backend.now(), 1.0);
        }
        let starts: Vec<f64> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                AudioOp::Voice { at, .. } => Some(*at),
                _ => None,
            })
            .collect();
        assert_eq!(starts.len(), recipe(SoundEvent::Win).len());
        assert_eq!(starts[0], 2.0);
        assert!(starts[3] > starts[0]);
    }

    #[test]
    fn test_loop_lifecycle() {
        let mut backend = SilentBackend::new();
        let id = backend.start_loop(&CHARGE_LOOP, 1.0).unwrap();
        assert_eq!(backend.live_loops(), &[id]);
        assert!(backend.retarget_loop(id, &CHARGE_BRIGHTEN, 1.0).is_some());

        backend.stop_loop(id, 0.025);
        assert!(backend.live_loops().is_empty());
        assert!(backend.retarget_loop(id, &CHARGE_BRIGHTEN, 1.0).is_none());

        // Stopping twice records nothing new
        let ops = backend.ops().len();
        backend.stop_loop(id, 0.025);
        assert_eq!(backend.ops().len(), ops);
    }

    #[test]
    fn test_broken_backend_degrades() {
        let mut backend = SilentBackend::broken();
        assert!(backend.start_loop(&CHARGE_LOOP, 1.0).is_none());
        assert!(backend.play_voice(&recipe(SoundEvent::Move)[0], 0.0, 1.0).is_none());
        assert_eq!(backend.voices_played(), 0);
    }
}

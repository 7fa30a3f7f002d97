/// Sound engine: procedural sound effects and a looping battle theme via rodio.
///
/// All sounds are generated as in-memory sample buffers at init time.
/// Cues are fire-and-forget (non-blocking) via rodio's Sink; the theme
/// keeps its own Sink so it can be stopped at match end and restarted
/// on a rematch.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::config::AudioConfig;
    use crate::sim::event::{AudioCue, AudioEvent, MusicCommand};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_run: Vec<f32>,
        sfx_attack: Vec<f32>,
        sfx_victory: Vec<f32>,
        sfx_defeat: Vec<f32>,
        theme: Vec<f32>,
        music_volume: f32,
        music: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new(cfg: &AudioConfig) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output; running silent");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_run: gen_step(),
                sfx_attack: gen_swing(),
                sfx_victory: gen_victory(),
                sfx_defeat: gen_defeat(),
                theme: gen_theme(),
                music_volume: cfg.music_volume,
                music: None,
            })
        }

        /// Play everything the last simulation step asked for.
        pub fn process(&mut self, events: &[AudioEvent]) {
            for ev in events {
                match *ev {
                    AudioEvent::Cue { cue, gain } => {
                        let buf = match cue {
                            AudioCue::Run => &self.sfx_run,
                            AudioCue::Attack => &self.sfx_attack,
                            AudioCue::Victory => &self.sfx_victory,
                            AudioCue::Defeat => &self.sfx_defeat,
                        };
                        self.play(buf, gain);
                    }
                    AudioEvent::Music(MusicCommand::Start) => self.start_music(),
                    AudioEvent::Music(MusicCommand::Stop) => self.stop_music(),
                }
            }
        }

        fn play(&self, buf: &[f32], gain: f32) {
            if gain <= 0.0 {
                return;
            }
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.set_volume(gain);
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, buf.to_vec()));
                sink.detach(); // fire-and-forget
            }
        }

        pub fn start_music(&mut self) {
            self.stop_music();
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.set_volume(self.music_volume);
                    sink.append(SamplesBuffer::new(1, SAMPLE_RATE, self.theme.clone()).repeat_infinite());
                    self.music = Some(sink);
                }
                Err(e) => tracing::warn!(error = %e, "could not start music"),
            }
        }

        pub fn stop_music(&mut self) {
            if let Some(sink) = self.music.take() {
                sink.stop();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Tiny LCG so the noise is the same every run.
    struct Noise(u32);

    impl Noise {
        fn sample(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
            (self.0 as f32 / u32::MAX as f32) * 2.0 - 1.0
        }
    }

    /// Footstep: dull low thump with a scuff of noise
    fn gen_step() -> Vec<f32> {
        let n = samples_for(0.06);
        let mut noise = Noise(777);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let thump = (ti * 90.0 * TAU).sin();
                let env = (1.0 - t).powi(3);
                (thump * 0.7 + noise.sample() * 0.3) * env * 0.5
            })
            .collect()
    }

    /// Sword swing: noise swept from bright to dark
    fn gen_swing() -> Vec<f32> {
        let n = samples_for(0.18);
        let mut noise = Noise(4242);
        let mut low = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                // One-pole low-pass whose cutoff closes over the sweep
                let k = 0.6 - t * 0.5;
                low += (noise.sample() - low) * k;
                let env = (t * 8.0).min(1.0) * (1.0 - t).powf(1.5);
                low * env * 0.6
            })
            .collect()
    }

    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Victory: rising major fanfare
    fn gen_victory() -> Vec<f32> {
        gen_notes(&[(523.0, 0.12), (659.0, 0.12), (784.0, 0.12), (1047.0, 0.4)], 0.35)
    }

    /// Defeat: slow falling minor line
    fn gen_defeat() -> Vec<f32> {
        gen_notes(&[(392.0, 0.2), (349.0, 0.2), (311.0, 0.2), (262.0, 0.5)], 0.35)
    }

    /// Battle theme: one bar of driving bass under a minor arpeggio.
    /// The loop point lands on a zero crossing of the envelope.
    fn gen_theme() -> Vec<f32> {
        let bass = [110.0_f32, 110.0, 131.0, 98.0];
        let lead = [440.0_f32, 523.0, 659.0, 523.0, 440.0, 523.0, 587.0, 494.0];
        let beat = 0.25;
        let mut samples = Vec::new();
        for (b, &root) in bass.iter().enumerate() {
            let n = samples_for(beat);
            for i in 0..n {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let half = if i < n / 2 { 0 } else { 1 };
                let note = lead[(b * 2 + half) % lead.len()];
                let env_b = 1.0 - i as f32 / n as f32;
                let local = (i % (n / 2)) as f32 / (n / 2) as f32;
                let env_l = (1.0 - local).powf(0.7);
                let square = if (ti * root * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                let s = square * env_b * 0.25 + (ti * note * TAU).sin() * env_l * 0.35;
                samples.push(s * 0.6);
            }
        }
        samples
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_cfg: &crate::config::AudioConfig) -> Option<Self> { Some(SoundEngine) }
    pub fn process(&mut self, _events: &[crate::sim::event::AudioEvent]) {}
    pub fn start_music(&mut self) {}
    pub fn stop_music(&mut self) {}
}

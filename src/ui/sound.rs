/// Sound engine: procedural sound cues via rodio.
///
/// All cues are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_click: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_crush: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_click: Arc::new(make_wav(&gen_click())),
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_land: Arc::new(make_wav(&gen_land())),
                sfx_crush: Arc::new(make_wav(&gen_crush())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                sfx_over: Arc::new(make_wav(&gen_over())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_click(&self) { self.play(&self.sfx_click); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_land(&self) { self.play(&self.sfx_land); }
        pub fn play_crush(&self) { self.play(&self.sfx_crush); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_over(&self) { self.play(&self.sfx_over); }
    }

    // ── Waveform generators — Vec<f32> mono samples ──

    fn tone(freq_at: impl Fn(f32) -> f32, duration: f32, volume: impl Fn(f32) -> f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += freq_at(t) * TAU / SAMPLE_RATE as f32;
                phase.sin() * volume(t)
            })
            .collect()
    }

    /// UI click: very short high blip.
    fn gen_click() -> Vec<f32> {
        tone(|_| 1150.0, 0.025, |t| (1.0 - t) * 0.18)
    }

    /// Jump: quick upward sweep.
    fn gen_jump() -> Vec<f32> {
        tone(|t| 280.0 + t * 420.0, 0.12, |t| (1.0 - t).powf(0.7) * 0.22)
    }

    /// Landing thump: low tone with a dash of noise.
    fn gen_land() -> Vec<f32> {
        let body = tone(|t| 110.0 - t * 40.0, 0.07, |t| (1.0 - t) * 0.28);
        let mut rng: u32 = 0x2545_f491;
        body.into_iter()
            .enumerate()
            .map(|(i, s)| {
                rng = rng.wrapping_mul(747796405).wrapping_add(2891336453);
                let noise = (rng >> 16) as f32 / u16::MAX as f32 - 0.5;
                let t = i as f32;
                s + noise * 0.08 * (1.0 - t / 1500.0).max(0.0)
            })
            .collect()
    }

    /// Boulder crush: heavy descending rumble.
    fn gen_crush() -> Vec<f32> {
        let body = tone(|t| 160.0 - t * 90.0, 0.25, |t| (1.0 - t).powf(0.5) * 0.3);
        let mut rng: u32 = 0x9e37_79b9;
        body.into_iter()
            .map(|s| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng >> 16) as f32 / u16::MAX as f32 - 0.5;
                s * 0.5 + noise * 0.45
            })
            .collect()
    }

    /// Level clear: rising triad with a held top note.
    fn gen_clear() -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in &[(587.0_f32, 0.09_f32), (740.0, 0.09), (880.0, 0.22)] {
            samples.extend(tone(move |_| freq, dur, |t| (1.0 - t * 0.8) * 0.26));
        }
        samples
    }

    /// Game over: slow minor descent.
    fn gen_over() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[392.0_f32, 349.0, 311.0, 262.0] {
            samples.extend(tone(move |_| freq, 0.16, |t| (1.0 - t * 0.4) * 0.26));
        }
        samples
    }

    // ── WAV encoder ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32; // 16-bit mono
        let mut buf = Vec::with_capacity(44 + data_len as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ── Public API — compiles to no-ops when the sound feature is off ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_click(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_land(&self) {}
    pub fn play_crush(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_over(&self) {}
}

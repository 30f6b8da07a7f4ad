/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is synthesized once at init into an in-memory WAV buffer
/// and played fire-and-forget through a detached Sink.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

/// One sound effect per kind of game event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Jump,
    Stomp,
    Shot,
    Die,
    Clear,
    Complete,
}

impl Sfx {
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Jumped => Some(Sfx::Jump),
            GameEvent::EnemyStomped { .. } => Some(Sfx::Stomp),
            GameEvent::ShotFired { .. } => Some(Sfx::Shot),
            GameEvent::PlayerKilled { .. } | GameEvent::PlayerFell => Some(Sfx::Die),
            GameEvent::StageCleared { .. } => Some(Sfx::Clear),
            GameEvent::GameCompleted => Some(Sfx::Complete),
            GameEvent::Restarted => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: [Arc<Vec<u8>>; 6],
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = [
                gen_jump(),
                gen_stomp(),
                gen_shot(),
                gen_die(),
                gen_clear(),
                gen_complete(),
            ]
            .map(|samples| Arc::new(make_wav(&samples)));
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = &self.buffers[sfx as usize];
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn square(t: f32, freq: f32) -> f32 {
        if (t * freq).fract() < 0.5 { 1.0 } else { -1.0 }
    }

    /// Frequency sweep with linear fade, `from` → `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                phase += (from + (to - from) * k) / SAMPLE_RATE as f32;
                let wave = if phase.fract() < 0.5 { 1.0 } else { -1.0 };
                wave * (1.0 - k) * volume
            })
            .collect()
    }

    /// Notes played back to back, square wave with a per-note decay.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        notes
            .iter()
            .flat_map(|&freq| {
                (0..n).map(move |i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let env = 1.0 - (i as f32 / n as f32) * 0.5;
                    square(t, freq) * env * volume
                })
            })
            .collect()
    }

    /// Jump: quick rising chirp
    fn gen_jump() -> Vec<f32> {
        sweep(300.0, 900.0, 0.1, 0.15)
    }

    /// Stomp: low thud plus a short noise burst
    fn gen_stomp() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.09) as usize;
        let mut rng: u32 = 0x9e37_79b9;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng >> 16) as f32 / 32_768.0 - 1.0;
                let thud = (t * (160.0 - 80.0 * k) * TAU).sin();
                (thud * 0.6 + noise * 0.4) * (1.0 - k).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Shot: short falling zap
    fn gen_shot() -> Vec<f32> {
        sweep(1400.0, 500.0, 0.06, 0.1)
    }

    /// Death: descending minor line
    fn gen_die() -> Vec<f32> {
        arpeggio(&[494.0, 440.0, 392.0, 330.0, 262.0], 0.09, 0.18)
    }

    /// Stage clear: ascending major arpeggio
    fn gen_clear() -> Vec<f32> {
        arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.08, 0.18)
    }

    /// All stages: clear arpeggio with a held top note
    fn gen_complete() -> Vec<f32> {
        let mut samples = arpeggio(&[523.0, 659.0, 784.0, 1047.0, 1319.0], 0.1, 0.18);
        let n = (SAMPLE_RATE as f32 * 0.4) as usize;
        samples.extend((0..n).map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            square(t, 1568.0) * (1.0 - i as f32 / n as f32) * 0.18
        }));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    /// Play whatever effects this frame's events call for.
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in events.iter().filter_map(Sfx::for_event) {
            self.play(sfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityKind;

    #[test]
    fn events_map_to_effects() {
        assert_eq!(Sfx::for_event(&GameEvent::Jumped), Some(Sfx::Jump));
        assert_eq!(Sfx::for_event(&GameEvent::PlayerFell), Some(Sfx::Die));
        assert_eq!(
            Sfx::for_event(&GameEvent::PlayerKilled { by: EntityKind::Bullet }),
            Some(Sfx::Die),
        );
        assert_eq!(Sfx::for_event(&GameEvent::StageCleared { stage: 2 }), Some(Sfx::Clear));
        assert_eq!(Sfx::for_event(&GameEvent::Restarted), None);
    }
}

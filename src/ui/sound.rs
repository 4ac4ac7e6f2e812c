/// Sound engine: named audio cues synthesized via rodio.
///
/// Cue names follow the room data: `hchord_<note>` is a short chord,
/// `l_hchord_<note>` a long one, `fx_click` a click. Buffers are generated
/// as in-memory WAV on first use and cached. Playback is fire-and-forget
/// (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

/// How a cue should sound.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Tone {
    /// Root, fifth and octave over `freq`.
    Chord { freq: f32, duration: f32 },
    Click,
}

/// Resolve a cue name. Unknown names yield `None`.
pub fn cue_tone(cue: &str) -> Option<Tone> {
    if cue == "fx_click" {
        return Some(Tone::Click);
    }
    let (note, duration) = match cue.strip_prefix("l_hchord_") {
        Some(note) => (note, 0.9),
        None => (cue.strip_prefix("hchord_")?, 0.35),
    };
    Some(Tone::Chord { freq: note_freq(note)?, duration })
}

/// Equal-tempered frequency of a note like `a4`, `db4` or `f#3`.
pub fn note_freq(note: &str) -> Option<f32> {
    let mut chars = note.chars();
    let base = match chars.next()?.to_ascii_lowercase() {
        'c' => 0, 'd' => 2, 'e' => 4, 'f' => 5, 'g' => 7, 'a' => 9, 'b' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (shift, octave) = match rest.chars().next()? {
        'b' => (-1, &rest[1..]),
        '#' => (1, &rest[1..]),
        _ => (0, rest),
    };
    let octave: i32 = octave.parse().ok()?;
    let midi = (octave + 1) * 12 + base + shift;
    Some(440.0 * 2f32.powf((midi - 69) as f32 / 12.0))
}

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{cue_tone, Tone};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cache: RefCell<HashMap<String, Arc<Vec<u8>>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                cache: RefCell::new(HashMap::new()),
            })
        }

        /// Play a named cue. Unknown cues are logged and skipped.
        pub fn play(&self, cue: &str) {
            let Some(buf) = self.buffer(cue) else {
                tracing::warn!(cue, "unknown_sound_cue");
                return;
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        fn buffer(&self, cue: &str) -> Option<Arc<Vec<u8>>> {
            if let Some(buf) = self.cache.borrow().get(cue) {
                return Some(buf.clone());
            }
            let samples = match cue_tone(cue)? {
                Tone::Chord { freq, duration } => gen_chord(freq, duration),
                Tone::Click => gen_click(),
            };
            let buf = Arc::new(make_wav(&samples));
            self.cache.borrow_mut().insert(cue.to_string(), buf.clone());
            Some(buf)
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Plucked chord: root, fifth, octave with a soft attack and long decay
    fn gen_chord(freq: f32, duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let partials = [(1.0_f32, 0.5_f32), (1.5, 0.3), (2.0, 0.2)];
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let attack = (i as f32 / 200.0).min(1.0);
                let env = attack * (1.0 - i as f32 / n as f32).powf(1.5);
                let wave: f32 = partials.iter()
                    .map(|&(mult, amp)| (t * freq * mult * 2.0 * std::f32::consts::PI).sin() * amp)
                    .sum();
                wave * env * 0.35
            })
            .collect()
    }

    /// Click: very short noise tick
    fn gen_click() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.02) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = 1.0 - i as f32 / n as f32;
                noise * env * env * 0.4
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let buf = make_wav(&[0.0; 10]);
            assert_eq!(buf.len(), 44 + 20);
            assert_eq!(&buf[0..4], b"RIFF");
            assert_eq!(u32::from_le_bytes([buf[40], buf[41], buf[42], buf[43]]), 20);
        }

        #[test]
        fn long_chord_is_longer() {
            assert!(gen_chord(440.0, 0.9).len() > gen_chord(440.0, 0.35).len());
        }
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
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn note_frequencies() {
        assert!(close(note_freq("a4").unwrap(), 440.0));
        assert!(close(note_freq("d4").unwrap(), 293.66));
        assert!(close(note_freq("db4").unwrap(), 277.18));
        assert!(close(note_freq("c#4").unwrap(), 277.18));
        assert!(close(note_freq("e4").unwrap(), 329.63));
        assert!(close(note_freq("f4").unwrap(), 349.23));
    }

    #[test]
    fn bad_notes_rejected() {
        assert_eq!(note_freq(""), None);
        assert_eq!(note_freq("h4"), None);
        assert_eq!(note_freq("a"), None);
        assert_eq!(note_freq("ax"), None);
    }

    #[test]
    fn cue_names() {
        assert_eq!(cue_tone("fx_click"), Some(Tone::Click));
        match cue_tone("l_hchord_a4") {
            Some(Tone::Chord { freq, duration }) => {
                assert!(close(freq, 440.0));
                assert_eq!(duration, 0.9);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(cue_tone("hchord_e4"), Some(Tone::Chord { duration, .. }) if duration == 0.35));
        assert_eq!(cue_tone("fx_boom"), None);
        assert_eq!(cue_tone("hchord_"), None);
    }

    #[test]
    fn every_catalog_cue_resolves() {
        for note in crate::sim::rooms::MUSIC_MELODY.notes.iter().filter(|n| !n.is_empty()) {
            assert!(cue_tone(note).is_some(), "{note}");
        }
        assert!(cue_tone(crate::sim::rooms::MUSIC_MELODY.trigger_cue).is_some());
    }
}

//! Music playback and sound effect mixing.
//!
//! The [`Mixer`] is shared between the game loop and the real-time audio
//! callback. Everything the callback touches (the effect pool, the looping
//! track and the music stream cursor) sits behind a single mutex. The
//! callback holds it for one block; every mutation from the game loop is a
//! short lock, mutate, unlock sequence that never blocks on anything else.

mod bank;
mod sample;
mod stream;
mod track;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub use bank::SoundBank;
pub use sample::Sample;
pub use stream::{StreamReader, WavStream};
pub use track::Track;

use crate::{AudioConfig, BeatlineError, Result};

/// The engine works in interleaved stereo.
pub const CHANNELS: usize = 2;

struct MixerState {
    music: Option<Box<dyn StreamReader>>,
    effects: Vec<Track>,
    looping: Track,
    paused: bool,
}

impl MixerState {
    /// Pick a track for a new effect: the first idle one, else the one with
    /// the biggest cursor since it is the most likely to end soon.
    fn select_track(&self) -> usize {
        let mut best = 0;
        let mut max_cursor = 0;
        for (index, track) in self.effects.iter().enumerate() {
            if !track.is_active() {
                return index;
            }
            if track.cursor() > max_cursor {
                max_cursor = track.cursor();
                best = index;
            }
        }
        best
    }

    fn stop_all(&mut self) {
        self.looping.stop();
        for track in &mut self.effects {
            track.stop();
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        if self.paused {
            out.fill(0.0);
            return;
        }

        let frames = out.len() / CHANNELS;
        let read = match self.music.as_mut() {
            Some(music) => music.read(&mut out[..frames * CHANNELS]).min(frames),
            None => 0,
        };
        // never replay whatever the device left in the buffer
        out[read * CHANNELS..].fill(0.0);

        for track in &mut self.effects {
            track.mix(out);
        }
        self.looping.mix(out);

        clip(out);
    }
}

/// Clamps every sample to [-1, 1]. Summing effects easily overshoots, and
/// some devices turn that into loud noise.
pub fn clip(samples: &mut [f32]) {
    for sample in samples {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

/// Cheap, cloneable handle on the shared mixer state.
#[derive(Clone)]
pub struct Mixer {
    shared: Arc<Mutex<MixerState>>,
    sample_rate: u32,
    block_size: usize,
}

impl Mixer {
    /// Creates a mixer without music, mostly useful for effect-only output.
    pub fn new(config: &AudioConfig, sample_rate: u32) -> Self {
        let state = MixerState {
            music: None,
            effects: vec![Track::default(); config.effect_tracks.max(1)],
            looping: Track::default(),
            paused: true,
        };
        Self {
            shared: Arc::new(Mutex::new(state)),
            sample_rate,
            block_size: config.block_size,
        }
    }

    /// Creates a mixer playing `music`. Output starts paused.
    pub fn with_music(config: &AudioConfig, music: Box<dyn StreamReader>) -> Self {
        let mixer = Self::new(config, music.sample_rate());
        if let Ok(mut state) = mixer.shared.lock() {
            state.music = Some(music);
        }
        mixer
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames per output callback the device should be configured for.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Audio callback body: fills `out` (interleaved stereo) with the next
    /// block of music and effects.
    pub fn render(&self, out: &mut [f32]) {
        match self.shared.lock() {
            Ok(mut state) => state.render(out),
            Err(_) => out.fill(0.0),
        }
    }

    /// Resumes output.
    pub fn play(&self) -> Result<()> {
        self.lock()?.paused = false;
        Ok(())
    }

    /// Stops output. Music and effects keep their positions.
    pub fn pause(&self) -> Result<()> {
        self.lock()?.paused = true;
        Ok(())
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.lock()?.paused)
    }

    /// Timestamp of the music stream, or 0 when there is none.
    pub fn music_timestamp(&self) -> Result<f64> {
        let state = self.lock()?;
        Ok(state.music.as_ref().map_or(0.0, |music| music.current_timestamp()))
    }

    pub fn music_duration(&self) -> Result<f64> {
        let state = self.lock()?;
        Ok(state.music.as_ref().map_or(0.0, |music| music.duration()))
    }

    /// Moves the music to `target` seconds and silences every effect, since
    /// their positions mean nothing after a jump. Returns the timestamp the
    /// stream landed on. On error nothing is modified.
    pub fn seek_music(&self, target: f64) -> Result<f64> {
        let mut state = self.lock()?;
        let music = state.music.as_mut().ok_or_else(|| BeatlineError::Seek {
            target,
            reason: "no music stream attached".to_string(),
        })?;
        music.seek(target)?;
        let landed = music.current_timestamp();
        state.stop_all();
        tracing::debug!(target, landed, "seeked music stream");
        Ok(landed)
    }

    /// Plays `sample` once on an effect track, stealing one if they are all
    /// busy.
    pub fn play_effect(&self, sample: &Arc<Sample>, volume: f32) -> Result<()> {
        let mut state = self.lock()?;
        let index = state.select_track();
        if state.effects[index].is_active() {
            tracing::debug!(track = index, "all the effect tracks are taken, stealing one");
        }
        state.effects[index].start(Arc::clone(sample), volume, false);
        Ok(())
    }

    /// Plays `sample` in a loop on the dedicated looping track, replacing
    /// whatever it was playing.
    pub fn play_loop(&self, sample: &Arc<Sample>, volume: f32) -> Result<()> {
        self.lock()?.looping.start(Arc::clone(sample), volume, true);
        Ok(())
    }

    pub fn stop_loop(&self) -> Result<()> {
        self.lock()?.looping.stop();
        Ok(())
    }

    /// Cursor of every effect track, `None` for idle ones.
    pub fn effect_cursors(&self) -> Result<Vec<Option<usize>>> {
        let state = self.lock()?;
        Ok(state
            .effects
            .iter()
            .map(|track| track.is_active().then(|| track.cursor()))
            .collect())
    }

    pub fn is_looping(&self) -> Result<bool> {
        Ok(self.lock()?.looping.is_active())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MixerState>> {
        self.shared
            .lock()
            .map_err(|_| BeatlineError::Poisoned("mixer state"))
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .finish()
    }
}

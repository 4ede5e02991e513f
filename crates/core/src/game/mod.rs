//! Session state and the coordination between clock, timeline and mixer.

mod mode;
mod pacing;
mod session;

use bitflags::bitflags;

pub use mode::GameMode;
pub use pacing::FramePacer;
pub use session::{EventSource, InputEvent, Session, StopHandle, UNPAUSE_REWIND};

use crate::clock::format_time;
use crate::{Difficulty, GameClock, HitObject, Mixer, Result, SoundBank, Timeline};

bitflags! {
    /// Session flags. During play exactly one of `PLAYING`/`PAUSED` and one of
    /// `AUTOPLAY`/`USERPLAY` are set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GameState: u8 {
        const PLAYING = 0b00_0001;
        const PAUSED = 0b00_0010;
        const AUTOPLAY = 0b00_0100;
        const USERPLAY = 0b00_1000;
        /// The main loop exits at the end of the current iteration.
        const STOPPING = 0b01_0000;
        /// Every object was played. Terminal.
        const FINISHED = 0b10_0000;
    }
}

impl GameState {
    pub fn is_paused(self) -> bool {
        self.contains(Self::PAUSED)
    }

    pub fn is_autoplay(self) -> bool {
        self.contains(Self::AUTOPLAY)
    }

    pub fn is_finished(self) -> bool {
        self.contains(Self::FINISHED)
    }

    pub fn is_stopping(self) -> bool {
        self.contains(Self::STOPPING)
    }
}

/// Everything a game mode may look at or modify. Owned by the [`Session`]
/// and lent to the mode on every call.
#[derive(Debug)]
pub struct GameContext {
    pub clock: GameClock,
    pub timeline: Timeline,
    pub mixer: Mixer,
    pub difficulty: Difficulty,
    pub sounds: SoundBank,
    state: GameState,
    audio_started: bool,
}

impl GameContext {
    /// Prepares a session starting at wall time `wall`.
    pub fn new(
        timeline: Timeline,
        mixer: Mixer,
        difficulty: Difficulty,
        sounds: SoundBank,
        autoplay: bool,
        wall: f64,
    ) -> Self {
        let clock = GameClock::initial(&difficulty, Some(timeline.first_time()), wall);
        let player = if autoplay {
            GameState::AUTOPLAY
        } else {
            GameState::USERPLAY
        };

        Self {
            clock,
            timeline,
            mixer,
            difficulty,
            sounds,
            state: GameState::PLAYING | player,
            audio_started: false,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn now(&self) -> f64 {
        self.clock.now
    }

    /// True once the music output has been started at least once.
    pub fn audio_started(&self) -> bool {
        self.audio_started
    }

    /// Plays the hit sound for `hit`, if the bank has one.
    pub fn play_hit_sound(&self, hit: &HitObject) -> Result<()> {
        match &self.sounds.hit {
            Some(sample) => self.mixer.play_effect(sample, hit.volume * self.sounds.volume),
            None => Ok(()),
        }
    }

    /// Starts the looping slide sound for a held object.
    pub fn start_slide(&self, hit: &HitObject) -> Result<()> {
        match &self.sounds.slide {
            Some(sample) => self.mixer.play_loop(sample, hit.volume * self.sounds.volume),
            None => Ok(()),
        }
    }

    pub fn stop_slide(&self) -> Result<()> {
        self.mixer.stop_loop()
    }

    pub(crate) fn set_state(&mut self, set: GameState, clear: GameState) {
        self.state.remove(clear);
        self.state.insert(set);
    }

    pub(crate) fn resume_audio(&mut self) -> Result<()> {
        self.mixer.play()?;
        self.audio_started = true;
        Ok(())
    }

    /// Emits the status line.
    pub(crate) fn log_status(&self) {
        let duration = self.mixer.music_duration().unwrap_or(0.0);
        tracing::info!(
            state = if self.state.is_paused() { "Paused" } else { "Playing" },
            position = %format_time(self.clock.now),
            duration = %format_time(duration),
            "status"
        );
    }
}

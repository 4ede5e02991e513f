//! Core library of the Beatline rhythm game engine.
//!
//! The crate keeps three independently clocked subsystems consistent: the
//! decoded music, the wall-clock frame loop and the hit-object timeline.
//! [`GameClock`] reconciles time once per frame, [`Timeline`] tracks which
//! objects remain to be judged, [`Mixer`] feeds the real-time audio callback
//! and [`Session`] coordinates them under pause and seek. Rulesets plug in
//! through [`GameMode`].

pub mod audio;
pub mod clock;
pub mod config;
pub mod controls;
pub mod error;
pub mod game;
pub mod modes;
pub mod score;
pub mod timeline;

pub use audio::{Mixer, Sample, SoundBank, StreamReader, Track, WavStream};
pub use clock::GameClock;
pub use config::{AppConfig, AudioConfig, Difficulty, GameConfig, SoundConfig};
pub use controls::{translate_char, translate_key, Finger, Key};
pub use error::{BeatlineError, Result};
pub use game::{
    EventSource, FramePacer, GameContext, GameMode, GameState, InputEvent, Session, StopHandle,
};
pub use modes::TapMode;
pub use score::ScoreSummary;
pub use timeline::{
    HitIndex, HitKind, HitObject, HitObjectSpec, HitState, Timeline, TimelineDocument, SEEK_GUARD,
};

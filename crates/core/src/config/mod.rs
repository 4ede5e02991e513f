use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub game: GameConfig,
    pub difficulty: Difficulty,
    pub sounds: SoundConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Fields missing from the document keep
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::debug!(?path, "loaded configuration");
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Frames requested per output callback. Kept a power of two.
    pub block_size: usize,
    /// Number of effect slots in the mixer pool.
    pub effect_tracks: usize,
    /// Decoder packet size, in frames. The music timestamp only moves when a
    /// new packet starts.
    pub packet_frames: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,
            effect_tracks: 16,
            packet_frames: 1152,
        }
    }
}

/// Main loop and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub frame_rate: u32,
    /// Seconds jumped back by the rewind key.
    pub rewind_step: f64,
    /// Seconds jumped ahead by the forward key.
    pub forward_step: f64,
    pub autoplay: bool,
    /// Overrun count after which the frame pacer complains once.
    pub overrun_warning_frames: u32,
    /// Leave the main loop once every object was played.
    pub exit_on_finish: bool,
}

impl GameConfig {
    /// Wall-clock budget of a single frame, in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            rewind_step: 10.0,
            forward_step: 20.0,
            autoplay: false,
            overrun_warning_frames: 1000,
            exit_on_finish: true,
        }
    }
}

/// Timing tolerances shared by the session and the game modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Difficulty {
    /// Half-width of the window, in seconds, in which a press is judged good.
    pub leniency: f64,
    /// How long before its time an object becomes visible and clickable.
    pub approach_time: f64,
    /// Silence before the music starts, in seconds.
    pub audio_lead_in: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            leniency: 0.1,
            approach_time: 0.8,
            audio_lead_in: 0.0,
        }
    }
}

/// Hit sound assets. Absent paths simply mean silent judgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub hit: Option<PathBuf>,
    pub slide: Option<PathBuf>,
    pub volume: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            hit: None,
            slide: None,
            volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "game": { "autoplay": true }, "difficulty": { "leniency": 0.05 } }"#)
                .unwrap();

        assert!(config.game.autoplay);
        assert_eq!(config.game.frame_rate, 60);
        assert_eq!(config.difficulty.leniency, 0.05);
        assert_eq!(config.difficulty.approach_time, 0.8);
        assert_eq!(config.audio.block_size, 2048);
        assert!(config.audio.block_size.is_power_of_two());
    }

    #[test]
    fn frame_duration_never_divides_by_zero() {
        let game = GameConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert_eq!(game.frame_duration(), 1.0);
        assert!((GameConfig::default().frame_duration() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, crate::BeatlineError::Io(_)));
        assert!(AppConfig::load_or_default(None).is_ok());
    }
}

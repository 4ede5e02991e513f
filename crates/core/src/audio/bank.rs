use std::sync::Arc;

use crate::audio::Sample;
use crate::{Result, SoundConfig};

/// Hit sounds available to the game modes.
#[derive(Debug, Clone)]
pub struct SoundBank {
    /// Played on every successful judgement.
    pub hit: Option<Arc<Sample>>,
    /// Looped while an object is held.
    pub slide: Option<Arc<Sample>>,
    /// Master volume applied on top of each object's own volume.
    pub volume: f32,
}

impl SoundBank {
    /// A bank with no sounds at all.
    pub fn silent() -> Self {
        Self {
            hit: None,
            slide: None,
            volume: 1.0,
        }
    }

    /// Loads the configured samples, converted for a device running at
    /// `device_rate`.
    pub fn load(config: &SoundConfig, device_rate: u32) -> Result<Self> {
        let load = |path: &Option<std::path::PathBuf>| -> Result<Option<Arc<Sample>>> {
            path.as_ref()
                .map(|path| Sample::load_wav(path, device_rate).map(Arc::new))
                .transpose()
        };

        Ok(Self {
            hit: load(&config.hit)?,
            slide: load(&config.slide)?,
            volume: config.volume.clamp(0.0, 1.0),
        })
    }
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample::tests::write_wav;

    #[test]
    fn loads_only_configured_sounds() {
        let path = write_wav("bank-hit", 1, 100, &[1000, 2000, 3000]);
        let config = SoundConfig {
            hit: Some(path.clone()),
            slide: None,
            volume: 3.0,
        };
        let bank = SoundBank::load(&config, 200).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bank.hit.as_ref().map(|sample| sample.frames()), Some(6));
        assert!(bank.slide.is_none());
        assert_eq!(bank.volume, 1.0);
    }

    #[test]
    fn missing_files_fail_the_load() {
        let config = SoundConfig {
            hit: Some("/nowhere/hit.wav".into()),
            ..Default::default()
        };
        assert!(SoundBank::load(&config, 44_100).is_err());
    }
}

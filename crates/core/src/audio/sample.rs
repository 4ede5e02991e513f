use std::path::Path;

use crate::audio::CHANNELS;
use crate::{BeatlineError, Result};

/// Decoded sound effect, stored as interleaved stereo `f32` at the device
/// rate. Shared between the sound bank and the mixer tracks through `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    data: Vec<f32>,
}

impl Sample {
    /// Wraps interleaved PCM with `channels` channels, converting it to
    /// stereo.
    pub fn from_interleaved(data: &[f32], channels: usize) -> Result<Self> {
        Ok(Self {
            data: to_stereo(data, channels)?,
        })
    }

    /// Loads a WAV file and converts it for a device running at
    /// `device_rate`.
    pub fn load_wav(path: impl AsRef<Path>, device_rate: u32) -> Result<Self> {
        let path = path.as_ref();
        let (data, rate) = decode_wav(path)?;
        let data = resample(&data, rate, device_rate);
        tracing::debug!(?path, rate, device_rate, frames = data.len() / CHANNELS, "loaded sample");
        Ok(Self { data })
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.data.len() / CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Reads a whole WAV file into interleaved stereo `f32` samples. Returns the
/// samples and their rate.
pub(crate) fn decode_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let bits = u32::from(spec.bits_per_sample.clamp(1, 32));
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok((to_stereo(&raw, usize::from(spec.channels))?, spec.sample_rate))
}

/// Duplicates mono, keeps the first two channels of anything wider.
pub(crate) fn to_stereo(data: &[f32], channels: usize) -> Result<Vec<f32>> {
    match channels {
        0 => Err(BeatlineError::InvalidInput("audio data must have at least one channel")),
        1 => Ok(data.iter().flat_map(|&value| [value, value]).collect()),
        2 => Ok(data.to_vec()),
        _ => Ok(data
            .chunks_exact(channels)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect()),
    }
}

/// Linear interpolation between stereo frames.
pub(crate) fn resample(data: &[f32], from: u32, to: u32) -> Vec<f32> {
    let frames = data.len() / CHANNELS;
    if from == to || from == 0 || to == 0 || frames == 0 {
        return data.to_vec();
    }

    let ratio = f64::from(from) / f64::from(to);
    let out_frames = ((frames as f64) / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_frames * CHANNELS);

    for frame in 0..out_frames {
        let position = frame as f64 * ratio;
        let index = (position.floor() as usize).min(frames - 1);
        let next = (index + 1).min(frames - 1);
        let fraction = (position - index as f64) as f32;
        for channel in 0..CHANNELS {
            let a = data[index * CHANNELS + channel];
            let b = data[next * CHANNELS + channel];
            out.push(a + (b - a) * fraction);
        }
    }

    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a 16-bit WAV file into the temp directory and returns its path.
    pub(crate) fn write_wav(name: &str, channels: u16, rate: u32, samples: &[i16]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("beatline-{}-{name}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in samples {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn mono_is_duplicated_and_wide_is_truncated() {
        assert_eq!(to_stereo(&[0.1, 0.2], 1).unwrap(), vec![0.1, 0.1, 0.2, 0.2]);
        assert_eq!(
            to_stereo(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3).unwrap(),
            vec![0.1, 0.2, 0.4, 0.5]
        );
        assert!(to_stereo(&[0.1], 0).is_err());
    }

    #[test]
    fn resampling_scales_the_length() {
        let data: Vec<f32> = (0..200).map(|i| (i / 2) as f32).collect();
        let doubled = resample(&data, 100, 200);
        assert_eq!(doubled.len(), 400);
        // interpolated halfway between frame 0 and 1
        assert!((doubled[2] - 0.5).abs() < 1e-6);
        assert_eq!(resample(&data, 100, 100), data);
    }

    #[test]
    fn loads_integer_wav_files() {
        let path = write_wav("sample-mono", 1, 8_000, &[i16::MAX, 0, i16::MIN, 0]);
        let sample = Sample::load_wav(&path, 8_000).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(sample.frames(), 4);
        assert!((sample.data()[0] - 1.0).abs() < 1e-3);
        assert_eq!(sample.data()[0], sample.data()[1]);
        assert_eq!(sample.data()[4], -1.0);
    }
}

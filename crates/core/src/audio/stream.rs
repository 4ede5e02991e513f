use std::fmt;
use std::path::Path;

use crate::audio::sample::decode_wav;
use crate::audio::CHANNELS;
use crate::{BeatlineError, Result};

/// Source of decoded music, consumed by the mixer from the audio callback.
///
/// Output is always interleaved stereo `f32`. Opening is done by each
/// implementation's constructor and closing by `Drop`.
pub trait StreamReader: Send {
    fn sample_rate(&self) -> u32;

    /// Total length in seconds.
    fn duration(&self) -> f64;

    /// Fills `out` with up to `out.len() / 2` frames and returns how many
    /// were written. Fewer frames than requested means the stream ran dry.
    fn read(&mut self, out: &mut [f32]) -> usize;

    /// Timestamp, in seconds, of the last decoded packet.
    fn current_timestamp(&self) -> f64;

    /// Moves the read position. On error the position is unchanged.
    fn seek(&mut self, seconds: f64) -> Result<()>;
}

/// Fully decoded WAV track, served packet by packet.
///
/// Like a real codec, the reported timestamp only moves when a new packet
/// starts, so consecutive game frames may observe the same timestamp.
pub struct WavStream {
    data: Vec<f32>,
    sample_rate: u32,
    position: usize,
    packet_frames: usize,
    packet_end: usize,
    timestamp: f64,
}

impl WavStream {
    /// Decodes the WAV file at `path`.
    pub fn open(path: impl AsRef<Path>, packet_frames: usize) -> Result<Self> {
        let path = path.as_ref();
        let (data, sample_rate) = decode_wav(path)?;
        let stream = Self::from_interleaved(data, sample_rate, packet_frames)?;
        tracing::info!(
            ?path,
            sample_rate,
            duration = format!("{:.1}s", stream.duration()),
            "opened music stream"
        );
        Ok(stream)
    }

    /// Serves already decoded interleaved stereo samples.
    pub fn from_interleaved(data: Vec<f32>, sample_rate: u32, packet_frames: usize) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatlineError::InvalidInput("stream sample rate must be positive"));
        }
        Ok(Self {
            data,
            sample_rate,
            position: 0,
            packet_frames: packet_frames.max(1),
            packet_end: 0,
            timestamp: 0.0,
        })
    }

    fn total_frames(&self) -> usize {
        self.data.len() / CHANNELS
    }

    /// Current read position, in frames.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_frames()
    }
}

impl StreamReader for WavStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn duration(&self) -> f64 {
        self.total_frames() as f64 / f64::from(self.sample_rate)
    }

    fn read(&mut self, out: &mut [f32]) -> usize {
        let wanted = out.len() / CHANNELS;
        let total = self.total_frames();
        let mut done = 0;

        while done < wanted && self.position < total {
            if self.position >= self.packet_end {
                self.timestamp = self.position as f64 / f64::from(self.sample_rate);
                self.packet_end = self.position + self.packet_frames;
            }
            let count = (self.packet_end.min(total) - self.position).min(wanted - done);
            let from = self.position * CHANNELS;
            out[done * CHANNELS..(done + count) * CHANNELS]
                .copy_from_slice(&self.data[from..from + count * CHANNELS]);
            self.position += count;
            done += count;
        }

        done
    }

    fn current_timestamp(&self) -> f64 {
        self.timestamp
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(BeatlineError::Seek {
                target: seconds,
                reason: "target is not a finite time".to_string(),
            });
        }

        let frame = (seconds.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        self.position = frame.min(self.total_frames());
        self.packet_end = self.position;
        self.timestamp = self.position as f64 / f64::from(self.sample_rate);
        Ok(())
    }
}

impl fmt::Debug for WavStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavStream")
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.total_frames())
            .field("position", &self.position)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

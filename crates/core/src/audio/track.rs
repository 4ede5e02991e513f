use std::sync::Arc;

use crate::audio::{Sample, CHANNELS};

/// One playback slot of the mixer.
///
/// A track without a sample is idle. Non-looping tracks go idle on their own
/// once the sample is exhausted.
#[derive(Debug, Clone, Default)]
pub struct Track {
    sample: Option<Arc<Sample>>,
    /// Position in the sample, in frames.
    cursor: usize,
    volume: f32,
    looping: bool,
}

impl Track {
    /// Starts playing `sample` from its beginning. Empty samples leave the
    /// track idle.
    pub fn start(&mut self, sample: Arc<Sample>, volume: f32, looping: bool) {
        self.sample = (!sample.is_empty()).then_some(sample);
        self.cursor = 0;
        self.volume = volume.clamp(0.0, 1.0);
        self.looping = looping;
    }

    pub fn stop(&mut self) {
        self.sample = None;
        self.cursor = 0;
    }

    pub fn is_active(&self) -> bool {
        self.sample.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Adds the track's next frames, scaled by its volume, on top of `out`
    /// (interleaved stereo). Returns the number of frames mixed.
    pub fn mix(&mut self, out: &mut [f32]) -> usize {
        let frames = out.len() / CHANNELS;
        let mut done = 0;

        while done < frames {
            let Some(total) = self.sample.as_ref().map(|sample| sample.frames()) else {
                break;
            };
            let left = total - self.cursor;
            if left == 0 {
                if self.looping {
                    self.cursor = 0;
                } else {
                    self.stop();
                }
                continue;
            }

            let consume = left.min(frames - done);
            if let Some(sample) = &self.sample {
                let input = &sample.data()[self.cursor * CHANNELS..(self.cursor + consume) * CHANNELS];
                let output = &mut out[done * CHANNELS..(done + consume) * CHANNELS];
                for (out, input) in output.iter_mut().zip(input) {
                    *out = input.mul_add(self.volume, *out);
                }
            }
            self.cursor += consume;
            done += consume;
        }

        if !self.looping && self.sample.as_ref().is_some_and(|sample| self.cursor >= sample.frames()) {
            self.stop();
        }

        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(frames: usize, value: f32) -> Arc<Sample> {
        Arc::new(Sample::from_interleaved(&vec![value; frames * CHANNELS], CHANNELS).unwrap())
    }

    #[test]
    fn one_shot_goes_idle_when_exhausted() {
        let mut track = Track::default();
        track.start(sample(3, 0.5), 1.0, false);

        let mut out = vec![0.25; 8];
        assert_eq!(track.mix(&mut out), 3);
        assert_eq!(&out[..6], &[0.75; 6]);
        assert_eq!(&out[6..], &[0.25; 2]);
        assert!(!track.is_active());
    }

    #[test]
    fn looping_wraps_around() {
        let mut track = Track::default();
        track.start(sample(3, 1.0), 0.5, true);

        let mut out = vec![0.0; 16];
        assert_eq!(track.mix(&mut out), 8);
        assert!(out.iter().all(|&value| value == 0.5));
        assert!(track.is_active());
        assert_eq!(track.cursor(), 2);
    }

    #[test]
    fn empty_samples_are_ignored() {
        let mut track = Track::default();
        track.start(Arc::new(Sample::default()), 1.0, true);
        assert!(!track.is_active());
        assert_eq!(track.mix(&mut [0.0; 4]), 0);
    }
}

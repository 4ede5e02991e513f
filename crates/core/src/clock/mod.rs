use crate::Difficulty;

/// Reconciled game time.
///
/// `now` is the clock every other subsystem reads. It is driven by the wall
/// clock during the lead-in and whenever the decoder timestamp stalls, and
/// snaps to the decoded-audio timestamp whenever that one moves. It never goes
/// backwards across [`GameClock::reconcile`] calls.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GameClock {
    /// Current game time in seconds. Negative during the lead-in.
    pub now: f64,
    /// Value of `now` at the previous reconciliation.
    pub before: f64,
    /// Wall-clock time, in seconds, of the last reconciliation.
    pub system: f64,
    /// Last decoded-audio timestamp observed.
    pub audio: f64,
}

impl GameClock {
    /// Creates a clock for a session starting at wall time `system`.
    ///
    /// With a lead-in the clock starts at `-audio_lead_in`. Without one, a
    /// first object earlier than one second gets a one second head start so
    /// the player can see it coming.
    pub fn initial(difficulty: &Difficulty, first_hit: Option<f64>, system: f64) -> Self {
        let now = if difficulty.audio_lead_in > 0.0 {
            -difficulty.audio_lead_in
        } else {
            match first_hit {
                Some(time) if time < 1.0 => time - 1.0,
                _ => 0.0,
            }
        };

        Self {
            now,
            before: now,
            system,
            audio: 0.0,
        }
    }

    /// Folds one frame worth of wall time and audio progress into `now`.
    pub fn reconcile(&mut self, wall: f64, audio_timestamp: f64, is_playing: bool) -> f64 {
        let diff = wall - self.system;
        self.system = wall;
        let prev_audio = self.audio;
        self.audio = audio_timestamp;
        self.before = self.now;

        if !is_playing {
            // frozen
        } else if self.before < 0.0 {
            // leading in, audio has not started
            self.now = self.before + diff;
        } else if self.audio == prev_audio {
            // decoder stall: one packet can span several frames
            self.now = self.before + diff;
        } else {
            self.now = self.audio;
        }

        // The audio timestamp restarts near zero when the lead-in ends.
        if self.now < self.before {
            self.now = self.before;
        }

        self.now
    }

    /// Forces `now` to a new position after a seek.
    pub(crate) fn jump_to(&mut self, time: f64) {
        self.now = time;
    }
}

/// Formats seconds as `m:ss.sss`, used by the status line.
pub fn format_time(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let seconds = seconds.abs();
    let minutes = (seconds / 60.0).floor();
    format!("{sign}{}:{:06.3}", minutes as u64, seconds - minutes * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(now: f64, audio: f64, system: f64) -> GameClock {
        GameClock {
            now,
            before: now,
            system,
            audio,
        }
    }

    #[test]
    fn lead_in_follows_the_wall_clock() {
        let mut clock = clock(-2.0, 0.0, 10.0);
        let now = clock.reconcile(10.5, 3.0, true);
        assert_eq!(now, -1.5);
        assert_eq!(clock.before, -2.0);
    }

    #[test]
    fn stalled_decoder_falls_back_to_wall_clock() {
        let mut clock = clock(5.0, 5.0, 1.0);
        let now = clock.reconcile(1.1, 5.0, true);
        assert!((now - 5.1).abs() < 1e-9);
    }

    #[test]
    fn moving_audio_is_authoritative() {
        let mut clock = clock(5.0, 5.0, 1.0);
        assert_eq!(clock.reconcile(1.5, 5.02, true), 5.02);
    }

    #[test]
    fn paused_clock_does_not_move_but_tracks_wall_time() {
        let mut clock = clock(5.0, 5.0, 1.0);
        assert_eq!(clock.reconcile(4.0, 6.0, false), 5.0);
        assert_eq!(clock.system, 4.0);
        // resuming must not replay the paused wall time
        assert_eq!(clock.reconcile(4.1, 6.0, true), 5.0 + (4.1 - 4.0));
    }

    #[test]
    fn lead_in_to_playback_transition_is_clamped() {
        let mut clock = clock(-0.01, 0.0, 0.0);
        clock.reconcile(0.05, 0.0, true);
        let before = clock.now;
        assert!(before > 0.0);
        // audio restarts at a tiny timestamp, the clock holds instead
        assert_eq!(clock.reconcile(0.06, 0.001, true), before);
    }

    #[test]
    fn now_is_monotonic_whatever_the_audio_does() {
        let audio = [0.0, 0.2, 0.2, 0.1, 0.5, 0.4, 0.4, 0.3, 1.2, 0.0, 2.0];
        let mut clock = clock(-0.3, 0.0, 0.0);
        let mut last = clock.now;
        for (frame, timestamp) in audio.iter().enumerate() {
            let now = clock.reconcile((frame + 1) as f64 * 0.016, *timestamp, true);
            assert!(now >= last, "frame {frame}: {now} < {last}");
            last = now;
        }
    }

    #[test]
    fn initial_time_honours_lead_in_and_early_objects() {
        let lead_in = Difficulty {
            audio_lead_in: 2.0,
            ..Default::default()
        };
        assert_eq!(GameClock::initial(&lead_in, Some(0.2), 3.0).now, -2.0);

        let plain = Difficulty::default();
        assert!((GameClock::initial(&plain, Some(0.25), 0.0).now + 0.75).abs() < 1e-12);
        assert_eq!(GameClock::initial(&plain, Some(4.0), 0.0).now, 0.0);
        assert_eq!(GameClock::initial(&plain, None, 7.0).system, 7.0);
    }

    #[test]
    fn formats_status_times() {
        assert_eq!(format_time(83.25), "1:23.250");
        assert_eq!(format_time(-1.5), "-0:01.500");
    }
}

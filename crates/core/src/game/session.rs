use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::game::{FramePacer, GameContext, GameMode, GameState};
use crate::{Finger, GameConfig, Result, ScoreSummary};

/// How far back unpausing jumps, to give the player time to react.
pub const UNPAUSE_REWIND: f64 = 1.0;

/// Host events, already translated from raw device input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Press(Finger),
    Release(Finger),
    TogglePause,
    Rewind(f64),
    Forward(f64),
    /// The window lost focus or got minimised.
    FocusLost,
    Stop,
}

/// Non-blocking queue of pending events, drained once per frame.
pub trait EventSource {
    fn poll(&mut self) -> Option<InputEvent>;
}

impl EventSource for VecDeque<InputEvent> {
    fn poll(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

/// Lets another thread, typically a signal handler, ask a session to stop.
///
/// The handle does not keep the session alive. The request is turned into
/// [`Session::stop`] at the next frame boundary.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Weak<AtomicBool>,
}

impl StopHandle {
    /// Returns false when the session is already gone.
    pub fn request_stop(&self) -> bool {
        match self.flag.upgrade() {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

/// One game session: the shared context plus the ruleset judging it.
#[derive(Debug)]
pub struct Session<M> {
    game: GameContext,
    mode: M,
    stop_requested: Arc<AtomicBool>,
    summary: Option<ScoreSummary>,
}

impl<M: GameMode> Session<M> {
    pub fn new(game: GameContext, mode: M) -> Self {
        Self {
            game,
            mode,
            stop_requested: Arc::new(AtomicBool::new(false)),
            summary: None,
        }
    }

    pub fn game(&self) -> &GameContext {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameContext {
        &mut self.game
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }

    pub fn state(&self) -> GameState {
        self.game.state()
    }

    /// Final score, available once the session finished.
    pub fn summary(&self) -> Option<ScoreSummary> {
        self.summary
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::downgrade(&self.stop_requested),
        }
    }

    /// Stops the audio output and freezes the clock.
    pub fn pause(&mut self) -> Result<()> {
        self.game.mixer.pause()?;
        self.game.set_state(GameState::PAUSED, GameState::PLAYING);
        self.game.log_status();
        Ok(())
    }

    /// Resumes play. A hand-played session past its lead-in first goes back
    /// [`UNPAUSE_REWIND`] seconds, which also drops any held object.
    pub fn unpause(&mut self) -> Result<()> {
        if !self.game.state().is_paused() {
            return Ok(());
        }
        if self.game.now() >= 0.0 && !self.game.state().is_autoplay() {
            self.rewind(UNPAUSE_REWIND)?;
        }
        if self.game.now() >= 0.0 {
            self.game.resume_audio()?;
        }
        self.game.set_state(GameState::PLAYING, GameState::PAUSED);
        self.game.log_status();
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<()> {
        if self.game.state().is_paused() {
            self.unpause()
        } else {
            self.pause()
        }
    }

    /// Jumps `offset` seconds back. Objects more than a second past the
    /// landing point become playable again.
    ///
    /// If the music cannot seek, nothing changes and the error is returned.
    pub fn rewind(&mut self, offset: f64) -> Result<()> {
        let current = self.game.mixer.music_timestamp()?;
        let landed = self.game.mixer.seek_music(current - offset)?;
        self.mode.relinquish(&mut self.game)?;
        self.game.clock.jump_to(landed);

        let reset = self.game.timeline.rewind_to(landed);
        tracing::info!(offset, landed, reset, "rewound");
        self.game.log_status();
        Ok(())
    }

    /// Jumps `offset` seconds ahead. Objects starting less than a second
    /// after the landing point are skipped.
    pub fn forward(&mut self, offset: f64) -> Result<()> {
        let current = self.game.mixer.music_timestamp()?;
        let landed = self.game.mixer.seek_music(current + offset)?;
        self.mode.relinquish(&mut self.game)?;
        self.game.clock.jump_to(landed);
        if !self.game.state().is_paused() && landed >= 0.0 {
            self.game.resume_audio()?;
        }

        let skipped = self.game.timeline.forward_to(landed);
        tracing::info!(offset, landed, skipped, "skipped ahead");
        self.game.log_status();
        Ok(())
    }

    /// Makes [`Session::run`] return at the end of the current iteration.
    pub fn stop(&mut self) {
        if !self.game.state().is_stopping() {
            tracing::info!("stopping session");
        }
        self.game.set_state(GameState::STOPPING, GameState::empty());
    }

    /// Reconciles the clock against `wall` and judges the frame.
    pub fn advance_frame(&mut self, wall: f64) -> Result<()> {
        self.reconcile(wall)?;
        self.judge()
    }

    fn reconcile(&mut self, wall: f64) -> Result<f64> {
        let audio = self.game.mixer.music_timestamp()?;
        let playing = !self.game.state().is_paused();
        Ok(self.game.clock.reconcile(wall, audio, playing))
    }

    fn judge(&mut self) -> Result<()> {
        let state = self.game.state();
        if state.is_paused() || state.is_finished() {
            return Ok(());
        }

        if self.game.now() >= 0.0 && self.game.mixer.is_paused()? {
            self.game.resume_audio()?;
        }
        if state.is_autoplay() {
            self.mode.check_autoplay(&mut self.game)?;
        } else {
            self.mode.check(&mut self.game)?;
        }

        let delay = self.game.difficulty.leniency + self.game.difficulty.approach_time;
        if self.game.timeline.is_over(self.game.now(), delay) {
            self.finish();
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.game.set_state(GameState::FINISHED, GameState::empty());
        let summary = ScoreSummary::from_timeline(&self.game.timeline);
        summary.log();
        self.summary = Some(summary);
    }

    /// Applies one host event according to the current state.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<()> {
        let state = self.game.state();
        if let InputEvent::Stop = event {
            self.stop();
            return Ok(());
        }
        if state.is_finished() {
            return Ok(());
        }

        let user_playing = !state.is_paused() && !state.is_autoplay();
        match event {
            InputEvent::TogglePause => self.toggle_pause(),
            InputEvent::Rewind(offset) => self.rewind(offset),
            InputEvent::Forward(offset) => self.forward(offset),
            InputEvent::Press(finger) if user_playing => self.mode.press(&mut self.game, finger),
            InputEvent::Release(finger) if user_playing => {
                self.mode.release(&mut self.game, finger)
            }
            InputEvent::FocusLost if user_playing && !self.game.timeline.cursor_at_end() => {
                self.pause()
            }
            _ => Ok(()),
        }
    }

    /// Main loop: stop check, clock, events, judgement, pacing. Returns
    /// when stopped, or when the game finished and `exit_on_finish` is set.
    pub fn run(
        &mut self,
        config: &GameConfig,
        pacer: &mut FramePacer,
        events: &mut impl EventSource,
    ) -> Result<()> {
        tracing::info!(
            autoplay = self.game.state().is_autoplay(),
            objects = self.game.timeline.len(),
            "starting session"
        );
        self.game.log_status();

        loop {
            if self.stop_requested.swap(false, Ordering::AcqRel) {
                self.stop();
            }
            if self.game.state().is_stopping() {
                break;
            }

            let frame_start = pacer.now();
            self.reconcile(frame_start)?;
            while let Some(event) = events.poll() {
                match self.handle_event(event) {
                    Err(err) if err.is_recoverable() => {
                        tracing::warn!(error = %err, ?event, "transport command failed");
                    }
                    other => other?,
                }
            }
            self.judge()?;

            if self.game.state().is_finished() && config.exit_on_finish {
                self.stop();
            }
            pacer.wait(frame_start);
        }

        self.game.mixer.pause()?;
        if pacer.missed_frames() > 0 {
            tracing::debug!(missed = pacer.missed_frames(), "frames overran their budget");
        }
        Ok(())
    }
}

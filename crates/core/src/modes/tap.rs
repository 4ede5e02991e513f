use crate::game::{GameContext, GameMode};
use crate::{Finger, HitIndex, HitKind, HitObject, HitState, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeldHit {
    index: HitIndex,
    /// `None` when activated by autoplay.
    finger: Option<Finger>,
}

/// Timing-only ruleset: any finger hits the oldest clickable object.
///
/// Circles are judged on press. Sliders and holds are grabbed on press and
/// judged when let go, or automatically once their end time has passed.
/// Spinners are not judged and get skipped.
#[derive(Debug, Default)]
pub struct TapMode {
    held: Option<HeldHit>,
}

impl TapMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object currently held down, if any.
    pub fn held(&self) -> Option<HitIndex> {
        self.held.map(|held| held.index)
    }

    /// Oldest unplayed relevant object within the approach window.
    fn find_hit(&self, game: &GameContext) -> Option<HitIndex> {
        let approach = game.difficulty.approach_time;
        let now = game.now();
        let timeline = &game.timeline;
        let start = timeline
            .look_back(timeline.cursor(), now, approach)
            .max(timeline.first_index());

        (start..timeline.tail_index())
            .take_while(|&index| timeline.get(index).time <= now + approach)
            .find(|&index| {
                let hit = timeline.get(index);
                self.is_relevant(hit) && hit.state == HitState::Initial
            })
    }

    fn activate(
        &mut self,
        game: &mut GameContext,
        index: HitIndex,
        finger: Option<Finger>,
    ) -> Result<()> {
        let kind = game.timeline.get(index).kind;
        if kind.is_held() {
            self.release_held(game)?;
            game.timeline.get_mut(index).state = HitState::Held;
            self.held = Some(HeldHit { index, finger });
            let hit = game.timeline.get(index);
            game.play_hit_sound(hit)?;
            game.start_slide(hit)?;
        } else if kind.contains(HitKind::CIRCLE) {
            game.timeline.get_mut(index).state = HitState::Good;
            game.play_hit_sound(game.timeline.get(index))?;
        } else {
            game.timeline.get_mut(index).state = HitState::Skipped;
        }
        Ok(())
    }

    /// Judges the held object: letting go before the end, minus the
    /// leniency, is a miss.
    fn release_held(&mut self, game: &mut GameContext) -> Result<()> {
        let Some(held) = self.held.take() else {
            return Ok(());
        };

        let now = game.now();
        let leniency = game.difficulty.leniency;
        let hit = game.timeline.get_mut(held.index);
        if now < hit.end_time - leniency {
            hit.state = HitState::Missed;
        } else {
            hit.state = HitState::Good;
            game.play_hit_sound(game.timeline.get(held.index))?;
        }
        game.stop_slide()
    }

    fn update_held(&mut self, game: &mut GameContext) -> Result<()> {
        match self.held {
            Some(held) if game.now() > game.timeline.get(held.index).end_time => {
                self.release_held(game)
            }
            _ => Ok(()),
        }
    }
}

impl GameMode for TapMode {
    fn check(&mut self, game: &mut GameContext) -> Result<()> {
        self.update_held(game)?;

        let left_wall = game.now() - game.difficulty.leniency;
        while !game.timeline.cursor_at_end() && game.timeline.cursor_hit().time < left_wall {
            let index = game.timeline.cursor();
            let hit = game.timeline.get(index);
            let (state, relevant) = (hit.state, self.is_relevant(hit));
            match state {
                HitState::Held => break,
                HitState::Initial if relevant => {
                    game.timeline.get_mut(index).state = HitState::Missed;
                }
                HitState::Initial => game.timeline.get_mut(index).state = HitState::Skipped,
                _ => {}
            }
            game.timeline.advance_cursor();
        }
        Ok(())
    }

    fn check_autoplay(&mut self, game: &mut GameContext) -> Result<()> {
        self.update_held(game)?;

        while !game.timeline.cursor_at_end() && game.timeline.cursor_hit().time <= game.now() {
            let index = game.timeline.cursor();
            let hit = game.timeline.get(index);
            let (state, relevant) = (hit.state, self.is_relevant(hit));
            match state {
                HitState::Held => break,
                HitState::Initial if relevant => {
                    self.activate(game, index, None)?;
                    game.timeline.get_mut(index).offset = Some(0.0);
                    if game.timeline.get(index).state == HitState::Held {
                        break;
                    }
                }
                HitState::Initial => game.timeline.get_mut(index).state = HitState::Skipped,
                _ => {}
            }
            game.timeline.advance_cursor();
        }
        Ok(())
    }

    fn press(&mut self, game: &mut GameContext, finger: Finger) -> Result<()> {
        let Some(index) = self.find_hit(game) else {
            return Ok(());
        };

        let now = game.now();
        let time = game.timeline.get(index).time;
        if (time - now).abs() < game.difficulty.leniency {
            self.activate(game, index, Some(finger))?;
            game.timeline.get_mut(index).offset = Some(now - time);
        } else {
            game.timeline.get_mut(index).state = HitState::Missed;
        }
        Ok(())
    }

    fn release(&mut self, game: &mut GameContext, finger: Finger) -> Result<()> {
        match self.held {
            Some(held) if held.finger == Some(finger) => self.release_held(game),
            _ => Ok(()),
        }
    }

    fn relinquish(&mut self, game: &mut GameContext) -> Result<()> {
        if let Some(held) = self.held.take() {
            game.timeline.get_mut(held.index).reset();
            game.stop_slide()?;
        }
        Ok(())
    }

    fn is_relevant(&self, hit: &HitObject) -> bool {
        hit.kind.intersects(HitKind::CIRCLE | HitKind::SLIDER | HitKind::HOLD)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{AudioConfig, Difficulty, Mixer, Sample, SoundBank, Timeline};

    fn bank() -> SoundBank {
        let blip = Arc::new(Sample::from_interleaved(&[0.1; 64], 2).unwrap());
        SoundBank {
            hit: Some(Arc::clone(&blip)),
            slide: Some(blip),
            volume: 1.0,
        }
    }

    fn game(objects: Vec<HitObject>) -> GameContext {
        let timeline = Timeline::new(objects).unwrap();
        let mixer = Mixer::new(&AudioConfig::default(), 100);
        GameContext::new(timeline, mixer, Difficulty::default(), bank(), false, 0.0)
    }

    fn at(game: &mut GameContext, now: f64) {
        game.clock.now = now;
    }

    fn playing_effects(game: &GameContext) -> usize {
        game.mixer.effect_cursors().unwrap().iter().flatten().count()
    }

    #[test]
    fn press_on_time_is_good() {
        let mut game = game(vec![HitObject::circle(2.0), HitObject::circle(3.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 2.05);
        mode.press(&mut game, Finger::LeftIndex).unwrap();

        let hit = game.timeline.get(1);
        assert_eq!(hit.state, HitState::Good);
        assert!((hit.offset.unwrap() - 0.05).abs() < 1e-9);
        assert_eq!(playing_effects(&game), 1);
        assert_eq!(game.timeline.get(2).state, HitState::Initial);
    }

    #[test]
    fn early_press_within_approach_misses() {
        let mut game = game(vec![HitObject::circle(2.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.5);
        mode.press(&mut game, Finger::LeftIndex).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Missed);
        assert_eq!(playing_effects(&game), 0);
    }

    #[test]
    fn press_far_from_any_object_does_nothing() {
        let mut game = game(vec![HitObject::circle(5.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.0);
        mode.press(&mut game, Finger::Thumbs).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Initial);
    }

    #[test]
    fn check_misses_passed_objects_and_skips_spinners() {
        let mut game = game(vec![
            HitObject::circle(1.0),
            HitObject::new(2.0, 3.0, HitKind::SPINNER),
            HitObject::circle(4.0),
        ]);
        let mut mode = TapMode::new();

        at(&mut game, 3.5);
        mode.check(&mut game).unwrap();

        assert_eq!(game.timeline.get(1).state, HitState::Missed);
        assert_eq!(game.timeline.get(2).state, HitState::Skipped);
        assert_eq!(game.timeline.get(3).state, HitState::Initial);
        assert_eq!(game.timeline.cursor(), 3);

        // inside the leniency window the object is still playable
        at(&mut game, 4.05);
        mode.check(&mut game).unwrap();
        assert_eq!(game.timeline.cursor(), 3);
    }

    #[test]
    fn judged_objects_are_not_marked_missed() {
        let mut game = game(vec![HitObject::circle(1.0), HitObject::circle(2.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.0);
        mode.press(&mut game, Finger::LeftIndex).unwrap();
        at(&mut game, 5.0);
        mode.check(&mut game).unwrap();

        assert_eq!(game.timeline.get(1).state, HitState::Good);
        assert_eq!(game.timeline.get(2).state, HitState::Missed);
        assert!(game.timeline.cursor_at_end());
    }

    #[test]
    fn sliders_are_judged_on_release() {
        let mut game = game(vec![HitObject::slider(1.0, 3.0), HitObject::slider(4.0, 6.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.0);
        mode.press(&mut game, Finger::LeftIndex).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Held);
        assert_eq!(mode.held(), Some(1));
        assert!(game.mixer.is_looping().unwrap());

        // other fingers do not count
        at(&mut game, 2.0);
        mode.release(&mut game, Finger::RightIndex).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Held);

        mode.release(&mut game, Finger::LeftIndex).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Missed);
        assert!(!game.mixer.is_looping().unwrap());

        at(&mut game, 4.0);
        mode.press(&mut game, Finger::RightIndex).unwrap();
        at(&mut game, 5.95);
        mode.release(&mut game, Finger::RightIndex).unwrap();
        assert_eq!(game.timeline.get(2).state, HitState::Good);
        assert_eq!(mode.held(), None);
    }

    #[test]
    fn check_waits_for_held_objects() {
        let mut game = game(vec![HitObject::slider(1.0, 3.0), HitObject::circle(5.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.0);
        mode.press(&mut game, Finger::LeftIndex).unwrap();
        at(&mut game, 2.5);
        mode.check(&mut game).unwrap();
        assert_eq!(game.timeline.cursor(), 1);

        // holding to the end resolves it without a release
        at(&mut game, 3.01);
        mode.check(&mut game).unwrap();
        assert_eq!(game.timeline.get(1).state, HitState::Good);
        assert_eq!(game.timeline.cursor(), 2);
        assert!(!game.mixer.is_looping().unwrap());
    }

    #[test]
    fn relinquish_returns_the_held_object() {
        let mut game = game(vec![HitObject::slider(1.0, 3.0)]);
        let mut mode = TapMode::new();

        at(&mut game, 1.0);
        mode.press(&mut game, Finger::LeftIndex).unwrap();
        mode.relinquish(&mut game).unwrap();

        let hit = game.timeline.get(1);
        assert_eq!(hit.state, HitState::Initial);
        assert_eq!(hit.offset, None);
        assert_eq!(mode.held(), None);
        assert!(!game.mixer.is_looping().unwrap());

        // nothing held, nothing to do
        mode.relinquish(&mut game).unwrap();
    }

    #[test]
    fn autoplay_is_perfect() {
        let mut game = game(vec![
            HitObject::circle(1.0),
            HitObject::slider(2.0, 3.0),
            HitObject::new(3.5, 4.0, HitKind::SPINNER),
            HitObject::circle(5.0),
        ]);
        let mut mode = TapMode::new();

        let mut now = 0.0;
        while now < 6.0 {
            now += 0.01;
            at(&mut game, now);
            mode.check_autoplay(&mut game).unwrap();
        }

        let states: Vec<_> = game.timeline.hits().iter().map(|hit| hit.state).collect();
        assert_eq!(
            states,
            vec![HitState::Good, HitState::Good, HitState::Skipped, HitState::Good]
        );
        assert!(game.timeline.cursor_at_end());
        assert_eq!(mode.held(), None);
    }
}

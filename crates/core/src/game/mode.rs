use crate::game::GameContext;
use crate::{Finger, HitObject, Result};

/// A ruleset.
///
/// The session picks one implementation at start and never swaps it. Every
/// call is made from the game loop, after the clock was reconciled for the
/// frame and never while a transport operation is in progress.
pub trait GameMode {
    /// Called every frame while playing by hand. Marks objects the player
    /// let pass as missed and moves the timeline cursor past resolved ones.
    fn check(&mut self, game: &mut GameContext) -> Result<()>;

    /// Replaces [`GameMode::check`] in autoplay: plays every object perfectly.
    fn check_autoplay(&mut self, game: &mut GameContext) -> Result<()>;

    /// A finger went down. Never called in autoplay or while paused.
    fn press(&mut self, game: &mut GameContext, finger: Finger) -> Result<()>;

    /// See [`GameMode::press`].
    fn release(&mut self, game: &mut GameContext, finger: Finger) -> Result<()>;

    /// Lets go of any held object. Called right before every timeline jump so
    /// no holding state survives the discontinuity.
    fn relinquish(&mut self, game: &mut GameContext) -> Result<()>;

    /// Whether the mode judges this kind of object at all.
    fn is_relevant(&self, hit: &HitObject) -> bool {
        !hit.kind.is_empty()
    }
}

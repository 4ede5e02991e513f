//! Ordered hit-object sequence with a movable cursor.
//!
//! Objects live in a flat arena bracketed by two sentinels: index 0 sits at
//! negative infinity and the last index at positive infinity. Walking from any
//! cursor in either direction therefore always terminates, and the cursor is
//! never out of bounds even once every object has been played. Links between
//! neighbours are plain index arithmetic since the sequence is immutable in
//! shape once loaded.

use std::path::Path;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{BeatlineError, Result};

/// Index of an object in the [`Timeline`] arena.
pub type HitIndex = usize;

/// Guard, in seconds, left between a seek landing point and the objects it
/// resets or skips.
pub const SEEK_GUARD: f64 = 1.0;

bitflags! {
    /// Kind of a hit object. Each game mode decides which kinds it judges.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HitKind: u8 {
        const CIRCLE = 0b0001;
        const SLIDER = 0b0010;
        const SPINNER = 0b0100;
        const HOLD = 0b1000;
    }
}

impl HitKind {
    /// Kinds that stay active between their start and end time.
    pub fn is_held(self) -> bool {
        self.intersects(Self::SLIDER | Self::HOLD)
    }
}

/// Judgement state of a hit object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitState {
    #[default]
    Initial,
    /// A slider or hold currently being held down.
    Held,
    Good,
    Missed,
    Skipped,
}

impl HitState {
    /// True once the object received its final judgement.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Good | Self::Missed | Self::Skipped)
    }
}

/// One scheduled gameplay event.
#[derive(Debug, Clone, PartialEq)]
pub struct HitObject {
    pub time: f64,
    pub end_time: f64,
    pub kind: HitKind,
    pub state: HitState,
    /// Groups consecutive objects for renderers. Not used for timing.
    pub combo_id: u32,
    /// Volume of the hit sound triggered by this object.
    pub volume: f32,
    /// Signed distance between the press and `time`, once judged by input.
    pub offset: Option<f64>,
}

impl HitObject {
    /// Instantaneous object.
    pub fn circle(time: f64) -> Self {
        Self::new(time, time, HitKind::CIRCLE)
    }

    /// Object held from `time` until `end_time`.
    pub fn slider(time: f64, end_time: f64) -> Self {
        Self::new(time, end_time, HitKind::SLIDER)
    }

    pub fn new(time: f64, end_time: f64, kind: HitKind) -> Self {
        Self {
            time,
            end_time,
            kind,
            state: HitState::Initial,
            combo_id: 0,
            volume: 1.0,
            offset: None,
        }
    }

    fn sentinel(time: f64) -> Self {
        Self::new(time, time, HitKind::empty())
    }

    /// Puts the object back in its unplayed state.
    pub fn reset(&mut self) {
        self.state = HitState::Initial;
        self.offset = None;
    }
}

/// Hit-object arena plus the gameplay cursor.
#[derive(Debug, Clone)]
pub struct Timeline {
    hits: Vec<HitObject>,
    cursor: HitIndex,
}

impl Timeline {
    /// Builds a timeline from objects sorted by strictly increasing time.
    pub fn new(objects: Vec<HitObject>) -> Result<Self> {
        if objects.is_empty() {
            return Err(BeatlineError::timeline("no hit objects"));
        }

        for (index, hit) in objects.iter().enumerate() {
            if !hit.time.is_finite() || !hit.end_time.is_finite() {
                return Err(BeatlineError::timeline(format!(
                    "object #{index} has a non-finite time"
                )));
            }
            if hit.end_time < hit.time {
                return Err(BeatlineError::timeline(format!(
                    "object #{index} ends at {} before it starts at {}",
                    hit.end_time, hit.time
                )));
            }
        }

        if let Some(index) = objects.windows(2).position(|pair| pair[1].time <= pair[0].time) {
            return Err(BeatlineError::timeline(format!(
                "object #{} at {}s is not after its predecessor",
                index + 1,
                objects[index + 1].time
            )));
        }

        let mut hits = Vec::with_capacity(objects.len() + 2);
        hits.push(HitObject::sentinel(f64::NEG_INFINITY));
        hits.extend(objects);
        hits.push(HitObject::sentinel(f64::INFINITY));

        Ok(Self { hits, cursor: 1 })
    }

    /// Number of real objects, sentinels excluded.
    pub fn len(&self) -> usize {
        self.hits.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first real object.
    pub fn first_index(&self) -> HitIndex {
        1
    }

    /// Index of the tail sentinel.
    pub fn tail_index(&self) -> HitIndex {
        self.hits.len() - 1
    }

    pub fn is_sentinel(&self, index: HitIndex) -> bool {
        index == 0 || index >= self.tail_index()
    }

    pub fn get(&self, index: HitIndex) -> &HitObject {
        &self.hits[index]
    }

    pub fn get_mut(&mut self, index: HitIndex) -> &mut HitObject {
        &mut self.hits[index]
    }

    pub fn previous(&self, index: HitIndex) -> Option<HitIndex> {
        index.checked_sub(1)
    }

    pub fn next(&self, index: HitIndex) -> Option<HitIndex> {
        (index < self.tail_index()).then_some(index + 1)
    }

    /// Real objects in time order.
    pub fn hits(&self) -> &[HitObject] {
        &self.hits[1..self.tail_index()]
    }

    /// Start time of the first object.
    pub fn first_time(&self) -> f64 {
        self.hits[1].time
    }

    /// End time of the last object.
    pub fn last_end_time(&self) -> f64 {
        self.hits[self.tail_index() - 1].end_time
    }

    /// The next unresolved object, or the tail sentinel once all are played.
    pub fn cursor(&self) -> HitIndex {
        self.cursor
    }

    pub fn cursor_hit(&self) -> &HitObject {
        &self.hits[self.cursor]
    }

    /// True when the cursor went past the last real object.
    pub fn cursor_at_end(&self) -> bool {
        self.cursor == self.tail_index()
    }

    /// Moves the cursor one object forward, never past the tail sentinel.
    pub fn advance_cursor(&mut self) {
        if self.cursor < self.tail_index() {
            self.cursor += 1;
        }
    }

    /// First object, scanning from `from`, whose end time is at or after
    /// `now - offset`.
    ///
    /// Used to find the oldest object that may still matter, typically with
    /// the approach time or the leniency as offset. The scan walks backward
    /// then forward from `from` so it costs the distance moved, not the list
    /// length.
    pub fn look_back(&self, from: HitIndex, now: f64, offset: f64) -> HitIndex {
        let target = now - offset;
        let mut hit = from.min(self.tail_index());
        while hit > 0 && self.hits[hit].end_time > target {
            hit -= 1;
        }
        while hit < self.tail_index() && self.hits[hit].end_time < target {
            hit += 1;
        }
        hit
    }

    /// Last object, scanning from `from`, whose start time is at or before
    /// `now + offset`. Symmetric to [`Timeline::look_back`].
    pub fn look_up(&self, from: HitIndex, now: f64, offset: f64) -> HitIndex {
        let target = now + offset;
        let mut hit = from.min(self.tail_index());
        while hit < self.tail_index() && self.hits[hit].time < target {
            hit += 1;
        }
        while hit > 0 && self.hits[hit].time > target {
            hit -= 1;
        }
        hit
    }

    /// Next object from the cursor accepted by `relevant`, or the tail.
    pub fn next_relevant(&self, relevant: impl Fn(&HitObject) -> bool) -> HitIndex {
        (self.cursor..self.tail_index())
            .find(|&index| relevant(&self.hits[index]))
            .unwrap_or(self.tail_index())
    }

    /// Closest object before the cursor accepted by `relevant`, or the head.
    pub fn previous_relevant(&self, relevant: impl Fn(&HitObject) -> bool) -> HitIndex {
        (1..self.cursor)
            .rev()
            .find(|&index| relevant(&self.hits[index]))
            .unwrap_or(0)
    }

    /// Walks the cursor back after a rewind to `now`, resetting every object
    /// scheduled after `now + SEEK_GUARD`. Returns how many were reset.
    ///
    /// Objects ahead of the cursor may already be judged by an early press,
    /// so those past the guard are reset too.
    pub(crate) fn rewind_to(&mut self, now: f64) -> usize {
        let limit = now + SEEK_GUARD;
        let tail = self.tail_index();
        let mut reset = 0;
        for hit in &mut self.hits[(self.cursor + 1).min(tail)..tail] {
            if hit.time > limit && hit.state != HitState::Initial {
                hit.reset();
                reset += 1;
            }
        }
        while self.cursor > 0 && self.hits[self.cursor].time > limit {
            if !self.is_sentinel(self.cursor) {
                self.hits[self.cursor].reset();
                reset += 1;
            }
            self.cursor -= 1;
        }
        self.cursor = self.cursor.max(self.first_index());
        reset
    }

    /// Walks the cursor forward after a jump to `now`, marking every object
    /// scheduled before `now + SEEK_GUARD` as skipped. Returns how many were
    /// skipped.
    pub(crate) fn forward_to(&mut self, now: f64) -> usize {
        let limit = now + SEEK_GUARD;
        let mut skipped = 0;
        while self.cursor < self.tail_index() && self.hits[self.cursor].time < limit {
            self.hits[self.cursor].state = HitState::Skipped;
            skipped += 1;
            self.cursor += 1;
        }
        skipped
    }

    /// True once every object is behind the cursor and `now` is more than
    /// `delay` past the end of the last one.
    pub fn is_over(&self, now: f64, delay: f64) -> bool {
        self.cursor_at_end() && now > self.last_end_time() + delay
    }
}

/// Serialised form of a hit object, as produced by a beatmap converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitObjectSpec {
    pub time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub kind: SpecKind,
    #[serde(default)]
    pub combo_id: u32,
    #[serde(default)]
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    #[default]
    Circle,
    Slider,
    Spinner,
    Hold,
}

impl From<SpecKind> for HitKind {
    fn from(kind: SpecKind) -> Self {
        match kind {
            SpecKind::Circle => HitKind::CIRCLE,
            SpecKind::Slider => HitKind::SLIDER,
            SpecKind::Spinner => HitKind::SPINNER,
            SpecKind::Hold => HitKind::HOLD,
        }
    }
}

impl From<&HitObjectSpec> for HitObject {
    fn from(spec: &HitObjectSpec) -> Self {
        let mut hit = HitObject::new(
            spec.time,
            spec.end_time.unwrap_or(spec.time),
            spec.kind.into(),
        );
        hit.combo_id = spec.combo_id;
        hit.volume = spec.volume.unwrap_or(1.0);
        hit
    }
}

/// A hit-object file: either a bare array of objects or an object carrying
/// the array under `hits` together with an optional lead-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimelineDocument {
    Bare(Vec<HitObjectSpec>),
    Full {
        #[serde(default)]
        audio_lead_in: Option<f64>,
        hits: Vec<HitObjectSpec>,
    },
}

impl TimelineDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Lead-in declared by the document, if any.
    pub fn audio_lead_in(&self) -> Option<f64> {
        match self {
            Self::Bare(_) => None,
            Self::Full { audio_lead_in, .. } => *audio_lead_in,
        }
    }

    /// Sorts the objects by time and builds a validated timeline.
    pub fn into_timeline(self) -> Result<Timeline> {
        let specs = match self {
            Self::Bare(hits) | Self::Full { hits, .. } => hits,
        };
        let mut objects: Vec<HitObject> = specs.iter().map(HitObject::from).collect();
        objects.sort_by(|a, b| a.time.total_cmp(&b.time));
        Timeline::new(objects)
    }
}

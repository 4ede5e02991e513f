use serde::Serialize;

use crate::{HitState, Timeline};

/// Final tally of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub good: usize,
    pub missed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl ScoreSummary {
    pub fn from_timeline(timeline: &Timeline) -> Self {
        timeline
            .hits()
            .iter()
            .fold(Self::default(), |mut summary, hit| {
                match hit.state {
                    HitState::Good => summary.good += 1,
                    HitState::Missed => summary.missed += 1,
                    HitState::Skipped => summary.skipped += 1,
                    HitState::Initial | HitState::Held => {}
                }
                summary.total += 1;
                summary
            })
    }

    /// Share of the judged objects that were hit. Skipped objects do not
    /// count against the player.
    pub fn rate(&self) -> f64 {
        let judged = self.good + self.missed;
        if judged == 0 {
            return 0.0;
        }
        self.good as f64 / judged as f64
    }

    pub fn log(&self) {
        tracing::info!(
            good = self.good,
            missed = self.missed,
            skipped = self.skipped,
            total = self.total,
            rate = format!("{:.1}%", self.rate() * 100.0),
            "session complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HitObject;

    #[test]
    fn counts_every_terminal_state() {
        let mut timeline = Timeline::new(
            (1..=5).map(|second| HitObject::circle(second as f64)).collect(),
        )
        .unwrap();
        timeline.get_mut(1).state = HitState::Good;
        timeline.get_mut(2).state = HitState::Good;
        timeline.get_mut(3).state = HitState::Missed;
        timeline.get_mut(4).state = HitState::Skipped;

        let summary = ScoreSummary::from_timeline(&timeline);
        assert_eq!(
            summary,
            ScoreSummary {
                good: 2,
                missed: 1,
                skipped: 1,
                total: 5,
            }
        );
        assert!((summary.rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_judgement_rate_is_zero() {
        assert_eq!(ScoreSummary::default().rate(), 0.0);
    }

    #[test]
    fn serialises_for_reports() {
        let summary = ScoreSummary {
            good: 3,
            missed: 1,
            skipped: 0,
            total: 4,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["good"], 3);
        assert_eq!(json["total"], 4);
    }
}

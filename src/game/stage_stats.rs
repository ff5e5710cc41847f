use serde::Serialize;

use crate::game::scores::{self, Grade};
use crate::game::session::{EndReason, Mode, Session};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: Mode,
    pub reason: Option<EndReason>,
    pub score: u32,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub good_count: u32,
    pub miss_count: u32,
    pub accuracy: f64,
    pub grade: Grade,
}

impl SessionSummary {
    pub fn from_session(session: &Session, reason: Option<EndReason>) -> Self {
        let accuracy =
            scores::compute_accuracy(session.perfect_count, session.good_count, session.miss_count);
        Self {
            mode: session.mode,
            reason,
            score: session.score,
            max_combo: session.max_combo,
            perfect_count: session.perfect_count,
            good_count: session.good_count,
            miss_count: session.miss_count,
            accuracy,
            grade: scores::accuracy_to_grade(accuracy),
        }
    }

    pub fn title(&self) -> &'static str {
        self.reason.map_or(EndReason::Result.title(), EndReason::title)
    }
}

impl core::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{}", self.title())?;
        writeln!(f, "  Score:     {}", self.score)?;
        writeln!(f, "  Max combo: {}", self.max_combo)?;
        writeln!(f, "  Perfect:   {}", self.perfect_count)?;
        writeln!(f, "  Good:      {}", self.good_count)?;
        writeln!(f, "  Miss:      {}", self.miss_count)?;
        writeln!(f, "  Accuracy:  {:.1}%", self.accuracy)?;
        write!(f, "  Rank:      {}", self.grade)
    }
}

use crate::game::note::NoteOrigin;
use crate::game::timing_windows::JudgeWindows;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Good,
    Miss,
}

impl JudgeGrade {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Good => "GOOD",
            Self::Miss => "MISS",
        }
    }

    #[inline(always)]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Perfect | Self::Good)
    }
}

impl core::fmt::Display for JudgeGrade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why a judgement happened. Both miss kinds carry the same penalty; they are
/// kept apart so the presentation layer can tell them apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MissKind {
    /// Tap landed outside the good window; the note stays catchable.
    OutOfWindow,
    /// Tap on a lane with nothing in flight.
    EmptyLane,
    /// Note scrolled past the miss window.
    Expired,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub lane: usize,
    pub grade: JudgeGrade,
    /// Signed distance from the hit line at judgement time, `None` when no note was involved.
    pub distance_px: Option<f32>,
    pub origin: Option<NoteOrigin>,
    pub miss_kind: Option<MissKind>,
}

pub const SCORE_PERFECT: u32 = 100;
pub const SCORE_GOOD: u32 = 50;

pub const fn score_for(grade: JudgeGrade) -> u32 {
    match grade {
        JudgeGrade::Perfect => SCORE_PERFECT,
        JudgeGrade::Good => SCORE_GOOD,
        JudgeGrade::Miss => 0,
    }
}

/// Classifies an absolute distance from the hit line. Bounds are inclusive on
/// the better class.
#[inline(always)]
pub fn classify_distance(distance_px: f32, windows: &JudgeWindows) -> JudgeGrade {
    let abs = distance_px.abs();
    if abs <= windows.perfect_px {
        JudgeGrade::Perfect
    } else if abs <= windows.good_px {
        JudgeGrade::Good
    } else {
        JudgeGrade::Miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_are_inclusive() {
        let w = JudgeWindows::default();
        assert_eq!(classify_distance(22.0, &w), JudgeGrade::Perfect);
        assert_eq!(classify_distance(55.0, &w), JudgeGrade::Good);
        assert_eq!(classify_distance(56.0, &w), JudgeGrade::Miss);
    }

    #[test]
    fn early_and_late_are_symmetric() {
        let w = JudgeWindows::default();
        assert_eq!(classify_distance(-22.0, &w), JudgeGrade::Perfect);
        assert_eq!(classify_distance(-55.0, &w), JudgeGrade::Good);
        assert_eq!(classify_distance(-56.0, &w), JudgeGrade::Miss);
    }

    #[test]
    fn only_hits_score() {
        assert_eq!(score_for(JudgeGrade::Perfect), 100);
        assert_eq!(score_for(JudgeGrade::Good), 50);
        assert_eq!(score_for(JudgeGrade::Miss), 0);
        assert!(!JudgeGrade::Miss.is_hit());
    }
}

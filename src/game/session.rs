use serde::Serialize;
use std::str::FromStr;

use crate::game::judgment::{self, JudgeGrade};
use crate::game::life::{self, LIFE_GAIN_GOOD, LIFE_GAIN_PERFECT, LIFE_LOSS_MISS, LIFE_MAX};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Jammer feed enabled, life is cosmetic.
    Streamer,
    /// Life drains on misses and ends the run at zero.
    Rank,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streamer" => Ok(Self::Streamer),
            "rank" => Ok(Self::Rank),
            other => Err(format!("'{other}' is not a valid mode")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// Content finished or the media clock jumped backward.
    Result,
    /// Rank mode life hit zero.
    GameOver,
}

impl EndReason {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Result => "RESULT",
            Self::GameOver => "GAME OVER",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Paused,
    Ended(EndReason),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub good_count: u32,
    pub miss_count: u32,
    pub life: u32,
    pub mode: Mode,
    pub lifecycle: Lifecycle,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            perfect_count: 0,
            good_count: 0,
            miss_count: 0,
            life: LIFE_MAX,
            mode,
            lifecycle: Lifecycle::Idle,
        }
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    #[inline(always)]
    pub fn is_ended(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Ended(_))
    }

    pub fn total_judged(&self) -> u32 {
        self.perfect_count + self.good_count + self.miss_count
    }

    /// Applies one judgement. Returns true when this judgement emptied life in
    /// Rank mode.
    pub fn apply(&mut self, grade: JudgeGrade) -> bool {
        match grade {
            JudgeGrade::Perfect | JudgeGrade::Good => {
                self.score = self.score.saturating_add(judgment::score_for(grade));
                self.combo += 1;
                self.max_combo = self.max_combo.max(self.combo);
                let gain = if grade == JudgeGrade::Perfect {
                    self.perfect_count += 1;
                    LIFE_GAIN_PERFECT
                } else {
                    self.good_count += 1;
                    LIFE_GAIN_GOOD
                };
                if self.mode == Mode::Rank {
                    self.life = life::apply_life_change(self.life, gain);
                }
                false
            }
            JudgeGrade::Miss => {
                self.miss_count += 1;
                self.combo = 0;
                if self.mode == Mode::Rank {
                    self.life = life::apply_life_change(self.life, LIFE_LOSS_MISS);
                    return self.life == 0;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_build_combo_and_misses_break_it() {
        let mut s = Session::new(Mode::Streamer);
        s.apply(JudgeGrade::Perfect);
        s.apply(JudgeGrade::Good);
        s.apply(JudgeGrade::Perfect);
        assert_eq!((s.score, s.combo, s.max_combo), (250, 3, 3));
        s.apply(JudgeGrade::Miss);
        s.apply(JudgeGrade::Good);
        assert_eq!((s.combo, s.max_combo, s.miss_count), (1, 3, 1));
    }

    #[test]
    fn streamer_life_is_untouched() {
        let mut s = Session::new(Mode::Streamer);
        for _ in 0..20 {
            assert!(!s.apply(JudgeGrade::Miss));
        }
        assert_eq!(s.life, LIFE_MAX);
    }

    #[test]
    fn rank_life_drains_to_zero_and_reports_it() {
        let mut s = Session::new(Mode::Rank);
        for _ in 0..9 {
            assert!(!s.apply(JudgeGrade::Miss));
        }
        assert!(s.apply(JudgeGrade::Miss));
        assert_eq!(s.life, 0);
    }

    #[test]
    fn rank_life_is_capped() {
        let mut s = Session::new(Mode::Rank);
        s.apply(JudgeGrade::Miss);
        for _ in 0..10 {
            s.apply(JudgeGrade::Perfect);
        }
        assert_eq!(s.life, LIFE_MAX);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Rank".parse::<Mode>(), Ok(Mode::Rank));
        assert!("coop".parse::<Mode>().is_err());
    }
}

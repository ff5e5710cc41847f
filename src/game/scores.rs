use serde::Serialize;

// A GOOD is worth this fraction of a PERFECT toward accuracy.
const GOOD_ACCURACY_WEIGHT: f64 = 0.7;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl core::fmt::Display for Grade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Evaluated top-down, first match wins.
const GRADE_THRESHOLDS: [(Grade, f64); 5] = [
    (Grade::S, 95.0),
    (Grade::A, 90.0),
    (Grade::B, 80.0),
    (Grade::C, 70.0),
    (Grade::D, 0.0),
];

/// Accuracy percentage in `[0, 100]`; zero when nothing was judged.
pub fn compute_accuracy(perfect: u32, good: u32, miss: u32) -> f64 {
    let total = u64::from(perfect) + u64::from(good) + u64::from(miss);
    if total == 0 {
        return 0.0;
    }
    let raw = (f64::from(perfect) + f64::from(good) * GOOD_ACCURACY_WEIGHT) / total as f64 * 100.0;
    raw.clamp(0.0, 100.0)
}

pub fn accuracy_to_grade(accuracy: f64) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(_, min)| accuracy >= *min)
        .map_or(Grade::D, |(g, _)| *g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_perfect_one_good_is_an_s() {
        let acc = compute_accuracy(9, 1, 0);
        assert!((acc - 97.0).abs() < 1e-9, "got {acc}");
        assert_eq!(accuracy_to_grade(acc), Grade::S);
    }

    #[test]
    fn grade_bands_are_inclusive_at_the_bottom() {
        assert_eq!(accuracy_to_grade(95.0), Grade::S);
        assert_eq!(accuracy_to_grade(94.99), Grade::A);
        assert_eq!(accuracy_to_grade(90.0), Grade::A);
        assert_eq!(accuracy_to_grade(80.0), Grade::B);
        assert_eq!(accuracy_to_grade(70.0), Grade::C);
        assert_eq!(accuracy_to_grade(69.9), Grade::D);
        assert_eq!(accuracy_to_grade(0.0), Grade::D);
    }

    #[test]
    fn nothing_judged_is_zero_accuracy() {
        assert_eq!(compute_accuracy(0, 0, 0), 0.0);
        assert_eq!(accuracy_to_grade(f64::NAN), Grade::D);
    }

    #[test]
    fn all_misses_is_zero() {
        assert_eq!(compute_accuracy(0, 0, 12), 0.0);
    }
}

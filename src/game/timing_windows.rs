// Shared judgement window and lane geometry definitions to keep gameplay and visuals in sync.

// All windows are distances from the hit line in playfield pixels.
pub const PERFECT_WINDOW_PX: f32 = 22.0;
pub const GOOD_WINDOW_PX: f32 = 55.0;
// Notes further than this past the hit line expire as misses.
pub const MISS_WINDOW_PX: f32 = 80.0;

pub const LANES: usize = 4;

// Playfield is authored at 1280x720; the hit line sits 120px above the bottom edge.
pub const HIT_LINE_Y_PX: f32 = 720.0 - 120.0;
// Notes spawn this far above the top edge so they slide in instead of popping.
pub const SPAWN_OVERSHOOT_PX: f32 = 24.0;
pub const NOTE_SPEED_PX_PER_S: f32 = 320.0;

// Fallback procedural spawning, in simulated milliseconds.
pub const RANDOM_SPAWN_INTERVAL_MS: f32 = 700.0;

// Media clock adapter tolerances, in seconds.
pub const BACKWARD_JUMP_EPSILON_S: f64 = 0.01;
pub const MAX_STEP_S: f32 = 0.05;

/// Judgement thresholds. Each class is inclusive of its bound.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JudgeWindows {
    pub perfect_px: f32,
    pub good_px: f32,
    pub miss_px: f32,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect_px: PERFECT_WINDOW_PX,
            good_px: GOOD_WINDOW_PX,
            miss_px: MISS_WINDOW_PX,
        }
    }
}

/// Lane geometry. May change at runtime (viewport resize), so travel time is
/// always derived from the current value rather than cached.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LaneGeometry {
    pub hit_line_px: f32,
    pub overshoot_px: f32,
    pub note_speed_px_per_s: f32,
}

impl Default for LaneGeometry {
    fn default() -> Self {
        Self {
            hit_line_px: HIT_LINE_Y_PX,
            overshoot_px: SPAWN_OVERSHOOT_PX,
            note_speed_px_per_s: NOTE_SPEED_PX_PER_S,
        }
    }
}

impl LaneGeometry {
    /// Seconds a note needs to go from its spawn point to the hit line.
    #[inline(always)]
    pub fn travel_time_s(&self) -> f64 {
        let speed = if self.note_speed_px_per_s.is_finite() && self.note_speed_px_per_s > 0.0 {
            self.note_speed_px_per_s
        } else {
            NOTE_SPEED_PX_PER_S
        };
        f64::from(self.hit_line_px + self.overshoot_px) / f64::from(speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_travel_time_matches_playfield() {
        let g = LaneGeometry::default();
        assert!((g.travel_time_s() - 624.0 / 320.0).abs() < 1e-9);
    }

    #[test]
    fn travel_time_follows_geometry_changes() {
        let mut g = LaneGeometry::default();
        let before = g.travel_time_s();
        g.hit_line_px *= 2.0;
        g.overshoot_px *= 2.0;
        assert!((g.travel_time_s() - before * 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_speed_falls_back_to_default() {
        let g = LaneGeometry {
            note_speed_px_per_s: 0.0,
            ..LaneGeometry::default()
        };
        assert!(g.travel_time_s().is_finite());
    }
}

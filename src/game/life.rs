// Life only matters in Rank mode; in Streamer mode it is never touched.

pub const LIFE_MAX: u32 = 100;
pub const LIFE_GAIN_PERFECT: i32 = 2;
pub const LIFE_GAIN_GOOD: i32 = 1;
pub const LIFE_LOSS_MISS: i32 = -10;

/// Applies a signed life delta, clamped into `[0, LIFE_MAX]`.
#[inline(always)]
pub fn apply_life_change(life: u32, delta: i32) -> u32 {
    let next = i64::from(life) + i64::from(delta);
    next.clamp(0, i64::from(LIFE_MAX)) as u32
}

use std::time::Instant;

use crate::game::timing_windows::{BACKWARD_JUMP_EPSILON_S, MAX_STEP_S};

/// The authoritative playback position. Owned and driven by whoever plays the
/// media; gameplay only ever reads it.
pub trait MediaClock {
    fn current_time(&self) -> f64;

    /// Natural end of content (a non-looping source that ran out).
    fn is_ended(&self) -> bool {
        false
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClockSample {
    Advanced { media_time: f64, dt: f32 },
    /// The clock jumped backward past tolerance (seek or loop).
    Rewound { from: f64, to: f64 },
    Ended { media_time: f64 },
}

/// Turns raw clock reads into per-tick samples.
///
/// Media time itself is passed through untouched so note positions stay
/// exact; only the step used for accumulators is clamped. Without a clock the
/// sampler runs its own time base from zero using wall deltas.
#[derive(Clone, Debug)]
pub struct ClockSampler {
    last_sampled: Option<f64>,
    skip_step: bool,
    synthetic_time: f64,
    max_step_s: f32,
    epsilon_s: f64,
}

impl Default for ClockSampler {
    fn default() -> Self {
        Self {
            last_sampled: None,
            skip_step: false,
            synthetic_time: 0.0,
            max_step_s: MAX_STEP_S,
            epsilon_s: BACKWARD_JUMP_EPSILON_S,
        }
    }
}

impl ClockSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current media time without consuming a sample.
    pub fn peek(&self, clock: Option<&dyn MediaClock>) -> f64 {
        match clock {
            Some(c) => {
                let t = c.current_time();
                if t.is_finite() { t } else { self.last_sampled.unwrap_or(0.0) }
            }
            None => self.synthetic_time,
        }
    }

    pub fn sample(&mut self, clock: Option<&dyn MediaClock>, wall_dt: f32) -> ClockSample {
        let skip_step = std::mem::take(&mut self.skip_step);
        let Some(clock) = clock else {
            let dt = if skip_step { 0.0 } else { clamp_step(wall_dt, self.max_step_s) };
            self.synthetic_time += f64::from(dt);
            return ClockSample::Advanced { media_time: self.synthetic_time, dt };
        };

        let raw = clock.current_time();
        let now = if raw.is_finite() { raw } else { self.last_sampled.unwrap_or(0.0) };
        let sample = match self.last_sampled {
            None => ClockSample::Advanced { media_time: now, dt: 0.0 },
            Some(prev) if now + self.epsilon_s < prev => ClockSample::Rewound { from: prev, to: now },
            Some(_) if skip_step => ClockSample::Advanced { media_time: now, dt: 0.0 },
            Some(prev) => ClockSample::Advanced {
                media_time: now,
                dt: clamp_step((now - prev) as f32, self.max_step_s),
            },
        };
        self.last_sampled = Some(now);

        match sample {
            ClockSample::Advanced { media_time, .. } if clock.is_ended() => ClockSample::Ended { media_time },
            other => other,
        }
    }

    /// Re-anchors on resume. With a clock, the reading taken now becomes the
    /// reference for the next step, so a seek made while paused is simply the
    /// new position. Without one, the next synthetic step is zero.
    pub fn reanchor(&mut self, clock: Option<&dyn MediaClock>) {
        match clock {
            Some(_) => self.last_sampled = Some(self.peek(clock)),
            None => self.skip_step = true,
        }
    }

    pub fn reset(&mut self) {
        self.last_sampled = None;
        self.skip_step = false;
        self.synthetic_time = 0.0;
    }
}

#[inline(always)]
fn clamp_step(dt: f32, max_step: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max_step) } else { 0.0 }
}

/// Wall-clock playback position with play/pause/seek, optionally bounded by a
/// content length. Looping wraps back to zero, which gameplay sees as a
/// backward jump.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    origin: Instant,
    base_s: f64,
    playing: bool,
    length_s: Option<f64>,
    looping: bool,
}

impl PlaybackClock {
    pub fn new(length_s: Option<f64>, looping: bool) -> Self {
        Self {
            origin: Instant::now(),
            base_s: 0.0,
            playing: false,
            length_s: length_s.filter(|l| l.is_finite() && *l > 0.0),
            looping,
        }
    }

    fn raw_time(&self) -> f64 {
        if self.playing {
            self.base_s + self.origin.elapsed().as_secs_f64()
        } else {
            self.base_s
        }
    }

    pub fn play(&mut self) {
        if !self.playing {
            self.origin = Instant::now();
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.base_s = self.raw_time();
            self.playing = false;
        }
    }

    pub fn seek(&mut self, position_s: f64) {
        self.base_s = if position_s.is_finite() { position_s.max(0.0) } else { 0.0 };
        self.origin = Instant::now();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl MediaClock for PlaybackClock {
    fn current_time(&self) -> f64 {
        let t = self.raw_time();
        match self.length_s {
            Some(len) if self.looping => t % len,
            Some(len) => t.min(len),
            None => t,
        }
    }

    fn is_ended(&self) -> bool {
        !self.looping && self.length_s.is_some_and(|len| self.raw_time() >= len)
    }
}

/// Hand-driven clock for tests.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ManualClock {
    pub time: f64,
    pub ended: bool,
}

#[cfg(test)]
impl ManualClock {
    pub fn at(time: f64) -> Self {
        Self { time, ended: false }
    }
}

#[cfg(test)]
impl MediaClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn is_ended(&self) -> bool {
        self.ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_anchors_with_zero_step() {
        let mut s = ClockSampler::new();
        let c = ManualClock::at(4.0);
        assert_eq!(s.sample(Some(&c), 0.016), ClockSample::Advanced { media_time: 4.0, dt: 0.0 });
    }

    #[test]
    fn step_is_clamped_but_media_time_is_not() {
        let mut s = ClockSampler::new();
        let mut c = ManualClock::at(1.0);
        s.sample(Some(&c), 0.0);
        c.time = 3.0;
        match s.sample(Some(&c), 0.0) {
            ClockSample::Advanced { media_time, dt } => {
                assert_eq!(media_time, 3.0);
                assert!((dt - MAX_STEP_S).abs() < f32::EPSILON);
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn small_backward_jitter_is_tolerated() {
        let mut s = ClockSampler::new();
        let mut c = ManualClock::at(2.0);
        s.sample(Some(&c), 0.0);
        c.time = 1.995;
        assert!(matches!(s.sample(Some(&c), 0.0), ClockSample::Advanced { dt, .. } if dt == 0.0));
    }

    #[test]
    fn backward_jump_is_reported() {
        let mut s = ClockSampler::new();
        let mut c = ManualClock::at(10.0);
        s.sample(Some(&c), 0.0);
        c.time = 0.0;
        assert_eq!(s.sample(Some(&c), 0.0), ClockSample::Rewound { from: 10.0, to: 0.0 });
    }

    #[test]
    fn reanchor_hides_the_paused_stretch() {
        let mut s = ClockSampler::new();
        let mut c = ManualClock::at(1.0);
        s.sample(Some(&c), 0.0);
        c.time = 1.8;
        s.reanchor(Some(&c));
        assert_eq!(s.sample(Some(&c), 0.0), ClockSample::Advanced { media_time: 1.8, dt: 0.0 });
        c.time = 1.82;
        assert!(matches!(s.sample(Some(&c), 0.0), ClockSample::Advanced { dt, .. } if dt > 0.0));
    }

    #[test]
    fn seek_back_while_paused_continues_from_the_new_position() {
        let mut s = ClockSampler::new();
        let mut c = ManualClock::at(6.0);
        s.sample(Some(&c), 0.0);
        c.time = 1.0;
        s.reanchor(Some(&c));
        assert_eq!(s.sample(Some(&c), 0.0), ClockSample::Advanced { media_time: 1.0, dt: 0.0 });
        c.time = 0.5;
        assert_eq!(s.sample(Some(&c), 0.0), ClockSample::Rewound { from: 1.0, to: 0.5 });
    }

    #[test]
    fn reanchor_without_clock_zeroes_the_next_step() {
        let mut s = ClockSampler::new();
        s.sample(None, 0.02);
        s.reanchor(None);
        assert_eq!(s.sample(None, 0.03), ClockSample::Advanced { media_time: f64::from(0.02f32), dt: 0.0 });
    }

    #[test]
    fn ended_clock_is_reported() {
        let mut s = ClockSampler::new();
        let c = ManualClock { time: 30.0, ended: true };
        assert_eq!(s.sample(Some(&c), 0.0), ClockSample::Ended { media_time: 30.0 });
    }

    #[test]
    fn missing_clock_runs_from_zero_on_wall_time() {
        let mut s = ClockSampler::new();
        assert_eq!(s.peek(None), 0.0);
        s.sample(None, 0.02);
        s.sample(None, 1.0);
        let t = s.peek(None);
        assert!((t - 0.07).abs() < 1e-6, "got {t}");
    }

    #[test]
    fn paused_playback_clock_is_frozen() {
        let mut c = PlaybackClock::new(None, false);
        c.seek(5.0);
        assert_eq!(c.current_time(), 5.0);
        assert!(!c.is_playing());
        assert!(!c.is_ended());
    }

    #[test]
    fn bounded_playback_clock_ends_or_wraps() {
        let mut once = PlaybackClock::new(Some(2.0), false);
        once.seek(3.0);
        assert_eq!(once.current_time(), 2.0);
        assert!(once.is_ended());

        let mut looped = PlaybackClock::new(Some(2.0), true);
        looped.seek(3.0);
        assert_eq!(looped.current_time(), 1.0);
        assert!(!looped.is_ended());
    }
}

use log::info;
use rand::Rng;

use crate::game::chart::{ChartEntry, ChartSource};
use crate::game::note::{Note, NoteOrigin, NoteRegistry};
use crate::game::timing_windows::{LANES, LaneGeometry};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChartMode {
    /// No source decided yet; nothing spawns.
    Loading,
    Chart,
    /// No usable chart; notes spawn on a fixed simulated-time interval.
    Random,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    mode: ChartMode,
    entries: Vec<ChartEntry>,
    cursor: usize,
    spawn_timer_ms: f32,
    spawn_interval_ms: f32,
}

#[inline(always)]
fn clamp_lane(lane: i64) -> usize {
    lane.clamp(0, LANES as i64 - 1) as usize
}

impl Scheduler {
    pub fn new(spawn_interval_ms: f32) -> Self {
        Self {
            mode: ChartMode::Loading,
            entries: Vec::new(),
            cursor: 0,
            spawn_timer_ms: 0.0,
            spawn_interval_ms: if spawn_interval_ms > 0.0 { spawn_interval_ms } else { 1.0 },
        }
    }

    pub fn set_source(&mut self, source: ChartSource) -> ChartMode {
        match source {
            ChartSource::Chart(entries) => {
                info!("Scheduler using chart ({} notes).", entries.len());
                self.entries = entries;
                self.mode = ChartMode::Chart;
            }
            ChartSource::Missing => {
                info!("Scheduler falling back to random spawns.");
                self.entries.clear();
                self.mode = ChartMode::Random;
            }
        }
        self.rewind();
        self.mode
    }

    pub const fn mode(&self) -> ChartMode {
        self.mode
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Back to the top of the chart, for a fresh session.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.spawn_timer_ms = 0.0;
    }

    /// Materializes everything due at `media_time` into `registry`. Travel time
    /// comes from the geometry passed in, so a layout change only affects notes
    /// spawned from here on. Returns the number of notes spawned.
    pub fn spawn_due<R: Rng + ?Sized>(
        &mut self,
        media_time: f64,
        dt: f32,
        geometry: &LaneGeometry,
        rng: &mut R,
        registry: &mut NoteRegistry,
    ) -> usize {
        let travel = geometry.travel_time_s();
        match self.mode {
            ChartMode::Loading => 0,
            ChartMode::Chart => {
                let start = self.cursor;
                while let Some(entry) = self.entries.get(self.cursor) {
                    let spawn_time = entry.t - travel;
                    if media_time < spawn_time {
                        break;
                    }
                    registry.insert(Note {
                        lane: clamp_lane(entry.lane),
                        hit_time: entry.t,
                        spawn_time,
                        origin: NoteOrigin::Chart { index: self.cursor },
                    });
                    self.cursor += 1;
                }
                self.cursor - start
            }
            ChartMode::Random => {
                self.spawn_timer_ms += dt.max(0.0) * 1000.0;
                if self.spawn_timer_ms < self.spawn_interval_ms {
                    return 0;
                }
                self.spawn_timer_ms -= self.spawn_interval_ms;
                registry.insert(Note {
                    lane: rng.random_range(0..LANES),
                    hit_time: media_time + travel,
                    spawn_time: media_time,
                    origin: NoteOrigin::Random,
                });
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn chart(entries: &[(f64, i64)]) -> ChartSource {
        ChartSource::from_entries(entries.iter().map(|&(t, lane)| ChartEntry { t, lane }).collect())
    }

    #[test]
    fn loading_spawns_nothing() {
        let mut s = Scheduler::new(700.0);
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(s.spawn_due(100.0, 0.05, &LaneGeometry::default(), &mut rng, &mut reg), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn chart_notes_spawn_one_travel_time_early() {
        let geometry = LaneGeometry { hit_line_px: 300.0, overshoot_px: 20.0, note_speed_px_per_s: 320.0 };
        let mut s = Scheduler::new(700.0);
        s.set_source(chart(&[(2.0, 1), (3.0, 2)]));
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);

        // Travel time is exactly 1s.
        assert_eq!(s.spawn_due(0.99, 0.0, &geometry, &mut rng, &mut reg), 0);
        assert_eq!(s.spawn_due(1.0, 0.0, &geometry, &mut rng, &mut reg), 1);
        let n = reg.lane(1)[0];
        assert_eq!(n.hit_time, 2.0);
        assert_eq!(n.spawn_time, 1.0);
        assert_eq!(n.origin, NoteOrigin::Chart { index: 0 });
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn a_late_tick_catches_up_in_order() {
        let mut s = Scheduler::new(700.0);
        s.set_source(chart(&[(1.0, 0), (1.5, 1), (9.0, 2)]));
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(s.spawn_due(5.0, 0.05, &LaneGeometry::default(), &mut rng, &mut reg), 2);
        assert_eq!(s.cursor(), 2);
        // Cursor never moves back even if time does.
        assert_eq!(s.spawn_due(0.0, 0.05, &LaneGeometry::default(), &mut rng, &mut reg), 0);
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn chart_lanes_are_clamped_at_spawn() {
        let mut s = Scheduler::new(700.0);
        s.set_source(chart(&[(0.0, -3), (0.0, 42)]));
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        s.spawn_due(0.0, 0.0, &LaneGeometry::default(), &mut rng, &mut reg);
        assert_eq!(reg.lane(0).len(), 1);
        assert_eq!(reg.lane(LANES - 1).len(), 1);
    }

    #[test]
    fn geometry_change_does_not_touch_spawned_notes() {
        let mut geometry = LaneGeometry::default();
        let mut s = Scheduler::new(700.0);
        s.set_source(chart(&[(2.0, 0), (6.0, 1)]));
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        s.spawn_due(0.1, 0.0, &geometry, &mut rng, &mut reg);
        assert_eq!(reg.len(), 1);
        let before = reg.lane(0)[0];

        geometry.note_speed_px_per_s *= 2.0;
        let travel = geometry.travel_time_s();
        s.spawn_due(6.0 - travel, 0.0, &geometry, &mut rng, &mut reg);
        assert_eq!(reg.lane(0)[0], before);
        assert!((reg.lane(1)[0].spawn_time - (6.0 - travel)).abs() < 1e-9);
    }

    #[test]
    fn missing_chart_falls_back_to_fixed_interval() {
        let mut s = Scheduler::new(700.0);
        assert_eq!(s.set_source(ChartSource::Missing), ChartMode::Random);
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);
        let geometry = LaneGeometry::default();

        let mut spawned = 0;
        let mut t = 0.0;
        // 2.1 simulated seconds in 50ms steps.
        for _ in 0..42 {
            t += 0.05;
            spawned += s.spawn_due(t, 0.05, &geometry, &mut rng, &mut reg);
        }
        assert_eq!(spawned, 3);
        assert!(reg.iter().all(|n| n.origin == NoteOrigin::Random && n.lane < LANES));
    }

    #[test]
    fn random_mode_ignores_media_time() {
        let mut s = Scheduler::new(700.0);
        s.set_source(ChartSource::Missing);
        let mut reg = NoteRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            s.spawn_due(0.0, 0.0, &LaneGeometry::default(), &mut rng, &mut reg);
        }
        assert!(reg.is_empty(), "no simulated time, no spawns");
    }
}

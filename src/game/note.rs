use crate::game::timing_windows::LANES;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoteOrigin {
    /// Spawned from the chart entry at `index`.
    Chart { index: usize },
    Random,
    /// Injected by the jammer feed. Drawn differently, judged the same.
    Jammer,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Note {
    pub lane: usize,
    /// Media time at which the note crosses the hit line.
    pub hit_time: f64,
    pub spawn_time: f64,
    pub origin: NoteOrigin,
}

/// Signed distance from the hit line in pixels; positive once the note has
/// passed it. Derived from time alone so repeated calls never drift.
#[inline(always)]
pub fn distance_px(media_time: f64, hit_time: f64, note_speed_px_per_s: f32) -> f32 {
    ((media_time - hit_time) * f64::from(note_speed_px_per_s)) as f32
}

impl Note {
    #[inline(always)]
    pub fn distance_px(&self, media_time: f64, note_speed_px_per_s: f32) -> f32 {
        distance_px(media_time, self.hit_time, note_speed_px_per_s)
    }
}

/// In-flight notes, bucketed per lane in spawn order.
///
/// Removing a note from here is the only way it gets resolved, so a note can
/// never be judged twice.
#[derive(Clone, Debug, Default)]
pub struct NoteRegistry {
    lanes: [Vec<Note>; LANES],
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: Note) {
        let lane = note.lane.min(LANES - 1);
        self.lanes[lane].push(Note { lane, ..note });
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(Vec::is_empty)
    }

    pub fn lane(&self, lane: usize) -> &[Note] {
        self.lanes.get(lane).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.lanes.iter().flatten()
    }

    /// Index and signed distance of the note closest to the hit line in
    /// `lane`. Ties keep the first one found.
    pub fn nearest(&self, lane: usize, media_time: f64, note_speed_px_per_s: f32) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, note) in self.lane(lane).iter().enumerate() {
            let d = note.distance_px(media_time, note_speed_px_per_s);
            match best {
                Some((_, best_d)) if d.abs() >= best_d.abs() => {}
                _ => best = Some((idx, d)),
            }
        }
        best
    }

    pub fn take(&mut self, lane: usize, idx: usize) -> Option<Note> {
        let bucket = self.lanes.get_mut(lane)?;
        (idx < bucket.len()).then(|| bucket.remove(idx))
    }

    /// Removes and returns every note further than `miss_window_px` past the
    /// hit line, ordered by hit time.
    pub fn drain_expired(&mut self, media_time: f64, note_speed_px_per_s: f32, miss_window_px: f32) -> Vec<Note> {
        let mut expired = Vec::new();
        for bucket in &mut self.lanes {
            bucket.retain(|n| {
                if n.distance_px(media_time, note_speed_px_per_s) > miss_window_px {
                    expired.push(*n);
                    false
                } else {
                    true
                }
            });
        }
        expired.sort_by(|a, b| a.hit_time.total_cmp(&b.hit_time));
        expired
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.lanes {
            bucket.clear();
        }
    }
}

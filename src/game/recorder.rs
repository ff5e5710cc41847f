use log::info;

use crate::game::chart::ChartEntry;

/// Captures taps as chart entries so a play can be turned into a new chart.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    recording: bool,
    taps: Vec<ChartEntry>,
}

#[inline(always)]
fn round_to_ms(t: f64) -> f64 {
    (t * 1000.0).round() / 1000.0
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn taps(&self) -> &[ChartEntry] {
        &self.taps
    }

    /// Starts a fresh take; anything captured before is discarded.
    pub fn start(&mut self) {
        self.taps.clear();
        self.recording = true;
        info!("Recording started.");
    }

    /// Stops recording and returns the take. `None` if nothing was recording.
    pub fn stop(&mut self) -> Option<Vec<ChartEntry>> {
        if !self.recording {
            return None;
        }
        self.recording = false;
        info!("Recording stopped ({} taps).", self.taps.len());
        Some(self.taps().to_vec())
    }

    pub fn record(&mut self, media_time: f64, lane: usize) {
        if !self.recording || !media_time.is_finite() {
            return;
        }
        self.taps.push(ChartEntry {
            t: round_to_ms(media_time.max(0.0)),
            lane: lane as i64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::{ChartSource, export_json, parse_chart_str};

    #[test]
    fn taps_outside_recording_are_ignored() {
        let mut r = Recorder::new();
        r.record(1.0, 0);
        assert!(r.taps().is_empty());
        assert!(r.stop().is_none());
    }

    #[test]
    fn times_are_rounded_to_milliseconds() {
        let mut r = Recorder::new();
        r.start();
        r.record(1.23456, 2);
        r.record(0.0004, 1);
        let taps = r.stop().unwrap();
        assert_eq!(taps, vec![ChartEntry { t: 1.235, lane: 2 }, ChartEntry { t: 0.0, lane: 1 }]);
    }

    #[test]
    fn starting_again_discards_the_previous_take() {
        let mut r = Recorder::new();
        r.start();
        r.record(3.0, 3);
        r.stop();
        r.start();
        assert!(r.taps().is_empty());
    }

    #[test]
    fn recorded_chart_round_trips_through_the_loader() {
        let mut r = Recorder::new();
        r.start();
        r.record(0.5, 1);
        r.record(2.0, 0);
        let taps = r.stop().unwrap();

        let text = export_json(&taps).unwrap();
        let loaded = parse_chart_str(&text).unwrap();
        assert_eq!(loaded, taps);
        assert_eq!(
            ChartSource::from_entries(loaded),
            ChartSource::Chart(vec![ChartEntry { t: 0.5, lane: 1 }, ChartEntry { t: 2.0, lane: 0 }])
        );
    }
}

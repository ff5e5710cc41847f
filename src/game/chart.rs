use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One authored (or recorded) tap. Same shape on the way in and on the way out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    /// Hit time on the media clock, seconds.
    pub t: f64,
    /// Unclamped lane; clamped into the playfield only when the note spawns.
    pub lane: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChartSource {
    /// Sanitized, time-ordered, non-empty.
    Chart(Vec<ChartEntry>),
    Missing,
}

impl ChartSource {
    pub fn from_entries(entries: Vec<ChartEntry>) -> Self {
        if entries.is_empty() {
            Self::Missing
        } else {
            Self::Chart(entries)
        }
    }
}

fn entry_from_value(v: &Value) -> Option<ChartEntry> {
    let obj = v.as_object()?;
    let t = obj.get("t")?.as_f64()?;
    let lane = obj.get("lane")?.as_f64()?;
    if !t.is_finite() || t < 0.0 || !lane.is_finite() {
        return None;
    }
    Some(ChartEntry { t, lane: lane.floor() as i64 })
}

/// Accepts either a bare list of `{t, lane}` or an object with a `notes` list.
/// Entries that fail validation are dropped one by one; `None` means the
/// document has neither shape.
pub fn sanitize(doc: &Value) -> Option<Vec<ChartEntry>> {
    let raw = match doc {
        Value::Array(items) => items,
        Value::Object(map) => map.get("notes")?.as_array()?,
        _ => return None,
    };
    let mut entries: Vec<ChartEntry> = raw.iter().filter_map(entry_from_value).collect();
    let dropped = raw.len() - entries.len();
    if dropped > 0 {
        warn!("Dropped {dropped} malformed chart entries.");
    }
    // Stable, so same-time entries keep their authored order.
    entries.sort_by(|a, b| a.t.total_cmp(&b.t));
    Some(entries)
}

pub fn parse_chart_str(text: &str) -> Result<Vec<ChartEntry>, String> {
    let doc: Value = serde_json::from_str(text).map_err(|e| format!("chart is not valid JSON: {e}"))?;
    sanitize(&doc).ok_or_else(|| "chart has neither a note list nor a 'notes' field".to_string())
}

pub fn load_chart_file(path: &Path) -> Result<Vec<ChartEntry>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read chart '{}': {e}", path.display()))?;
    parse_chart_str(&text)
}

/// Loads a chart, degrading to [`ChartSource::Missing`] on any failure.
pub fn load_source(path: &Path) -> ChartSource {
    match load_chart_file(path) {
        Ok(entries) => {
            let source = ChartSource::from_entries(entries);
            match &source {
                ChartSource::Chart(e) => info!("Loaded chart '{}' ({} notes).", path.display(), e.len()),
                ChartSource::Missing => warn!("Chart '{}' has no usable notes.", path.display()),
            }
            source
        }
        Err(e) => {
            warn!("{e}");
            ChartSource::Missing
        }
    }
}

pub fn export_json(entries: &[ChartEntry]) -> Result<String, String> {
    serde_json::to_string_pretty(entries).map_err(|e| format!("failed to serialize chart: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn accepts_bare_list_and_notes_object() {
        let bare = json!([{"t": 1.0, "lane": 2}]);
        let wrapped = json!({"notes": [{"t": 1.0, "lane": 2}], "title": "x"});
        assert_eq!(sanitize(&bare), sanitize(&wrapped));
        assert_eq!(sanitize(&bare).unwrap(), vec![ChartEntry { t: 1.0, lane: 2 }]);
    }

    #[test]
    fn drops_entries_missing_numeric_fields() {
        let doc = json!([
            {"t": 0.5, "lane": 0},
            {"t": "1.0", "lane": 1},
            {"lane": 2},
            {"t": 2.0},
            null,
            {"t": -1.0, "lane": 0},
            {"t": 3.0, "lane": 7}
        ]);
        let entries = sanitize(&doc).expect("list shape");
        assert_eq!(
            entries,
            vec![ChartEntry { t: 0.5, lane: 0 }, ChartEntry { t: 3.0, lane: 7 }],
            "lane 7 survives load; clamping happens at spawn"
        );
    }

    #[test]
    fn entries_come_out_time_ordered() {
        let doc = json!([{"t": 2.0, "lane": 0}, {"t": 1.0, "lane": 1}, {"t": 1.0, "lane": 3}]);
        let entries = sanitize(&doc).unwrap();
        let lanes: Vec<i64> = entries.iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![1, 3, 0]);
    }

    #[test]
    fn wrong_shapes_are_rejected_without_panicking() {
        assert!(sanitize(&json!(42)).is_none());
        assert!(sanitize(&json!({"notes": "nope"})).is_none());
        assert!(parse_chart_str("{not json").is_err());
        assert!(parse_chart_str("{\"bpm\": 120}").is_err());
    }

    #[test]
    fn empty_chart_is_missing() {
        assert_eq!(ChartSource::from_entries(Vec::new()), ChartSource::Missing);
    }

    #[test]
    fn unreadable_file_degrades_to_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_source(&dir.path().join("absent.json")), ChartSource::Missing);

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert_eq!(load_source(&path), ChartSource::Missing);
    }

    #[test]
    fn exported_chart_loads_back() {
        let entries = vec![ChartEntry { t: 0.5, lane: 0 }, ChartEntry { t: 1.0, lane: 2 }];
        let text = export_json(&entries).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        assert_eq!(load_source(file.path()), ChartSource::Chart(entries));
    }
}

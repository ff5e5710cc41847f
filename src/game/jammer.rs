use log::{debug, info};
use rand::Rng;
use serde_json::Value;

use crate::game::note::{Note, NoteOrigin};
use crate::game::timing_windows::LANES;

pub const JAMMER_MIN_OFFSET_S: f64 = 0.6;
pub const JAMMER_MAX_OFFSET_S: f64 = 1.2;
pub const JAMMER_RATE_LIMIT_S: f64 = 1.0;
pub const JAMMER_MAX_BURST: usize = 12;

const ANONYMOUS: &str = "anonymous";

/// A validated `spawn_notes` event. `count` is the raw requested amount; the
/// injector clamps it.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub count: f64,
    pub by: String,
}

// Loose truthiness, matching how feed producers tend to send flags ("1", 1, true).
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn requested_count(v: Option<&Value>) -> f64 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse().unwrap_or(f64::NAN) }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => f64::NAN,
    };
    if n.is_nan() || n == 0.0 { 1.0 } else { n }
}

fn attribution(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|x| x != 0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => ANONYMOUS.to_string(),
    }
}

pub fn spawn_request_from_value(doc: &Value) -> Option<SpawnRequest> {
    let obj = doc.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("spawn_notes") {
        return None;
    }
    if !obj.get("jammer").is_some_and(is_truthy) {
        return None;
    }
    Some(SpawnRequest {
        count: requested_count(obj.get("count")),
        by: attribution(obj.get("by")),
    })
}

/// Parses one raw feed message. Anything that is not a jammer spawn request
/// yields `None`.
pub fn parse_spawn_request(text: &str) -> Option<SpawnRequest> {
    let doc: Value = serde_json::from_str(text).ok()?;
    spawn_request_from_value(&doc)
}

/// Number of notes a request turns into, in `[1, max_burst]`.
pub fn burst_size(requested: f64, max_burst: usize) -> usize {
    let max = max_burst.max(1) as f64;
    let n = if requested.is_nan() { 1.0 } else { requested.clamp(1.0, max) };
    n.ceil() as usize
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JammerTuning {
    pub min_offset_s: f64,
    pub max_offset_s: f64,
    pub rate_limit_s: f64,
    pub max_burst: usize,
}

impl Default for JammerTuning {
    fn default() -> Self {
        Self {
            min_offset_s: JAMMER_MIN_OFFSET_S,
            max_offset_s: JAMMER_MAX_OFFSET_S,
            rate_limit_s: JAMMER_RATE_LIMIT_S,
            max_burst: JAMMER_MAX_BURST,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JammerEntry {
    pub scheduled_spawn_time: f64,
    pub lane: usize,
}

#[derive(Clone, Debug, Default)]
pub struct JammerInjector {
    tuning: JammerTuning,
    queue: Vec<JammerEntry>,
    last_accepted: Option<f64>,
}

impl JammerInjector {
    pub fn new(tuning: JammerTuning) -> Self {
        Self { tuning, queue: Vec::new(), last_accepted: None }
    }

    pub fn pending(&self) -> &[JammerEntry] {
        &self.queue
    }

    /// Queues a burst for `req` if the rate limit allows it. Returns the number
    /// of entries queued; rejected requests are dropped, not deferred.
    pub fn on_spawn_request<R: Rng + ?Sized>(&mut self, req: &SpawnRequest, media_time: f64, rng: &mut R) -> Option<usize> {
        if self.last_accepted.is_some_and(|last| media_time - last < self.tuning.rate_limit_s) {
            debug!("Jammer request by {} rate limited at {media_time:.3}s.", req.by);
            return None;
        }
        self.last_accepted = Some(media_time);

        let count = burst_size(req.count, self.tuning.max_burst);
        let (lo, hi) = (self.tuning.min_offset_s, self.tuning.max_offset_s);
        for _ in 0..count {
            let offset = if hi > lo { rng.random_range(lo..hi) } else { lo };
            self.queue.push(JammerEntry {
                scheduled_spawn_time: media_time + offset,
                lane: rng.random_range(0..LANES),
            });
        }
        info!("Jammer notes by {} accepted ({count} queued).", req.by);
        Some(count)
    }

    /// Removes every entry due at `media_time` and returns it as a note that
    /// reaches the hit line `travel_time_s` after its scheduled spawn.
    pub fn materialize_due(&mut self, media_time: f64, travel_time_s: f64) -> Vec<Note> {
        let mut due = Vec::new();
        self.queue.retain(|e| {
            if media_time >= e.scheduled_spawn_time {
                due.push(Note {
                    lane: e.lane,
                    hit_time: e.scheduled_spawn_time + travel_time_s,
                    spawn_time: e.scheduled_spawn_time,
                    origin: NoteOrigin::Jammer,
                });
                false
            } else {
                true
            }
        });
        due
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Fresh session: empty queue and no rate-limit history.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.last_accepted = None;
    }
}

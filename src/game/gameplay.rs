use crate::core::clock::{ClockSample, ClockSampler, MediaClock};
use crate::game::chart::{ChartEntry, ChartSource};
use crate::game::jammer::{self, JammerInjector, JammerTuning, SpawnRequest};
use crate::game::judgment::{self, Judgment, MissKind};
use crate::game::note::{Note, NoteRegistry};
use crate::game::recorder::Recorder;
use crate::game::scheduler::{ChartMode, Scheduler};
use crate::game::session::{EndReason, Lifecycle, Mode, Session};
use crate::game::stage_stats::SessionSummary;
use crate::game::timing_windows::{JudgeWindows, LANES, LaneGeometry, RANDOM_SPAWN_INTERVAL_MS};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// Everything the engine needs to know about timing and layout. Built by the
/// host (usually from config) and handed in; the engine never reads globals.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tuning {
    pub windows: JudgeWindows,
    pub geometry: LaneGeometry,
    pub spawn_interval_ms: f32,
    pub jammer: JammerTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            windows: JudgeWindows::default(),
            geometry: LaneGeometry::default(),
            spawn_interval_ms: RANDOM_SPAWN_INTERVAL_MS,
            jammer: JammerTuning::default(),
        }
    }
}

/// Discrete state changes for the presentation layer, in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    ChartStatus(String),
    SessionStarted { mode: Mode },
    Paused,
    Resumed,
    Judged(Judgment),
    LifeChanged { life: u32 },
    JammerAccepted { by: String, count: usize },
    RecordingStarted,
    RecordingStopped { chart: Vec<ChartEntry> },
    SessionEnded { reason: EndReason, summary: SessionSummary },
    Restarted,
}

pub struct State {
    pub session: Session,
    tuning: Tuning,
    scheduler: Scheduler,
    registry: NoteRegistry,
    jammer: JammerInjector,
    recorder: Recorder,
    sampler: ClockSampler,
    rng: StdRng,
    // A chart swapped in mid-session waits here for the next start or restart.
    deferred_source: Option<ChartSource>,

    // Inputs land here between ticks and are applied at the next tick boundary.
    pending_taps: VecDeque<usize>,
    pending_requests: VecDeque<SpawnRequest>,

    notifications: Vec<Notification>,
    media_time: f64,
    log_timer: f32,
}

pub fn init(tuning: Tuning, seed: Option<u64>) -> State {
    info!("Initializing gameplay engine...");
    let rng = match seed {
        Some(seed) => {
            debug!("Using fixed RNG seed {seed}.");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };
    State {
        session: Session::new(Mode::Streamer),
        tuning,
        scheduler: Scheduler::new(tuning.spawn_interval_ms),
        registry: NoteRegistry::new(),
        jammer: JammerInjector::new(tuning.jammer),
        recorder: Recorder::new(),
        sampler: ClockSampler::new(),
        rng,
        deferred_source: None,
        pending_taps: VecDeque::new(),
        pending_requests: VecDeque::new(),
        notifications: Vec::new(),
        media_time: 0.0,
        log_timer: 0.0,
    }
}

/// Installs the chart source. While a session is running or paused the swap
/// is held back until the session is started again or restarted, so notes
/// already spawned from the old cursor are never spawned a second time.
pub fn set_chart_source(state: &mut State, source: ChartSource) {
    if matches!(state.session.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
        info!("Chart source change deferred until the next session.");
        state.deferred_source = Some(source);
        return;
    }
    apply_chart_source(state, source);
}

fn apply_chart_source(state: &mut State, source: ChartSource) {
    let status = match &source {
        ChartSource::Chart(entries) => format!("loaded ({} notes)", entries.len()),
        ChartSource::Missing => "missing, using fallback".to_string(),
    };
    state.scheduler.set_source(source);
    state.notifications.push(Notification::ChartStatus(status));
}

fn reset_play_state(state: &mut State) {
    if let Some(source) = state.deferred_source.take() {
        apply_chart_source(state, source);
    }
    state.registry.clear();
    state.jammer.reset();
    state.scheduler.rewind();
    state.sampler.reset();
    state.pending_taps.clear();
    state.pending_requests.clear();
    state.media_time = 0.0;
    state.log_timer = 0.0;
}

/// Starts a fresh session. Ignored while one is already in progress.
pub fn start(state: &mut State, mode: Mode) -> bool {
    if matches!(state.session.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
        warn!("Ignoring start: a session is already in progress.");
        return false;
    }
    reset_play_state(state);
    state.session = Session::new(mode);
    state.session.lifecycle = Lifecycle::Running;
    info!("Session started in {mode:?} mode (chart mode {:?}).", state.scheduler.mode());
    state.notifications.push(Notification::SessionStarted { mode });
    true
}

pub fn pause(state: &mut State) -> bool {
    if state.session.lifecycle != Lifecycle::Running {
        return false;
    }
    state.session.lifecycle = Lifecycle::Paused;
    state.pending_taps.clear();
    state.pending_requests.clear();
    info!(
        "Session paused at {:.3}s (chart position {}, {} jammer notes pending).",
        state.media_time,
        state.scheduler.cursor(),
        state.jammer.pending().len()
    );
    state.notifications.push(Notification::Paused);
    true
}

/// Resumes from the clock's current position, wherever it was moved to while
/// paused.
pub fn resume(state: &mut State, clock: Option<&dyn MediaClock>) -> bool {
    if state.session.lifecycle != Lifecycle::Paused {
        return false;
    }
    state.session.lifecycle = Lifecycle::Running;
    state.sampler.reanchor(clock);
    info!("Session resumed.");
    state.notifications.push(Notification::Resumed);
    true
}

/// Abandons the current session (running, paused or ended) and goes back to
/// idle. No summary is produced for an abandoned session.
pub fn restart(state: &mut State) -> bool {
    if state.session.lifecycle == Lifecycle::Idle {
        return false;
    }
    reset_play_state(state);
    state.session = Session::new(state.session.mode);
    info!("Session restarted.");
    state.notifications.push(Notification::Restarted);
    true
}

/// Ends the session once; later calls are no-ops. Clears everything in flight
/// so nothing scheduled can fire against the ended session.
pub fn finish(state: &mut State, reason: EndReason) {
    if !matches!(state.session.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
        return;
    }
    state.session.lifecycle = Lifecycle::Ended(reason);
    state.registry.clear();
    state.jammer.clear_queue();
    state.pending_taps.clear();
    state.pending_requests.clear();

    let summary = SessionSummary::from_session(&state.session, Some(reason));
    info!(
        "Session ended ({}): {} judged, score {}, accuracy {:.1}%, grade {}.",
        reason.title(),
        state.session.total_judged(),
        summary.score,
        summary.accuracy,
        summary.grade
    );
    state.notifications.push(Notification::SessionEnded { reason, summary });
}

/// Queues a lane tap for judgement at the next tick. The tap is recorded right
/// away at the current media time if recording is on.
pub fn queue_tap(state: &mut State, clock: Option<&dyn MediaClock>, lane: usize) {
    if state.session.is_ended() {
        return;
    }
    if lane >= LANES {
        debug!("Ignoring tap on out-of-range lane {lane}.");
        return;
    }
    state.recorder.record(state.sampler.peek(clock), lane);
    if state.session.is_running() {
        state.pending_taps.push_back(lane);
    }
}

pub fn queue_spawn_request(state: &mut State, req: SpawnRequest) {
    if state.session.mode != Mode::Streamer || !state.session.is_running() {
        debug!("Ignoring jammer request by {}: feed inactive.", req.by);
        return;
    }
    state.pending_requests.push_back(req);
}

/// Raw feed message entry point. Anything that is not a jammer spawn request
/// is dropped without side effects.
pub fn queue_external_event(state: &mut State, text: &str) {
    match jammer::parse_spawn_request(text) {
        Some(req) => queue_spawn_request(state, req),
        None => debug!("Ignoring feed message: {text}"),
    }
}

pub fn start_recording(state: &mut State) {
    state.recorder.start();
    state.notifications.push(Notification::RecordingStarted);
}

pub fn stop_recording(state: &mut State) {
    if let Some(chart) = state.recorder.stop() {
        state.notifications.push(Notification::RecordingStopped { chart });
    }
}

pub fn toggle_recording(state: &mut State) {
    if state.recorder.is_recording() {
        stop_recording(state);
    } else {
        start_recording(state);
    }
}

/// Replaces lane geometry. Notes already in flight keep their hit times; only
/// spawns from the next tick on use the new travel time.
pub fn set_geometry(state: &mut State, geometry: LaneGeometry) {
    debug!("Lane geometry changed: {geometry:?}");
    state.tuning.geometry = geometry;
}

fn apply_judgment(state: &mut State, judgment: Judgment) {
    let life_before = state.session.life;
    let depleted = state.session.apply(judgment.grade);
    state.notifications.push(Notification::Judged(judgment));
    if state.session.life != life_before {
        state.notifications.push(Notification::LifeChanged { life: state.session.life });
    }
    if depleted {
        info!("Life depleted!");
        finish(state, EndReason::GameOver);
    }
}

/// Judges one tap against the nearest note in `lane` at `media_time`.
///
/// A hit consumes the note. A tap outside the good window is a miss but leaves
/// the note in place, so it can still be hit or expire later. A tap on an empty
/// lane is a miss with no note involved. All misses cost the same.
pub fn judge_tap(state: &mut State, lane: usize, media_time: f64) -> Option<Judgment> {
    if !state.session.is_running() || lane >= LANES {
        return None;
    }
    let speed = state.tuning.geometry.note_speed_px_per_s;
    let judgment = match state.registry.nearest(lane, media_time, speed) {
        None => Judgment {
            lane,
            grade: judgment::JudgeGrade::Miss,
            distance_px: None,
            origin: None,
            miss_kind: Some(MissKind::EmptyLane),
        },
        Some((idx, distance)) => {
            let grade = judgment::classify_distance(distance, &state.tuning.windows);
            let origin = if grade.is_hit() {
                state.registry.take(lane, idx).map(|n| n.origin)
            } else {
                state.registry.lane(lane).get(idx).map(|n| n.origin)
            };
            Judgment {
                lane,
                grade,
                distance_px: Some(distance),
                origin,
                miss_kind: (!grade.is_hit()).then_some(MissKind::OutOfWindow),
            }
        }
    };
    apply_judgment(state, judgment.clone());
    Some(judgment)
}

fn expire_notes(state: &mut State, media_time: f64) {
    if state.registry.is_empty() {
        return;
    }
    let speed = state.tuning.geometry.note_speed_px_per_s;
    let miss_px = state.tuning.windows.miss_px;
    for note in state.registry.drain_expired(media_time, speed, miss_px) {
        if !state.session.is_running() {
            break;
        }
        apply_judgment(
            state,
            Judgment {
                lane: note.lane,
                grade: judgment::JudgeGrade::Miss,
                distance_px: Some(note.distance_px(media_time, speed)),
                origin: Some(note.origin),
                miss_kind: Some(MissKind::Expired),
            },
        );
    }
}

fn apply_spawn_requests(state: &mut State, media_time: f64) {
    while let Some(req) = state.pending_requests.pop_front() {
        if state.session.mode != Mode::Streamer {
            continue;
        }
        if let Some(count) = state.jammer.on_spawn_request(&req, media_time, &mut state.rng) {
            state.notifications.push(Notification::JammerAccepted { by: req.by, count });
        }
    }
}

/// One simulation step. Order within a tick is fixed: clock, feed events,
/// chart/random spawns, jammer spawns, expiry, then queued taps.
pub fn update(state: &mut State, clock: Option<&dyn MediaClock>, wall_dt: f32) {
    if !state.session.is_running() {
        state.pending_taps.clear();
        state.pending_requests.clear();
        return;
    }

    let (media_time, dt) = match state.sampler.sample(clock, wall_dt) {
        ClockSample::Advanced { media_time, dt } => (media_time, dt),
        ClockSample::Rewound { from, to } => {
            info!("Media clock jumped back from {from:.3}s to {to:.3}s. Ending session.");
            finish(state, EndReason::Result);
            return;
        }
        ClockSample::Ended { media_time } => {
            state.media_time = media_time;
            info!("Media reached its end at {media_time:.3}s.");
            finish(state, EndReason::Result);
            return;
        }
    };
    state.media_time = media_time;

    apply_spawn_requests(state, media_time);

    let geometry = state.tuning.geometry;
    state
        .scheduler
        .spawn_due(media_time, dt, &geometry, &mut state.rng, &mut state.registry);
    if state.session.mode == Mode::Streamer {
        for note in state.jammer.materialize_due(media_time, geometry.travel_time_s()) {
            debug!(
                "Jammer note in lane {} spawned at {:.3}s, hits at {:.3}s.",
                note.lane, note.spawn_time, note.hit_time
            );
            state.registry.insert(note);
        }
    }

    expire_notes(state, media_time);

    while let Some(lane) = state.pending_taps.pop_front() {
        if !state.session.is_running() {
            break;
        }
        judge_tap(state, lane, media_time);
    }
    if !state.session.is_running() {
        return;
    }

    state.log_timer += wall_dt;
    if state.log_timer >= 1.0 {
        info!(
            "Time: {:.2}, Combo: {}, Misses: {}, Active Notes: {}",
            media_time,
            state.session.combo,
            state.session.miss_count,
            state.registry.len()
        );
        state.log_timer -= 1.0;
    }
}

pub fn drain_notifications(state: &mut State) -> Vec<Notification> {
    std::mem::take(&mut state.notifications)
}

pub fn summary(state: &State) -> SessionSummary {
    let reason = match state.session.lifecycle {
        Lifecycle::Ended(reason) => Some(reason),
        _ => None,
    };
    SessionSummary::from_session(&state.session, reason)
}

impl State {
    pub fn media_time(&self) -> f64 {
        self.media_time
    }

    pub fn chart_mode(&self) -> ChartMode {
        self.scheduler.mode()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn active_notes(&self) -> impl Iterator<Item = &Note> {
        self.registry.iter()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }
}

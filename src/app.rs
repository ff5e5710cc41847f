use crate::config::Config;
use crate::core::clock::{MediaClock, PlaybackClock};
use crate::core::input::{self, InputCommand};
use crate::core::network;
use crate::game::chart;
use crate::game::gameplay::{self, Notification};
use crate::game::note::NoteOrigin;
use crate::game::session::Lifecycle;
use crate::game::timing_windows::LaneGeometry;
use log::{info, warn};
use std::error::Error;
use std::path::Path;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/// Everything the frame loop reacts to. Producers run on their own threads.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(InputCommand),
    Feed(String),
}

const HELP: &str = "\
Commands:
  streamer | rank      start a session
  d f j k              tap lanes 0-3 (several per line is fine)
  r                    toggle recording
  pause | resume | restart
  seek <seconds>       move the media clock
  speed <px/s>         change note speed for notes spawned from now on
  quit";

pub struct App {
    state: gameplay::State,
    clock: PlaybackClock,
    last_frame_time: Instant,
    pending_exit: bool,
}

impl App {
    fn new(config: &Config) -> Self {
        let mut state = gameplay::init(config.tuning(), config.rng_seed);
        gameplay::set_chart_source(&mut state, chart::load_source(Path::new(&config.chart_path)));
        Self {
            state,
            clock: PlaybackClock::new(config.media_length(), config.loop_media),
            last_frame_time: Instant::now(),
            pending_exit: false,
        }
    }

    fn handle_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Command(cmd) => self.handle_command(cmd),
            AppEvent::Feed(text) => gameplay::queue_external_event(&mut self.state, &text),
        }
    }

    fn handle_command(&mut self, cmd: InputCommand) {
        match cmd {
            InputCommand::Tap(lane) => {
                gameplay::queue_tap(&mut self.state, Some(&self.clock as &dyn MediaClock), lane.index());
            }
            InputCommand::ToggleRecording => gameplay::toggle_recording(&mut self.state),
            InputCommand::Start(mode) => {
                if gameplay::start(&mut self.state, mode) {
                    self.clock.seek(0.0);
                    self.clock.play();
                }
            }
            InputCommand::Pause => {
                if gameplay::pause(&mut self.state) {
                    self.clock.pause();
                }
            }
            InputCommand::Resume => {
                if gameplay::resume(&mut self.state, Some(&self.clock as &dyn MediaClock)) {
                    self.clock.play();
                }
            }
            InputCommand::Restart => {
                if gameplay::restart(&mut self.state) {
                    self.clock.pause();
                    self.clock.seek(0.0);
                }
            }
            InputCommand::Seek(pos) => {
                let playback = if self.clock.is_playing() { "playing" } else { "paused" };
                info!("Seeking media to {pos:.3}s ({playback}).");
                self.clock.seek(pos);
            }
            InputCommand::Speed(px_per_s) => {
                let geometry = LaneGeometry {
                    note_speed_px_per_s: px_per_s,
                    ..self.state.tuning().geometry
                };
                gameplay::set_geometry(&mut self.state, geometry);
            }
            InputCommand::Quit => {
                if self.state.is_recording() {
                    gameplay::stop_recording(&mut self.state);
                }
                if matches!(self.state.session.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
                    println!("{}", gameplay::summary(&self.state));
                }
                self.pending_exit = true;
            }
        }
    }

    fn step(&mut self, delta_time: f32) {
        gameplay::update(&mut self.state, Some(&self.clock as &dyn MediaClock), delta_time);
    }

    fn present(&mut self) {
        for n in gameplay::drain_notifications(&mut self.state) {
            match n {
                Notification::ChartStatus(status) => println!("Chart: {status}"),
                Notification::SessionStarted { mode } => println!(
                    "Session started: {mode:?} ({:?} chart, feed {:?}).",
                    self.state.chart_mode(),
                    network::get_status()
                ),
                Notification::Paused => println!(
                    "Paused at {:.2}s ({} notes in flight).",
                    self.state.media_time(),
                    self.state.active_notes().count()
                ),
                Notification::Resumed => println!("Resumed."),
                Notification::Judged(j) => {
                    let tag = if j.origin == Some(NoteOrigin::Jammer) { " [jammer]" } else { "" };
                    let offset = j.distance_px.map(|d| format!("  {d:+.0}px")).unwrap_or_default();
                    println!("{:<7} lane {}{tag}{offset}  combo {}", j.grade, j.lane, self.state.session.combo);
                }
                Notification::LifeChanged { life } => println!("Life: {life}"),
                Notification::JammerAccepted { by, count } => println!("Jammer notes by {by}! (+{count})"),
                Notification::RecordingStarted => println!("Recording..."),
                Notification::RecordingStopped { chart: taps } => match chart::export_json(&taps) {
                    Ok(json) => println!("Recorded chart ({} taps):\n{json}", taps.len()),
                    Err(e) => warn!("{e}"),
                },
                Notification::SessionEnded { summary, .. } => {
                    self.clock.pause();
                    match serde_json::to_string(&summary) {
                        Ok(json) => info!("Session summary: {json}"),
                        Err(e) => warn!("Failed to serialize session summary: {e}"),
                    }
                    println!("{summary}");
                }
                Notification::Restarted => println!("Back to idle. Type 'streamer' or 'rank' to play."),
            }
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let config = crate::config::get();
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(config.frame_rate_hz.max(1)));

    let (tx, rx) = mpsc::channel::<AppEvent>();
    input::spawn_stdin_reader(tx.clone());
    network::init(tx);

    let mut app = App::new(&config);
    println!("{HELP}");

    while !app.pending_exit {
        let frame_start = Instant::now();
        loop {
            match rx.try_recv() {
                Ok(ev) => app.handle_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    app.pending_exit = true;
                    break;
                }
            }
        }

        let now = Instant::now();
        let delta_time = now.duration_since(app.last_frame_time).as_secs_f32();
        app.last_frame_time = now;
        app.step(delta_time);
        app.present();

        if let Some(remaining) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
    info!("Exiting.");
    Ok(())
}

use crate::game::gameplay::Tuning;
use crate::game::jammer::{self, JammerTuning};
use crate::game::timing_windows::{self, JudgeWindows, LaneGeometry};
use ini::Ini;
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, PoisonError};

const CONFIG_PATH: &str = "jamlane.ini";

const OPTIONS: Option<&str> = Some("Options");
const GAMEPLAY: Option<&str> = Some("Gameplay");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("'{other}' is not a valid LogLevel setting")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    pub chart_path: String,
    pub enable_feed: bool,
    pub feed_url: String,
    pub frame_rate_hz: u32,
    // 0 = unbounded media.
    pub media_length_seconds: f64,
    pub loop_media: bool,
    // None = seed from the OS.
    pub rng_seed: Option<u64>,

    pub note_speed: f32,
    pub hit_line_y: f32,
    pub spawn_overshoot: f32,
    pub perfect_window: f32,
    pub good_window: f32,
    pub miss_window: f32,
    pub spawn_interval_ms: f32,
    pub jammer_min_offset: f64,
    pub jammer_max_offset: f64,
    pub jammer_rate_limit: f64,
    pub jammer_max_burst: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            chart_path: "assets/chart.json".to_string(),
            enable_feed: false,
            feed_url: "ws://localhost:8787".to_string(),
            frame_rate_hz: 60,
            media_length_seconds: 0.0,
            loop_media: false,
            rng_seed: None,
            note_speed: timing_windows::NOTE_SPEED_PX_PER_S,
            hit_line_y: timing_windows::HIT_LINE_Y_PX,
            spawn_overshoot: timing_windows::SPAWN_OVERSHOOT_PX,
            perfect_window: timing_windows::PERFECT_WINDOW_PX,
            good_window: timing_windows::GOOD_WINDOW_PX,
            miss_window: timing_windows::MISS_WINDOW_PX,
            spawn_interval_ms: timing_windows::RANDOM_SPAWN_INTERVAL_MS,
            jammer_min_offset: jammer::JAMMER_MIN_OFFSET_S,
            jammer_max_offset: jammer::JAMMER_MAX_OFFSET_S,
            jammer_rate_limit: jammer::JAMMER_RATE_LIMIT_S,
            jammer_max_burst: jammer::JAMMER_MAX_BURST,
        }
    }
}

impl Config {
    pub fn media_length(&self) -> Option<f64> {
        (self.media_length_seconds > 0.0).then_some(self.media_length_seconds)
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            windows: JudgeWindows {
                perfect_px: self.perfect_window,
                good_px: self.good_window,
                miss_px: self.miss_window,
            },
            geometry: LaneGeometry {
                hit_line_px: self.hit_line_y,
                overshoot_px: self.spawn_overshoot,
                note_speed_px_per_s: self.note_speed,
            },
            spawn_interval_ms: self.spawn_interval_ms,
            jammer: JammerTuning {
                min_offset_s: self.jammer_min_offset,
                max_offset_s: self.jammer_max_offset,
                rate_limit_s: self.jammer_rate_limit,
                max_burst: self.jammer_max_burst,
            },
        }
    }
}

// Global, mutable configuration instance.
static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

// --- File I/O ---

fn default_ini() -> Ini {
    let d = Config::default();
    let mut conf = Ini::new();
    conf.with_section(OPTIONS)
        .set("LogLevel", d.log_level.as_str())
        .set("ChartPath", d.chart_path.as_str())
        .set("EnableFeed", if d.enable_feed { "1" } else { "0" })
        .set("FeedUrl", d.feed_url.as_str())
        .set("FrameRateHz", d.frame_rate_hz.to_string())
        .set("MediaLengthSeconds", d.media_length_seconds.to_string())
        .set("LoopMedia", if d.loop_media { "1" } else { "0" })
        .set("RngSeed", "Auto");
    conf.with_section(GAMEPLAY)
        .set("NoteSpeed", d.note_speed.to_string())
        .set("HitLineY", d.hit_line_y.to_string())
        .set("SpawnOvershoot", d.spawn_overshoot.to_string())
        .set("PerfectWindow", d.perfect_window.to_string())
        .set("GoodWindow", d.good_window.to_string())
        .set("MissWindow", d.miss_window.to_string())
        .set("SpawnIntervalMs", d.spawn_interval_ms.to_string())
        .set("JammerMinOffset", d.jammer_min_offset.to_string())
        .set("JammerMaxOffset", d.jammer_max_offset.to_string())
        .set("JammerRateLimit", d.jammer_rate_limit.to_string())
        .set("JammerMaxBurst", d.jammer_max_burst.to_string());
    conf
}

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    default_ini().write_to_file(path)
}

#[inline(always)]
fn parse_flag(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") || v.eq_ignore_ascii_case("off") {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

#[inline(always)]
fn positive_f32(v: &str) -> Option<f32> {
    v.trim().parse::<f32>().ok().filter(|x| x.is_finite() && *x > 0.0)
}

#[inline(always)]
fn non_negative_f64(v: &str) -> Option<f64> {
    v.trim().parse::<f64>().ok().filter(|x| x.is_finite() && *x >= 0.0)
}

/// Builds a config from parsed INI data. Each key falls back to its default
/// on its own when missing or malformed.
pub fn from_ini(conf: &Ini) -> Config {
    let default = Config::default();
    let opt = |key| conf.get_from(OPTIONS, key);
    let gp = |key| conf.get_from(GAMEPLAY, key);

    let log_level = opt("LogLevel")
        .and_then(|v| LogLevel::from_str(v).map_err(|e| warn!("{e}")).ok())
        .unwrap_or(default.log_level);
    let rng_seed = match opt("RngSeed").map(str::trim) {
        None => default.rng_seed,
        Some(v) if v.is_empty() || v.eq_ignore_ascii_case("auto") => None,
        Some(v) => v.parse::<u64>().map_or_else(
            |_| {
                warn!("'{v}' is not a valid RngSeed, using Auto.");
                None
            },
            Some,
        ),
    };

    Config {
        log_level,
        chart_path: opt("ChartPath")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(default.chart_path, str::to_string),
        enable_feed: opt("EnableFeed").and_then(parse_flag).unwrap_or(default.enable_feed),
        feed_url: opt("FeedUrl")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(default.feed_url, str::to_string),
        frame_rate_hz: opt("FrameRateHz")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|v| v.clamp(1, 1000))
            .unwrap_or(default.frame_rate_hz),
        media_length_seconds: opt("MediaLengthSeconds")
            .and_then(non_negative_f64)
            .unwrap_or(default.media_length_seconds),
        loop_media: opt("LoopMedia").and_then(parse_flag).unwrap_or(default.loop_media),
        rng_seed,
        note_speed: gp("NoteSpeed").and_then(positive_f32).unwrap_or(default.note_speed),
        hit_line_y: gp("HitLineY").and_then(positive_f32).unwrap_or(default.hit_line_y),
        spawn_overshoot: gp("SpawnOvershoot")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|x| x.is_finite() && *x >= 0.0)
            .unwrap_or(default.spawn_overshoot),
        perfect_window: gp("PerfectWindow").and_then(positive_f32).unwrap_or(default.perfect_window),
        good_window: gp("GoodWindow").and_then(positive_f32).unwrap_or(default.good_window),
        miss_window: gp("MissWindow").and_then(positive_f32).unwrap_or(default.miss_window),
        spawn_interval_ms: gp("SpawnIntervalMs").and_then(positive_f32).unwrap_or(default.spawn_interval_ms),
        jammer_min_offset: gp("JammerMinOffset").and_then(non_negative_f64).unwrap_or(default.jammer_min_offset),
        jammer_max_offset: gp("JammerMaxOffset").and_then(non_negative_f64).unwrap_or(default.jammer_max_offset),
        jammer_rate_limit: gp("JammerRateLimit").and_then(non_negative_f64).unwrap_or(default.jammer_rate_limit),
        jammer_max_burst: gp("JammerMaxBurst")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default.jammer_max_burst),
    }
}

/// Reads `path`, creating it with defaults first if it does not exist. Any
/// failure degrades to the default config.
pub fn load_from_path(path: &Path) -> Config {
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }
    match Ini::load_from_file(path) {
        Ok(conf) => {
            let cfg = from_ini(&conf);
            info!("Configuration loaded from '{}'.", path.display());
            cfg
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using defaults.", path.display());
            Config::default()
        }
    }
}

pub fn load() {
    let cfg = load_from_path(Path::new(CONFIG_PATH));
    *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = cfg;
}

pub fn get() -> Config {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

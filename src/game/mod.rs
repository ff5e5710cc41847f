pub mod chart;
pub mod gameplay;
pub mod jammer;
pub mod judgment;
pub mod life;
pub mod note;
pub mod recorder;
pub mod scheduler;
pub mod scores;
pub mod session;
pub mod stage_stats;
pub mod timing_windows;

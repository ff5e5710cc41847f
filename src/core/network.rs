use log::{info, warn};
use std::sync::mpsc::Sender;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::app::AppEvent;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Disabled,
    Connecting,
    Connected,
    Error(String),
}

static FEED_STATUS: LazyLock<Mutex<FeedStatus>> = LazyLock::new(|| Mutex::new(FeedStatus::Disabled));

pub fn get_status() -> FeedStatus {
    FEED_STATUS.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn set_status(new_status: FeedStatus) {
    *FEED_STATUS.lock().unwrap_or_else(PoisonError::into_inner) = new_status;
}

/// Starts the jammer feed listener if enabled. Every text message the server
/// delivers is forwarded unchanged; validating it is the engine's job.
pub fn init(tx: Sender<AppEvent>) {
    let cfg = crate::config::get();
    if !cfg.enable_feed {
        set_status(FeedStatus::Disabled);
        return;
    }
    set_status(FeedStatus::Connecting);
    info!("Initializing jammer feed at {}...", cfg.feed_url);
    let url = cfg.feed_url;
    thread::spawn(move || run_feed(&url, &tx));
}

fn run_feed(url: &str, tx: &Sender<AppEvent>) {
    loop {
        match tungstenite::connect(url) {
            Ok((mut socket, _)) => {
                info!("Connected to jammer feed.");
                set_status(FeedStatus::Connected);
                loop {
                    match socket.read() {
                        Ok(msg) if msg.is_text() => {
                            let Ok(text) = msg.to_text() else { continue };
                            if tx.send(AppEvent::Feed(text.to_owned())).is_err() {
                                return;
                            }
                        }
                        Ok(msg) if msg.is_close() => {
                            warn!("Jammer feed closed by server.");
                            set_status(FeedStatus::Error("Closed".into()));
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!("Jammer feed read failed: {e}");
                            set_status(FeedStatus::Error(e.to_string()));
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Failed to connect to jammer feed at {url}: {e}");
                set_status(FeedStatus::Error(e.to_string()));
            }
        }
        thread::sleep(RECONNECT_DELAY);
    }
}

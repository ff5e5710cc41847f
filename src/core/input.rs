use log::{info, warn};
use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;

use crate::app::AppEvent;
use crate::game::session::Mode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    Left = 0,
    Down = 1,
    Up = 2,
    Right = 3,
}

impl Lane {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[inline(always)]
pub fn lane_from_key(key: char) -> Option<Lane> {
    match key.to_ascii_lowercase() {
        'd' => Some(Lane::Left),
        'f' => Some(Lane::Down),
        'j' => Some(Lane::Up),
        'k' => Some(Lane::Right),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputCommand {
    Tap(Lane),
    ToggleRecording,
    Start(Mode),
    Pause,
    Resume,
    Restart,
    Seek(f64),
    /// New note speed in px/s; applies to notes spawned afterwards.
    Speed(f32),
    Quit,
}

/// Maps one console line to commands. A line made only of lane keys and `r`
/// is a chord typed in order, so `dfr` taps two lanes then toggles recording.
pub fn parse_line(line: &str) -> Result<Vec<InputCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default().to_ascii_lowercase();
    let cmd = match head.as_str() {
        "streamer" | "rank" => InputCommand::Start(head.parse()?),
        "pause" => InputCommand::Pause,
        "resume" => InputCommand::Resume,
        "restart" => InputCommand::Restart,
        "quit" | "exit" => InputCommand::Quit,
        "seek" => {
            let arg = words.next().ok_or("seek needs a position in seconds")?;
            let pos: f64 = arg.parse().map_err(|_| format!("'{arg}' is not a number of seconds"))?;
            if !pos.is_finite() || pos < 0.0 {
                return Err(format!("cannot seek to {arg}"));
            }
            InputCommand::Seek(pos)
        }
        "speed" => {
            let arg = words.next().ok_or("speed needs a value in px/s")?;
            match arg.parse::<f32>() {
                Ok(v) if v.is_finite() && v > 0.0 => InputCommand::Speed(v),
                _ => return Err(format!("'{arg}' is not a valid note speed")),
            }
        }
        _ => {
            return line
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c.to_ascii_lowercase() {
                    'r' => Ok(InputCommand::ToggleRecording),
                    _ => lane_from_key(c)
                        .map(InputCommand::Tap)
                        .ok_or_else(|| format!("unknown input '{line}'")),
                })
                .collect();
        }
    };
    Ok(vec![cmd])
}

/// Reads console lines on a background thread and forwards them as commands.
/// End of input is treated as a quit.
pub fn spawn_stdin_reader(tx: Sender<AppEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            };
            match parse_line(&line) {
                Ok(cmds) => {
                    for cmd in cmds {
                        if tx.send(AppEvent::Command(cmd)).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
        info!("stdin closed.");
        let _ = tx.send(AppEvent::Command(InputCommand::Quit));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_keys_map_left_to_right() {
        let lanes: Vec<usize> = "dfjk".chars().filter_map(lane_from_key).map(Lane::index).collect();
        assert_eq!(lanes, vec![0, 1, 2, 3]);
        assert_eq!(lane_from_key('K'), Some(Lane::Right));
        assert_eq!(lane_from_key('x'), None);
    }

    #[test]
    fn key_lines_become_taps_in_order() {
        assert_eq!(
            parse_line("dk r").unwrap(),
            vec![
                InputCommand::Tap(Lane::Left),
                InputCommand::Tap(Lane::Right),
                InputCommand::ToggleRecording
            ]
        );
        assert!(parse_line("   ").unwrap().is_empty());
    }

    #[test]
    fn words_become_commands() {
        assert_eq!(parse_line("rank").unwrap(), vec![InputCommand::Start(Mode::Rank)]);
        assert_eq!(parse_line("Streamer").unwrap(), vec![InputCommand::Start(Mode::Streamer)]);
        assert_eq!(parse_line("seek 12.5").unwrap(), vec![InputCommand::Seek(12.5)]);
        assert_eq!(parse_line("speed 480").unwrap(), vec![InputCommand::Speed(480.0)]);
        assert_eq!(parse_line("quit").unwrap(), vec![InputCommand::Quit]);
    }

    #[test]
    fn bad_lines_are_errors() {
        assert!(parse_line("seek").is_err());
        assert!(parse_line("seek -3").is_err());
        assert!(parse_line("seek soon").is_err());
        assert!(parse_line("speed 0").is_err());
        assert!(parse_line("dance").is_err());
    }
}

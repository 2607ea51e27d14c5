use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::pattern::PatternTable;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    ToggleAudio,
    NextPattern,
    SelectPattern(String),
    Quit,
}

/// Maps a key press to a pacer command. Digits pick patterns in table order.
pub fn command_for_key(key: &KeyEvent, patterns: &PatternTable) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(Command::TogglePause),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::ToggleAudio),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::NextPattern),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            patterns
                .nth_name(index)
                .map(|name| Command::SelectPattern(name.to_string()))
        }
        _ => None,
    }
}

/// Polls the keyboard on a blocking thread and forwards commands until
/// `cancel` fires or the receiver goes away.
pub fn spawn_key_reader(
    patterns: std::sync::Arc<PatternTable>,
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    log_warn!("keyboard polling failed: {err}");
                    break;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(err) => {
                    log_warn!("keyboard read failed: {err}");
                    break;
                }
            };
            if let Some(command) = command_for_key(&key, &patterns) {
                log_debug!("key {:?} -> {:?}", key.code, command);
                if tx.send(command).is_err() {
                    break;
                }
            }
        }
    })
}

/// Parses one line of the stdin command protocol used with JSON output.
///
/// `pause`, `music`, `next`, `pattern <id>` and `quit`; case does not matter.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let command = match verb.as_str() {
        "pause" | "resume" | "toggle" => Command::TogglePause,
        "music" | "audio" => Command::ToggleAudio,
        "next" => Command::NextPattern,
        "pattern" => Command::SelectPattern(words.next()?.to_string()),
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Reads commands from stdin, one per line. End of input only stops the
/// reader; the pacer keeps running until told to quit.
pub fn spawn_line_reader(
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        log_debug!("stdin {line:?} -> {command:?}");
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => log_warn!("unknown command: {}", line.trim()),
                },
                Ok(None) => {
                    log_debug!("stdin closed");
                    break;
                }
                Err(err) => {
                    log_warn!("stdin read failed: {err}");
                    break;
                }
            }
        }
    })
}

pub mod terminal;

use std::io::Write;
use std::sync::Mutex;

use crate::render::RenderSnapshot;

pub use terminal::TerminalSink;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Anything that can show a rendered frame.
pub trait FrameSink: Send + Sync + 'static {
    fn present(&self, frame: &RenderSnapshot);
}

/// Writes each frame as one JSON object per line.
pub struct JsonLinesSink<W: Write + Send + 'static> {
    out: Mutex<W>,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send + 'static> FrameSink for JsonLinesSink<W> {
    fn present(&self, frame: &RenderSnapshot) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(err) = write_line(&mut *out, frame) {
            log_warn!("failed to write frame: {err}");
        }
    }
}

fn write_line(out: &mut impl Write, frame: &RenderSnapshot) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, frame)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Keeps every presented frame; handy for driving the pacer without a screen.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<RenderSnapshot>>,
}

impl RecordingSink {
    pub fn frames(&self) -> Vec<RenderSnapshot> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }
}

impl FrameSink for RecordingSink {
    fn present(&self, frame: &RenderSnapshot) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(frame.clone());
        }
    }
}

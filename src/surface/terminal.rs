//! Full-screen terminal renderer.

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::pattern::PatternTable;
use crate::render::{build_path, Canvas, Point, RenderSnapshot, WaveformPath, FULL_SCALE, REST_SCALE};

use super::FrameSink;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

const PLOT_COLS: usize = 48;
const PLOT_ROWS: usize = 7;
const BAR_WIDTH: usize = 32;
const BREATH_MIN: usize = 6;

/// Raw mode and alternate screen for as long as it lives.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        queue!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        out.flush()?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = queue!(out, Show, LeaveAlternateScreen);
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}

struct PlotCache {
    pattern_id: String,
    path: WaveformPath,
}

pub struct TerminalSink {
    patterns: Arc<PatternTable>,
    canvas: Canvas,
    out: Mutex<Stdout>,
    plot: Mutex<Option<PlotCache>>,
}

impl TerminalSink {
    pub fn new(patterns: Arc<PatternTable>, canvas: Canvas) -> Self {
        Self {
            patterns,
            canvas,
            out: Mutex::new(io::stdout()),
            plot: Mutex::new(None),
        }
    }

    fn waveform_rows(&self, frame: &RenderSnapshot) -> Vec<String> {
        let Ok(mut cache) = self.plot.lock() else {
            return Vec::new();
        };
        let stale = cache
            .as_ref()
            .is_none_or(|cached| cached.pattern_id != frame.pattern_id);
        if stale {
            let Some(pattern) = self.patterns.get(&frame.pattern_id) else {
                return Vec::new();
            };
            *cache = Some(PlotCache {
                pattern_id: frame.pattern_id.clone(),
                path: build_path(pattern, self.canvas),
            });
        }
        cache
            .as_ref()
            .map(|cached| plot_waveform(&cached.path, frame.waveform_marker, PLOT_COLS, PLOT_ROWS))
            .unwrap_or_default()
    }

    fn draw(&self, out: &mut impl Write, frame: &RenderSnapshot) -> io::Result<()> {
        let overlay = if frame.paused {
            "   paused".to_string()
        } else {
            format!("   {:<7} {:>2}", frame.instruction_text, frame.countdown_text())
        };

        let mut lines = vec![
            format!(" breathe · {} · cycle {}", frame.pattern_id, frame.cycle_count),
            String::new(),
            overlay,
            format!("   {}", breath_bar(frame.graphic_scale, BAR_WIDTH)),
            String::new(),
            format!(
                "   {} {:>3.0}%",
                progress_bar(frame.ring_progress_percent, BAR_WIDTH),
                frame.ring_progress_percent
            ),
            String::new(),
        ];
        lines.extend(self.waveform_rows(frame).into_iter().map(|row| format!("   {row}")));
        lines.push(String::new());
        lines.push(" space pause · m music · p next pattern · 1-9 select · q quit".to_string());

        for (row, line) in lines.iter().enumerate() {
            queue!(
                out,
                MoveTo(0, row as u16),
                Print(line),
                Clear(ClearType::UntilNewLine)
            )?;
        }
        out.flush()
    }
}

impl FrameSink for TerminalSink {
    fn present(&self, frame: &RenderSnapshot) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(err) = self.draw(&mut *out, frame) {
            log_warn!("failed to draw frame: {err}");
        }
    }
}

/// Centered bar whose width follows the breathing scale.
pub fn breath_bar(scale: f64, width: usize) -> String {
    let span = (FULL_SCALE - REST_SCALE).max(f64::EPSILON);
    let fraction = ((scale - REST_SCALE) / span).clamp(0.0, 1.0);
    let min = BREATH_MIN.min(width);
    let filled = min + ((width - min) as f64 * fraction).round() as usize;
    let pad = (width - filled) / 2;
    format!(
        "{}{}{}",
        " ".repeat(pad),
        "█".repeat(filled),
        " ".repeat(width - filled - pad)
    )
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let fraction = if percent.is_finite() {
        (percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (width as f64 * fraction).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// Rasterizes the waveform into `rows` lines of `cols` cells with the marker on top.
pub fn plot_waveform(path: &WaveformPath, marker: Point, cols: usize, rows: usize) -> Vec<String> {
    if cols == 0 || rows == 0 {
        return Vec::new();
    }
    let canvas = path.canvas();
    let cell = |point: Point| -> (usize, usize) {
        let col = (point.x / canvas.width * (cols - 1) as f64).round();
        let row = (point.y / canvas.height * (rows - 1) as f64).round();
        (
            col.clamp(0.0, (cols - 1) as f64) as usize,
            row.clamp(0.0, (rows - 1) as f64) as usize,
        )
    };

    let mut grid = vec![vec![' '; cols]; rows];
    for pair in path.polyline().windows(2) {
        let (c0, r0) = cell(pair[0]);
        let (c1, r1) = cell(pair[1]);
        let steps = c0.abs_diff(c1).max(r0.abs_diff(r1)).max(1);
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let point = Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
            let (col, row) = cell(point);
            grid[row][col] = '·';
        }
    }

    let (col, row) = cell(marker);
    grid[row][col] = '●';

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

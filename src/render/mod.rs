pub mod ring;
pub mod waveform;

use serde::Serialize;

use crate::pattern::{Phase, PhaseKind};
use crate::timer::PhaseClock;

pub use ring::{ring_offset, ProgressRing, DEFAULT_RING_RADIUS};
pub use waveform::{build_path, Canvas, PathSegment, Point, WaveformPath};

pub const REST_SCALE: f64 = 1.0;
pub const FULL_SCALE: f64 = 1.2;

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub pattern_id: String,
    pub phase_index: usize,
    pub instruction_text: String,
    pub countdown_seconds: u32,
    pub graphic_scale: f64,
    pub ring_progress_percent: f64,
    pub ring_offset: f64,
    pub waveform_marker: Point,
    pub cycle_count: u64,
    pub paused: bool,
}

impl RenderSnapshot {
    /// Countdown as displayed; blank once the phase has run out.
    pub fn countdown_text(&self) -> String {
        if self.countdown_seconds > 0 {
            self.countdown_seconds.to_string()
        } else {
            String::new()
        }
    }
}

/// Whole seconds left in the phase, rounded up.
pub fn countdown_seconds(duration: f64, time_in_phase: f64) -> u32 {
    let left = (duration - time_in_phase).ceil();
    if left.is_finite() && left > 0.0 {
        left as u32
    } else {
        0
    }
}

/// Scale of the breathing graphic at `time_in_phase` into `phase`.
///
/// A Hold keeps whatever extreme `previous` left the breath at: full after an
/// Inhale, rest otherwise.
pub fn graphic_scale(phase: &Phase, previous: Option<&Phase>, time_in_phase: f64) -> f64 {
    let progress = if phase.duration > 0.0 {
        (time_in_phase / phase.duration).clamp(0.0, 1.0)
    } else {
        1.0
    };

    match phase.kind {
        PhaseKind::Inhale => REST_SCALE + (FULL_SCALE - REST_SCALE) * progress,
        PhaseKind::Exhale => FULL_SCALE - (FULL_SCALE - REST_SCALE) * progress,
        PhaseKind::Hold => match previous.map(|phase| phase.kind) {
            Some(PhaseKind::Inhale) => FULL_SCALE,
            _ => REST_SCALE,
        },
    }
}

pub fn render_frame(clock: &PhaseClock, path: &WaveformPath, ring: &ProgressRing) -> RenderSnapshot {
    let state = clock.state();
    let phase = clock.current_phase();

    let ring_progress_percent = clock.cycle_progress() * 100.0;

    RenderSnapshot {
        pattern_id: state.pattern_id.clone(),
        phase_index: state.phase_index,
        instruction_text: phase.kind.as_str().to_string(),
        countdown_seconds: countdown_seconds(phase.duration, state.time_in_phase),
        graphic_scale: graphic_scale(phase, clock.previous_phase(), state.time_in_phase),
        ring_progress_percent,
        ring_offset: ring.offset(ring_progress_percent),
        waveform_marker: path.point_at_progress(ring_progress_percent / 100.0),
        cycle_count: state.cycle_count,
        paused: state.paused,
    }
}

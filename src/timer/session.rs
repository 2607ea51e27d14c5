use std::time::Duration;

use crate::pattern::Pattern;
use crate::render::{build_path, render_frame, Canvas, ProgressRing, RenderSnapshot, WaveformPath};

use super::PhaseClock;

/// One pacer instance: the clock plus everything derived from its pattern.
#[derive(Debug, Clone)]
pub struct PacerSession {
    clock: PhaseClock,
    path: WaveformPath,
    ring: ProgressRing,
    canvas: Canvas,
    /// Timestamp of the previous frame; `None` until the first frame after a (re)start or resume.
    last_timestamp: Option<Duration>,
}

impl PacerSession {
    pub fn new(pattern: Pattern, canvas: Canvas, ring: ProgressRing) -> Self {
        let path = build_path(&pattern, canvas);
        Self {
            clock: PhaseClock::new(pattern),
            path,
            ring,
            canvas,
            last_timestamp: None,
        }
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    pub fn path(&self) -> &WaveformPath {
        &self.path
    }

    pub fn ring(&self) -> &ProgressRing {
        &self.ring
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn last_timestamp(&self) -> Option<Duration> {
        self.last_timestamp
    }

    /// Handles one frame. Returns `None` while paused.
    pub fn on_frame(&mut self, timestamp: Duration) -> Option<RenderSnapshot> {
        let delta = match self.last_timestamp {
            Some(previous) => timestamp.saturating_sub(previous).as_secs_f64(),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);

        if self.clock.is_paused() {
            return None;
        }
        self.clock.advance(delta);
        Some(self.snapshot())
    }

    pub fn set_paused(&mut self, paused: bool) {
        if !paused && self.clock.is_paused() {
            // The pause interval must not show up as one big delta.
            self.last_timestamp = None;
        }
        self.clock.set_paused(paused);
    }

    /// Flips the paused flag and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = !self.clock.is_paused();
        self.set_paused(paused);
        paused
    }

    pub fn select_pattern(&mut self, pattern: Pattern) {
        self.path = build_path(&pattern, self.canvas);
        self.clock.reset(pattern);
    }

    /// Forgets the previous frame so the next one starts with a zero delta.
    pub fn restart(&mut self) {
        self.last_timestamp = None;
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        render_frame(&self.clock, &self.path, &self.ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternTable;

    fn session(name: &str) -> PacerSession {
        PacerSession::new(
            PatternTable::builtin().lookup(name).unwrap().clone(),
            Canvas::default(),
            ProgressRing::default(),
        )
    }

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn first_frame_has_zero_delta() {
        let mut session = session("4-7-8");
        let frame = session.on_frame(secs(1234.0)).unwrap();
        assert_eq!(frame.countdown_seconds, 4);
        assert_eq!(session.clock().state().time_in_phase, 0.0);

        session.on_frame(secs(1235.5));
        assert_eq!(session.clock().state().time_in_phase, 1.5);
    }

    #[test]
    fn backwards_timestamps_do_not_rewind() {
        let mut session = session("4-7-8");
        session.on_frame(secs(10.0));
        session.on_frame(secs(12.0));
        session.on_frame(secs(5.0));
        assert_eq!(session.clock().state().time_in_phase, 2.0);
    }

    #[test]
    fn paused_frames_leave_clock_alone() {
        let mut session = session("5-5-5");
        session.on_frame(secs(0.0));
        session.on_frame(secs(1.0));
        assert!(session.toggle_pause());

        let before = session.clock().state().clone();
        assert!(session.on_frame(secs(101.0)).is_none());
        assert_eq!(session.clock().state(), &before);
    }

    #[test]
    fn resume_discards_the_pause_interval() {
        let mut session = session("5-5-5");
        session.on_frame(secs(0.0));
        session.on_frame(secs(2.0));
        session.set_paused(true);
        session.on_frame(secs(3.0));

        session.set_paused(false);
        let frame = session.on_frame(secs(600.0)).unwrap();
        assert_eq!(frame.phase_index, 0);
        assert_eq!(session.clock().state().time_in_phase, 2.0);

        session.on_frame(secs(601.0));
        assert_eq!(session.clock().state().time_in_phase, 3.0);
    }

    #[test]
    fn pattern_switch_resets_and_redraws() {
        let table = PatternTable::builtin();
        let mut session = session("4-7-8");
        session.on_frame(secs(0.0));
        session.on_frame(secs(30.0));

        session.select_pattern(table.lookup("4-4-4-4").unwrap().clone());
        let frame = session.snapshot();
        assert_eq!(frame.pattern_id, "4-4-4-4");
        assert_eq!(frame.phase_index, 0);
        assert_eq!(frame.cycle_count, 0);
        assert_eq!(frame.countdown_seconds, 4);
        assert_eq!(session.path().segments().len(), 4);
    }

    #[test]
    fn restart_forgets_previous_frame() {
        let mut session = session("4-7-8");
        session.on_frame(secs(1.0));
        session.restart();
        session.on_frame(secs(50.0));
        assert_eq!(session.clock().state().time_in_phase, 0.0);
    }
}

use serde::{Deserialize, Serialize};

use crate::pattern::{Pattern, Phase, PhaseKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub pattern_id: String,
    pub phase_index: usize,
    /// Seconds spent in the current phase; stays below the phase duration.
    pub time_in_phase: f64,
    pub cycle_count: u64,
    pub paused: bool,
}

impl ClockState {
    fn fresh(pattern_id: &str, paused: bool) -> Self {
        Self {
            pattern_id: pattern_id.to_string(),
            phase_index: 0,
            time_in_phase: 0.0,
            cycle_count: 0,
            paused,
        }
    }
}

/// Clamps a frame delta to a usable number of seconds.
pub fn sanitize_delta(delta_seconds: f64) -> f64 {
    if delta_seconds.is_finite() && delta_seconds > 0.0 {
        delta_seconds
    } else {
        0.0
    }
}

/// Phase state machine over the active pattern.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    pattern: Pattern,
    state: ClockState,
}

impl PhaseClock {
    pub fn new(pattern: Pattern) -> Self {
        let state = ClockState::fresh(pattern.id(), false);
        Self { pattern, state }
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
    }

    pub fn current_phase(&self) -> &Phase {
        &self.pattern.phases()[self.state.phase_index]
    }

    /// Nearest Inhale or Exhale before the current phase in this cycle.
    /// Holds are skipped; `None` at the start of a cycle.
    pub fn previous_phase(&self) -> Option<&Phase> {
        self.pattern.phases()[..self.state.phase_index]
            .iter()
            .rev()
            .find(|phase| phase.kind != PhaseKind::Hold)
    }

    /// Seconds elapsed since the start of the current cycle.
    pub fn elapsed_in_cycle(&self) -> f64 {
        self.pattern.elapsed_before(self.state.phase_index) + self.state.time_in_phase
    }

    /// Fraction of the current cycle completed, in `[0, 1]`.
    pub fn cycle_progress(&self) -> f64 {
        let total = self.pattern.total_duration();
        if total <= 0.0 {
            return 0.0;
        }
        (self.elapsed_in_cycle() / total).clamp(0.0, 1.0)
    }

    /// Installs `pattern` and rewinds to its first phase. The paused flag is kept.
    pub fn reset(&mut self, pattern: Pattern) {
        self.state = ClockState::fresh(pattern.id(), self.state.paused);
        self.pattern = pattern;
    }

    pub fn advance(&mut self, delta_seconds: f64) {
        if self.state.paused {
            return;
        }
        let delta = sanitize_delta(delta_seconds);
        if delta == 0.0 {
            return;
        }

        let total = self.pattern.total_duration();
        if total <= 0.0 {
            return;
        }

        // Work in cycle-relative time so one huge delta costs the same as a small one.
        let offset = self.elapsed_in_cycle() + delta;
        let mut wraps = (offset / total).floor();
        let mut position = offset - wraps * total;

        let phases = self.pattern.phases();
        let mut index = 0;
        while index < phases.len() && position >= phases[index].duration {
            position -= phases[index].duration;
            index += 1;
        }
        if index == phases.len() {
            // Rounding left us at the very end of the cycle.
            index = 0;
            position = 0.0;
            wraps += 1.0;
        }

        self.state.cycle_count = self.state.cycle_count.saturating_add(wraps as u64);
        self.state.phase_index = index;
        self.state.time_in_phase = position.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternTable;

    fn clock(name: &str) -> PhaseClock {
        PhaseClock::new(PatternTable::builtin().lookup(name).unwrap().clone())
    }

    #[test]
    fn box_pattern_walks_every_phase() {
        let mut clock = clock("4-4-4-4");
        let mut seen = Vec::new();
        for _ in 0..4 {
            clock.advance(4.0);
            seen.push(clock.state().phase_index);
        }
        assert_eq!(seen, vec![1, 2, 3, 0]);
        assert_eq!(clock.state().cycle_count, 1);
        assert_eq!(clock.state().time_in_phase, 0.0);
    }

    #[test]
    fn multi_phase_skip_lands_exactly_on_exhale() {
        let mut clock = clock("4-7-8");
        clock.advance(11.0);
        assert_eq!(clock.state().phase_index, 2);
        assert_eq!(clock.current_phase().kind, PhaseKind::Exhale);
        assert_eq!(clock.state().time_in_phase, 0.0);
        assert_eq!(clock.state().cycle_count, 0);
    }

    #[test]
    fn whole_cycles_are_counted() {
        let mut clock = clock("5-5-5");
        clock.advance(15.0 * 3.0);
        assert_eq!(clock.state().cycle_count, 3);
        assert_eq!(clock.state().phase_index, 0);

        clock.advance(15.0 * 1000.0 + 6.0);
        assert_eq!(clock.state().cycle_count, 1003);
        assert_eq!(clock.state().phase_index, 1);
        assert!((clock.state().time_in_phase - 1.0).abs() < 1e-6);
    }

    #[test]
    fn paused_clock_ignores_deltas() {
        let mut clock = clock("4-7-8");
        clock.advance(2.5);
        clock.set_paused(true);
        let before = clock.state().clone();
        clock.advance(100.0);
        assert_eq!(clock.state(), &before);
    }

    #[test]
    fn bad_deltas_are_clamped() {
        let mut clock = clock("4-7-8");
        clock.advance(1.0);
        clock.advance(-5.0);
        clock.advance(f64::NAN);
        clock.advance(f64::INFINITY);
        assert_eq!(clock.state().phase_index, 0);
        assert_eq!(clock.state().time_in_phase, 1.0);
        assert_eq!(sanitize_delta(-0.1), 0.0);
        assert_eq!(sanitize_delta(0.25), 0.25);
    }

    #[test]
    fn reset_rewinds_but_keeps_pause() {
        let table = PatternTable::builtin();
        let mut clock = clock("4-7-8");
        clock.advance(30.0);
        clock.set_paused(true);
        clock.reset(table.lookup("5-5-5").unwrap().clone());

        let state = clock.state();
        assert_eq!(state.pattern_id, "5-5-5");
        assert_eq!(state.phase_index, 0);
        assert_eq!(state.time_in_phase, 0.0);
        assert_eq!(state.cycle_count, 0);
        assert!(state.paused);
    }

    #[test]
    fn progress_tracks_position_in_cycle() {
        let mut clock = clock("4-4-4-4");
        clock.advance(6.0);
        assert_eq!(clock.elapsed_in_cycle(), 6.0);
        assert!((clock.cycle_progress() - 0.375).abs() < 1e-9);
        assert_eq!(clock.current_phase().kind, PhaseKind::Hold);
        assert_eq!(clock.previous_phase().map(|p| p.kind), Some(PhaseKind::Inhale));
    }

    #[test]
    fn previous_phase_skips_holds() {
        let pattern = Pattern::new(
            "double-hold",
            vec![
                Phase::new(PhaseKind::Hold, 1.0),
                Phase::new(PhaseKind::Exhale, 2.0),
                Phase::new(PhaseKind::Hold, 1.0),
                Phase::new(PhaseKind::Hold, 1.0),
            ],
        )
        .unwrap();
        let mut clock = PhaseClock::new(pattern);
        assert!(clock.previous_phase().is_none());

        clock.advance(4.5);
        assert_eq!(clock.state().phase_index, 3);
        assert_eq!(clock.previous_phase().map(|p| p.kind), Some(PhaseKind::Exhale));
    }
}

use breathe_lib::pattern::{Pattern, PatternTable, Phase, PhaseKind};
use breathe_lib::render::{build_path, ring_offset, Canvas};
use breathe_lib::timer::PhaseClock;
use proptest::prelude::*;

fn phase_kind() -> impl Strategy<Value = PhaseKind> {
    prop_oneof![
        Just(PhaseKind::Inhale),
        Just(PhaseKind::Hold),
        Just(PhaseKind::Exhale),
    ]
}

fn pattern() -> impl Strategy<Value = Pattern> {
    prop::collection::vec((phase_kind(), 0.1f64..20.0), 1..6).prop_map(|phases| {
        let phases = phases
            .into_iter()
            .map(|(kind, duration)| Phase::new(kind, duration))
            .collect();
        Pattern::new("generated", phases).unwrap()
    })
}

fn deltas() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            4 => 0.0f64..0.1,
            2 => 0.0f64..30.0,
            1 => Just(-1.0),
            1 => Just(f64::NAN),
            1 => 0.0f64..10_000.0,
        ],
        0..64,
    )
}

#[test]
fn builtin_patterns_have_positive_durations() {
    for pattern in PatternTable::builtin().iter() {
        assert!(pattern.total_duration() > 0.0);
        assert!(pattern.phases().iter().all(|phase| phase.duration > 0.0));
    }
}

#[test]
fn time_in_phase_stays_inside_the_phase() {
    proptest!(|(pattern in pattern(), deltas in deltas())| {
        let mut clock = PhaseClock::new(pattern);
        for delta in deltas {
            clock.advance(delta);
            let state = clock.state();
            let duration = clock.current_phase().duration;
            prop_assert!(state.phase_index < clock.pattern().len());
            prop_assert!(state.time_in_phase >= 0.0);
            prop_assert!(state.time_in_phase < duration);
        }
    });
}

#[test]
fn reset_always_rewinds() {
    proptest!(|(pattern in pattern(), deltas in deltas())| {
        let mut clock = PhaseClock::new(pattern.clone());
        for delta in deltas {
            clock.advance(delta);
        }
        clock.reset(pattern);
        let state = clock.state();
        prop_assert_eq!(state.phase_index, 0);
        prop_assert_eq!(state.time_in_phase, 0.0);
        prop_assert_eq!(state.cycle_count, 0);
    });
}

#[test]
fn whole_cycles_count_exactly() {
    proptest!(|(pattern in pattern(), cycles in 1u64..50)| {
        let total = pattern.total_duration();
        let mut clock = PhaseClock::new(pattern);
        for _ in 0..cycles {
            clock.advance(total);
        }
        prop_assert_eq!(clock.state().cycle_count, cycles);
        prop_assert_eq!(clock.state().phase_index, 0);
    });
}

#[test]
fn paused_clock_ignores_deltas() {
    proptest!(|(pattern in pattern(), deltas in deltas())| {
        let mut clock = PhaseClock::new(pattern);
        clock.advance(1.5);
        clock.set_paused(true);
        let before = clock.state().clone();
        for delta in deltas {
            clock.advance(delta);
        }
        prop_assert_eq!(clock.state(), &before);
    });
}

#[test]
fn ring_offset_shrinks_as_progress_grows() {
    proptest!(|(radius in 1.0f64..500.0, a in 0.0f64..100.0, b in 0.0f64..100.0)| {
        let circumference = 2.0 * std::f64::consts::PI * radius;
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ring_offset(circumference, low) >= ring_offset(circumference, high));
        prop_assert!((ring_offset(circumference, 0.0) - circumference).abs() < 1e-9);
        prop_assert!(ring_offset(circumference, 100.0).abs() < 1e-9);
    });
}

#[test]
fn waveform_spans_the_canvas() {
    proptest!(|(pattern in pattern(), width in 50.0f64..2000.0, height in 10.0f64..500.0)| {
        let path = build_path(&pattern, Canvas { width, height });
        prop_assert!((path.extent() - width).abs() < 1e-6 * width);
        prop_assert_eq!(path.segments().len(), pattern.len());
    });
}

#[test]
fn marker_moves_left_to_right() {
    proptest!(|(pattern in pattern(), steps in 2usize..200)| {
        let path = build_path(&pattern, Canvas::default());
        let mut previous = path.point_at_progress(0.0);
        for step in 1..=steps {
            let point = path.point_at_progress(step as f64 / steps as f64);
            prop_assert!(point.x + 1e-9 >= previous.x);
            previous = point;
        }
        prop_assert!((previous.x - path.extent()).abs() < 1e-6);
    });
}

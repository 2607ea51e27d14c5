use std::f64::consts::PI;

pub const DEFAULT_RING_RADIUS: f64 = 52.0;

/// Dash offset that fills `percent` of a ring with the given circumference.
pub fn ring_offset(circumference: f64, percent: f64) -> f64 {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    circumference - percent / 100.0 * circumference
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRing {
    circumference: f64,
}

impl Default for ProgressRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_RADIUS)
    }
}

impl ProgressRing {
    pub fn new(radius: f64) -> Self {
        Self {
            circumference: radius * 2.0 * PI,
        }
    }

    pub fn circumference(&self) -> f64 {
        self.circumference
    }

    /// Dash pattern: one full-length dash followed by an equal gap.
    pub fn dash_array(&self) -> (f64, f64) {
        (self.circumference, self.circumference)
    }

    pub fn offset(&self, percent: f64) -> f64 {
        ring_offset(self.circumference, percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_full_ring() {
        let ring = ProgressRing::new(52.0);
        let c = ring.circumference();
        assert!((c - 2.0 * PI * 52.0).abs() < 1e-9);
        assert_eq!(ring.offset(0.0), c);
        assert_eq!(ring.offset(100.0), 0.0);
        assert_eq!(ring.dash_array(), (c, c));
    }

    #[test]
    fn offset_decreases_with_progress() {
        let c = 100.0;
        let offsets: Vec<f64> = (0..=20).map(|step| ring_offset(c, step as f64 * 5.0)).collect();
        assert!(offsets.windows(2).all(|pair| pair[1] < pair[0]));
        assert_eq!(ring_offset(c, 50.0), 50.0);
    }

    #[test]
    fn out_of_range_percent_is_clamped() {
        assert_eq!(ring_offset(80.0, -10.0), 80.0);
        assert_eq!(ring_offset(80.0, 250.0), 0.0);
        assert_eq!(ring_offset(80.0, f64::NAN), 80.0);
    }
}

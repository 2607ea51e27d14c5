use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;

/// Brown (red) noise: integrated white noise, a soft rumble that sits under
/// the breathing cues without drawing attention.
pub struct BrownNoise {
    last_value: f32,
    gain: f32,
    rng: StdRng,
}

impl BrownNoise {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            last_value: 0.0,
            gain: 0.3,
            rng,
        }
    }
}

impl Default for BrownNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for BrownNoise {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);

        // Leaky integration keeps the walk bounded and free of DC drift.
        self.last_value = ((self.last_value + white * 0.02).clamp(-1.0, 1.0)) * 0.9999;

        Some(self.last_value * self.gain)
    }
}

impl Source for BrownNoise {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

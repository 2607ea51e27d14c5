use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;

/// Root, fifth and octave of a low A.
const PARTIALS: [(f32, f32); 3] = [(110.0, 0.5), (165.0, 0.3), (220.0, 0.2)];

/// Slow swell applied over the whole chord, in Hz.
const SWELL_HZ: f32 = 0.1;

/// Soft sustained chord with a slow volume swell.
pub struct Drone {
    num_sample: u64,
    gain: f32,
}

impl Drone {
    pub fn new() -> Self {
        Self {
            num_sample: 0,
            gain: 0.12,
        }
    }
}

impl Default for Drone {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Drone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        // Wrap once per hour of audio to keep `t` precise in f32.
        self.num_sample = (self.num_sample + 1) % (u64::from(SAMPLE_RATE) * 3600);
        let t = self.num_sample as f32 / SAMPLE_RATE as f32;

        let chord: f32 = PARTIALS
            .iter()
            .map(|&(freq, weight)| (TAU * freq * t).sin() * weight)
            .sum();
        let swell = 0.75 + 0.25 * (TAU * SWELL_HZ * t).sin();

        Some(chord * swell * self.gain)
    }
}

impl Source for Drone {
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

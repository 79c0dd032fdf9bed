use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a reproducible random bitstream where each bit is set with probability `density`
///
/// Panics if `density` is outside [0, 1].
pub fn random_bits(seed: u64, len: usize, density: f64) -> Vec<bool> {
    if !(0.0..=1.0).contains(&density) {
        panic!("Bit density must be within [0, 1], got {}", density);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_bool(density)).collect()
}

/// Pulse-density encoded test tone
///
/// Yields one bit per tick whose running density tracks `offset + amplitude * sin(2 pi f t)`,
/// using an error-feedback accumulator. Frequency is given in cycles per tick. This is a digital
/// stimulus source for exercising the decimators, not a model of an analog modulator.
pub struct ToneBitstream {
    phase: f64,
    step: f64,
    offset: f64,
    amplitude: f64,
    error: f64,
}

impl ToneBitstream {
    /// Create a new tone source
    ///
    /// The density must stay within [0, 1] over the whole cycle, i.e. `offset - amplitude >= 0`
    /// and `offset + amplitude <= 1`. Panics otherwise.
    pub fn new(cycles_per_tick: f64, offset: f64, amplitude: f64) -> Self {
        if amplitude < 0.0 || offset - amplitude < 0.0 || offset + amplitude > 1.0 {
            panic!("Tone density out of range: offset {} amplitude {}", offset, amplitude);
        }
        Self {
            phase: 0.0,
            step: cycles_per_tick,
            offset,
            amplitude,
            error: 0.0,
        }
    }

    /// A tone landing exactly on `bin` of a `samples`-point spectrum of the decimated output
    pub fn on_bin(bin: usize, samples: usize, ratio: usize, amplitude: f64) -> Self {
        Self::new(bin as f64 / (samples * ratio) as f64, 0.5, amplitude)
    }

    fn density(&self) -> f64 {
        self.offset + self.amplitude * (2.0 * std::f64::consts::PI * self.phase).sin()
    }
}

impl Iterator for ToneBitstream {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.error += self.density();
        let bit = self.error >= 1.0;
        if bit {
            self.error -= 1.0;
        }
        self.phase = (self.phase + self.step).fract();
        Some(bit)
    }
}

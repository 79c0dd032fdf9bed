use num_traits::AsPrimitive;

pub fn compute_mean<T: AsPrimitive<f32>>(buf: &[T]) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    let mut mean: f32 = 0.0;
    for sample in buf {
        mean += sample.as_();
    }
    mean / buf.len() as f32
}

/// Return RMS of the decimated signal in dBFS, and its DC level
///
/// Samples are unsigned codes in `0..=full_scale`; the AC part is normalised to half the code
/// range, so a sine swinging across the whole range reads 0 dBFS.
pub fn compute_rms_mean<T: AsPrimitive<f32>>(buf: &[T], full_scale: u32) -> (f32, f32) {
    let mean = compute_mean(buf);
    if buf.is_empty() {
        return (f32::NEG_INFINITY, mean);
    }
    let half_range = full_scale as f32 / 2.0;
    let mut rms = 0.0f32;
    for sample in buf {
        let x = (sample.as_() - mean) / half_range;
        rms += x * x;
    }
    rms = libm::sqrtf(rms / buf.len() as f32);
    // 20*log10(sqrt(2)) ~= 3.0103
    let db_fs = 20.0 * libm::log10f(rms) + 3.0103;
    (db_fs, mean)
}

#[cfg(feature="std")]
pub use spectrum::SpectrumAnalyzer;

#[cfg(feature="std")]
mod spectrum {
    use num_complex::Complex;
    use num_traits::AsPrimitive;
    use realfft::{RealFftPlanner, RealToComplex};
    use std::sync::Arc;

    use super::compute_mean;

    /// Magnitude spectra of blocks of decimated samples
    ///
    /// Planning the FFT is the expensive part, so keep one of these around for repeated blocks of
    /// the same size.
    pub struct SpectrumAnalyzer {
        fft: Arc<dyn RealToComplex<f32>>,
    }

    impl SpectrumAnalyzer {
        pub fn new(size: usize) -> Self {
            let mut planner = RealFftPlanner::<f32>::new();
            Self {
                fft: planner.plan_fft_forward(size),
            }
        }

        pub fn len(&self) -> usize {
            self.fft.len()
        }

        pub fn is_empty(&self) -> bool {
            self.fft.len() == 0
        }

        /// Magnitudes of bins `0..=len/2`, with the mean removed and scaled by 1/len
        ///
        /// Returns `None` if `samples` is not exactly `len` long.
        pub fn magnitudes<T: AsPrimitive<f32>>(&self, samples: &[T]) -> Option<Vec<f32>> {
            if samples.len() != self.len() || self.is_empty() {
                return None;
            }
            let mean = compute_mean(samples);
            let mut input: Vec<f32> = samples.iter().map(|s| s.as_() - mean).collect();
            let mut output: Vec<Complex<f32>> = self.fft.make_output_vec();
            self.fft.process(&mut input, &mut output).ok()?;
            let scale = self.len() as f32;
            Some(output.iter().map(|c| c.norm() / scale).collect())
        }

        /// Index of the strongest bin, DC excluded
        pub fn dominant_bin<T: AsPrimitive<f32>>(&self, samples: &[T]) -> Option<usize> {
            let mags = self.magnitudes(samples)?;
            mags.iter()
                .enumerate()
                .skip(1)
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
        }
    }

    /// True when `bin` carries more energy than all other bins in `1..upto` together
    pub fn dominates(mags: &[f32], bin: usize, upto: usize) -> bool {
        let upto = upto.min(mags.len());
        if bin == 0 || bin >= upto {
            return false;
        }
        let others: f32 = mags[1..upto].iter().sum::<f32>() - mags[bin];
        mags[bin] > others
    }
}

#[cfg(feature="std")]
pub use spectrum::dominates;

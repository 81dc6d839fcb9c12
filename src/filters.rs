//! 1-D convolution filters used to low-pass tie profiles.
//!
//! Borders mirror the signal including the edge sample
//! (`d c b a | a b c d | d c b a`), so a constant input stays constant.

/// Trait implemented by symmetric 1-D convolution kernels.
pub trait Kernel1d {
    /// Taps in left-to-right order; the centre tap sits at `radius()`.
    fn taps(&self) -> &[f64];

    fn radius(&self) -> usize {
        self.taps().len() / 2
    }
}

/// Kernel span in standard deviations.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Sampled, normalised Gaussian kernel.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    taps: Vec<f64>,
}

impl GaussianKernel {
    /// Kernel with standard deviation `sigma` (in samples), truncated at
    /// [`GAUSSIAN_TRUNCATE`] sigmas. `sigma <= 0` yields the identity tap.
    pub fn new(sigma: f64) -> Self {
        if !(sigma > 0.0) {
            return Self { taps: vec![1.0] };
        }
        let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as usize;
        let inv = -0.5 / (sigma * sigma);
        let mut taps: Vec<f64> = (0..=2 * radius)
            .map(|k| {
                let d = k as f64 - radius as f64;
                (inv * d * d).exp()
            })
            .collect();
        let sum: f64 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { taps }
    }
}

impl Kernel1d for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f64] {
        &self.taps
    }
}

/// Map an out-of-range index into `0..n` by half-sample mirroring.
#[inline]
fn reflect(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Convolve `signal` with `kernel`, mirroring at both ends.
pub fn convolve_reflect<K: Kernel1d + ?Sized>(kernel: &K, signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let taps = kernel.taps();
    let r = kernel.radius() as isize;
    (0..n as isize)
        .map(|i| {
            taps.iter()
                .enumerate()
                .map(|(k, &w)| w * signal[reflect(i + k as isize - r, n)])
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_filter_1d(signal: &[f64], sigma: f64) -> Vec<f64> {
        convolve_reflect(&GaussianKernel::new(sigma), signal)
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let k = GaussianKernel::new(4.0);
        assert_eq!(k.taps().len(), 33);
        assert_eq!(k.radius(), 16);
        let sum: f64 = k.taps().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        for i in 0..k.radius() {
            assert_eq!(k.taps()[i], k.taps()[k.taps().len() - 1 - i]);
        }
    }

    #[test]
    fn reflect_mirrors_including_edge() {
        let idx: Vec<usize> = (-4..8).map(|i| reflect(i, 4)).collect();
        assert_eq!(idx, vec![3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0]);
        assert_eq!(reflect(-9, 4), 0);
        assert_eq!(reflect(0, 1), 0);
        assert_eq!(reflect(5, 1), 0);
    }

    #[test]
    fn constant_signal_is_preserved_even_when_shorter_than_kernel() {
        let out = gaussian_filter_1d(&[7.5; 5], 4.0);
        for v in out {
            assert!((v - 7.5).abs() < 1e-12, "got {}", v);
        }
    }

    #[test]
    fn zero_sigma_is_identity() {
        let s = [1.0, -2.0, 3.0];
        assert_eq!(gaussian_filter_1d(&s, 0.0), s.to_vec());
    }

    #[test]
    fn filter_attenuates_alternating_noise() {
        let s: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = gaussian_filter_1d(&s, 2.0);
        let peak = out[8..56].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 1e-3, "residual oscillation {}", peak);
    }
}

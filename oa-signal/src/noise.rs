//! White Gaussian noise

use crate::error::{Result, SignalError};
use ndarray::Array1;
use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::SQRT_2;

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn normal(sigma: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, sigma)
        .map_err(|e| SignalError::InvalidArgument(format!("noise sigma {sigma}: {e}")))
}

/// Real white Gaussian noise with standard deviation `sigma`
pub fn white_noise(size: usize, sigma: f64, seed: Option<u64>) -> Result<Array1<f64>> {
    let dist = normal(sigma)?;
    let mut rng = rng(seed);
    Ok((0..size).map(|_| dist.sample(&mut rng)).collect())
}

/// Complex white Gaussian noise; each part has standard deviation `sigma / √2`
pub fn complex_white_noise(size: usize, sigma: f64, seed: Option<u64>) -> Result<Array1<Complex64>> {
    let dist = normal(sigma)?;
    let mut rng = rng(seed);
    let re: Vec<f64> = (0..size).map(|_| dist.sample(&mut rng) / SQRT_2).collect();
    let im: Vec<f64> = (0..size).map(|_| dist.sample(&mut rng) / SQRT_2).collect();
    Ok(re
        .into_iter()
        .zip(im)
        .map(|(re, im)| Complex64::new(re, im))
        .collect())
}

/// Noise standard deviation for an SNR in dB relative to `signal_amplitude`
pub fn snrdb_to_sigma(snrdb: f64, signal_amplitude: f64) -> f64 {
    10f64.powf(-snrdb / 20.0) * signal_amplitude
}

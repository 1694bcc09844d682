//! Basic numeric types and helpers for ocean acoustics

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 3D point in space (x east, y north, z depth positive down)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point3D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Point3D {
    /// Create a new 3D point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate Euclidean distance to another point
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance to another point in the horizontal (x, y) plane
    pub fn horizontal_distance_to(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Constants for ocean acoustics
pub mod constants {
    /// Nominal sound speed in sea water in m/s
    pub const SPEED_OF_SOUND_WATER: f64 = 1500.0;

    /// Density of sea water in g/cm³ (the unit used in toolbox environment files)
    pub const WATER_DENSITY: f64 = 1.0;

    /// Metres per kilometre; receiver ranges are kept in km
    pub const METERS_PER_KM: f64 = 1000.0;
}

/// Calculate wavenumber k = 2πf/c
pub fn wavenumber(frequency: f64, speed_of_sound: f64) -> f64 {
    2.0 * PI * frequency / speed_of_sound
}

/// Generate linearly spaced values (inclusive of both ends)
pub fn lin_space(start: f64, end: f64, num: usize) -> Vec<f64> {
    if num < 2 {
        return vec![start];
    }
    (0..num)
        .map(|i| start + (end - start) * i as f64 / (num - 1) as f64)
        .collect()
}

/// Generate values in `[start, stop)` with a fixed step
///
/// Follows numpy's `arange`: the number of samples is `ceil((stop - start) / step)`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step == 0.0 || (stop - start) / step <= 0.0 {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Two-sided FFT bin frequencies `k * fs / nfft` for `k = 0..nfft`
pub fn frequency_vector(fs: f64, nfft: usize) -> Vec<f64> {
    (0..nfft).map(|k| k as f64 * fs / nfft as f64).collect()
}

/// Normalize complex pressure by its peak magnitude
///
/// With `log = true` the normalized magnitude is returned as `10 log10(|p| / max|p|)`.
/// A field that is identically zero normalizes to zeros.
pub fn normalize_pressure(p: &Array2<Complex64>, log: bool) -> Array2<f64> {
    let magnitude = p.mapv(|v| v.norm());
    let peak = magnitude.iter().cloned().fold(0.0, f64::max);
    if peak <= 0.0 {
        return magnitude;
    }
    let normalized = magnitude / peak;
    if log {
        normalized.mapv(|v| 10.0 * v.log10())
    } else {
        normalized
    }
}

//! Complex pressure and covariance estimation from multichannel time series
//!
//! Data are laid out as (samples × channels). For each frequency the series is
//! cut into segments, transformed with an `nfft`-point DFT and the bin with
//! the largest channel-averaged magnitude near the target frequency is kept.

use crate::beamforming::covariance;
use crate::error::{Result, SignalError};
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, s};
use num_complex::Complex64;
use oa_common::{frequency_vector, write_npy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Taper applied to each segment before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// Symmetric Hann window
    Hann,
    /// Symmetric Hamming window
    Hamming,
}

impl Window {
    /// Window coefficients of length `n`
    pub fn coefficients(&self, n: usize) -> Vec<f64> {
        if n == 1 {
            return vec![1.0];
        }
        let (a0, a1) = match self {
            Window::Hann => (0.5, 0.5),
            Window::Hamming => (0.54, 0.46),
        };
        (0..n)
            .map(|i| a0 - a1 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
            .collect()
    }
}

/// Transform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FftParameters {
    /// Transform length; segments are zero-padded or truncated to it
    pub nfft: usize,
    /// Optional taper
    #[serde(default)]
    pub window: Option<Window>,
}

/// Search band around the target frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakFinding {
    /// Band below the target [Hz]
    pub lower_bw: f64,
    /// Band above the target [Hz]
    pub upper_bw: f64,
}

impl Default for PeakFinding {
    fn default() -> Self {
        Self {
            lower_bw: 1.0,
            upper_bw: 1.0,
        }
    }
}

/// Indices of the bins in `[freq - lower_bw, freq + upper_bw)`
pub fn band_bins(fvec: &[f64], freq: f64, peak: &PeakFinding) -> Result<Vec<usize>> {
    let (lower, upper) = (freq - peak.lower_bw, freq + peak.upper_bw);
    let bins: Vec<usize> = fvec
        .iter()
        .enumerate()
        .filter(|(_, f)| **f >= lower && **f < upper)
        .map(|(i, _)| i)
        .collect();
    if bins.is_empty() {
        return Err(SignalError::EmptyBand { lower, upper });
    }
    Ok(bins)
}

/// DFT of every channel at the requested bins, shape (bins × channels)
pub fn dft_bins(segment: ArrayView2<f64>, nfft: usize, bins: &[usize]) -> Array2<Complex64> {
    let n = segment.nrows().min(nfft);
    Array2::from_shape_fn((bins.len(), segment.ncols()), |(b, ch)| {
        let k = bins[b] as f64;
        (0..n)
            .map(|t| {
                let phase = -2.0 * PI * k * t as f64 / nfft as f64;
                Complex64::from_polar(segment[[t, ch]], phase)
            })
            .sum()
    })
}

/// Row of `x` (bins × channels) with the largest channel-averaged magnitude
pub fn find_freq_bin(x: &Array2<Complex64>) -> usize {
    let energy = x.map(|v| v.norm()).mean_axis(Axis(1));
    let mut best = 0;
    if let Some(energy) = energy {
        for (i, e) in energy.iter().enumerate() {
            if *e > energy[best] {
                best = i;
            }
        }
    }
    best
}

/// Complex pressure per segment and the frequency of the bin used
///
/// Segments of `samples_per_segment` samples start every `segments_every_n`
/// samples (default: back to back). Returns (segments × channels) pressure
/// and the per-segment bin frequency.
pub fn get_complex_pressure(
    data: ArrayView2<f64>,
    fs: f64,
    freq: f64,
    fft: &FftParameters,
    peak: &PeakFinding,
    samples_per_segment: usize,
    segments_every_n: Option<usize>,
) -> Result<(Array2<Complex64>, Array1<f64>)> {
    if samples_per_segment == 0 || fft.nfft == 0 {
        return Err(SignalError::InvalidArgument(
            "segment length and nfft must be positive".to_string(),
        ));
    }
    let every = segments_every_n.unwrap_or(samples_per_segment).max(1);
    let num_segments = data.nrows() / every;
    let fvec = frequency_vector(fs, fft.nfft);
    let bins = band_bins(&fvec, freq, peak)?;

    let mut pressure = Array2::zeros((num_segments, data.ncols()));
    let mut f_hist = Array1::zeros(num_segments);
    for i in 0..num_segments {
        let start = i * every;
        let end = (start + samples_per_segment).min(data.nrows());
        let mut segment = data.slice(s![start..end, ..]).to_owned();
        if let Some(window) = fft.window {
            let w = Array1::from(window.coefficients(segment.nrows()));
            segment *= &w.insert_axis(Axis(1));
        }
        let x = dft_bins(segment.view(), fft.nfft, &bins);
        let best = find_freq_bin(&x);
        pressure.row_mut(i).assign(&x.row(best));
        f_hist[i] = fvec[bins[best]];
    }
    Ok((pressure, f_hist))
}

/// One covariance matrix per snapshot, shape (snapshots × channels × channels)
///
/// With `normalize` each snapshot is scaled to unit norm first; all-zero
/// snapshots are left as zeros.
pub fn get_covariance(p: &Array2<Complex64>, normalize: bool) -> Array3<Complex64> {
    let (snapshots, channels) = p.dim();
    let mut k = Array3::zeros((snapshots, channels, channels));
    for (i, row) in p.axis_iter(Axis(0)).enumerate() {
        let mut d = row.to_owned();
        if normalize {
            let norm = d.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
            if norm > 0.0 {
                d.mapv_inplace(|v| v / norm);
            }
        }
        k.slice_mut(s![i, .., ..]).assign(&covariance(d.view(), d.view()));
    }
    k
}

/// Average consecutive covariance matrices
///
/// The snapshots are split into `len / n` nearly equal groups (the first
/// groups take one extra matrix when the split is uneven) and each group is
/// replaced by its mean.
pub fn average_covariance(k: &Array3<Complex64>, n: usize) -> Result<Array3<Complex64>> {
    let total = k.len_of(Axis(0));
    let groups = if n == 0 { 0 } else { total / n };
    if groups == 0 {
        return Err(SignalError::InvalidArgument(format!(
            "cannot average {total} covariance matrices in groups of {n}"
        )));
    }
    let (base, extra) = (total / groups, total % groups);
    let (_, rows, cols) = k.dim();
    let mut averaged = Array3::zeros((groups, rows, cols));
    let mut start = 0;
    for g in 0..groups {
        let len = base + usize::from(g < extra);
        let mean = k
            .slice(s![start..start + len, .., ..])
            .mean_axis(Axis(0))
            .ok_or_else(|| SignalError::InvalidArgument("empty covariance group".to_string()))?;
        averaged.slice_mut(s![g, .., ..]).assign(&mean);
        start += len;
    }
    Ok(averaged)
}

/// Options for [`Processor::process`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Samples per segment
    pub samples_per_segment: usize,
    /// Hop between segment starts (default: segment length)
    pub segments_every_n: Option<usize>,
    /// Also estimate covariance matrices
    pub compute_covariance: bool,
    /// Scale snapshots to unit norm before the outer product
    pub normalize_covariance: bool,
    /// Average this many consecutive covariance matrices
    pub covariance_averaging: Option<usize>,
    /// Output directory
    pub destination: PathBuf,
    /// Worker threads
    pub max_workers: usize,
}

impl ProcessOptions {
    /// Back-to-back segments with normalized covariance, written to `destination`
    pub fn new(samples_per_segment: usize, destination: impl Into<PathBuf>) -> Self {
        Self {
            samples_per_segment,
            segments_every_n: None,
            compute_covariance: true,
            normalize_covariance: true,
            covariance_averaging: None,
            destination: destination.into(),
            max_workers: 8,
        }
    }
}

/// Computes complex pressure and covariance for several frequencies
#[derive(Debug, Clone)]
pub struct Processor {
    /// Time series (samples × channels)
    pub data: Array2<f64>,
    /// Sampling rate [Hz]
    pub fs: f64,
    /// Frequencies to process [Hz]
    pub frequencies: Vec<f64>,
    /// Transform settings
    pub fft: FftParameters,
    /// Peak search band
    pub peak: PeakFinding,
}

impl Processor {
    /// Process every frequency in parallel and save the results
    ///
    /// Writes `<destination>/<freq>Hz/data.npy`, `f_hist.npy` and, when
    /// requested, `covariance.npy`.
    pub fn process(&self, options: &ProcessOptions) -> Result<()> {
        log::info!("Processing data for {:?} Hz.", self.frequencies);
        log::info!(
            "Loaded data with shape ({} samples x {} channels)",
            self.data.nrows(),
            self.data.ncols()
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_workers.max(1))
            .build()
            .map_err(|e| SignalError::InvalidArgument(format!("failed to build worker pool: {e}")))?;
        pool.install(|| {
            self.frequencies
                .par_iter()
                .map(|&freq| self.process_frequency(freq, options))
                .collect::<Result<Vec<()>>>()
        })?;
        log::info!("{:?} Hz: Processing complete.", self.frequencies);
        Ok(())
    }

    fn process_frequency(&self, freq: f64, options: &ProcessOptions) -> Result<()> {
        log::info!("{freq} Hz: Computing complex pressure.");
        let (p, f_hist) = get_complex_pressure(
            self.data.view(),
            self.fs,
            freq,
            &self.fft,
            &self.peak,
            options.samples_per_segment,
            options.segments_every_n,
        )?;

        let savepath = output_dir(&options.destination, freq);
        std::fs::create_dir_all(&savepath)?;
        write_npy(savepath.join("data.npy"), &p)?;
        write_npy(savepath.join("f_hist.npy"), &f_hist)?;

        if options.compute_covariance {
            log::info!("{freq} Hz: Computing covariance matrices.");
            let mut k = get_covariance(&p, options.normalize_covariance);
            if let Some(n) = options.covariance_averaging {
                k = average_covariance(&k, n)?;
            }
            write_npy(savepath.join("covariance.npy"), &k)?;
        }
        log::info!("{freq} Hz: Data saved to {}.", savepath.display());
        Ok(())
    }
}

/// Directory holding the results for one frequency
pub fn output_dir(destination: &Path, freq: f64) -> PathBuf {
    destination.join(format!("{freq:.1}Hz"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tone(fs: f64, freq: f64, n: usize, channels: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, channels), |(t, ch)| {
            (2.0 * PI * freq * t as f64 / fs + ch as f64 * 0.5).cos()
        })
    }

    #[test]
    fn test_window_coefficients() {
        let hann = Window::Hann.coefficients(5);
        assert_relative_eq!(hann[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(hann[2], 1.0, epsilon = 1e-12);
        let hamming = Window::Hamming.coefficients(5);
        assert_relative_eq!(hamming[0], 0.08, epsilon = 1e-12);
        assert_eq!(Window::Hann.coefficients(1), vec![1.0]);
    }

    #[test]
    fn test_band_bins() {
        let fvec = frequency_vector(100.0, 100);
        assert_eq!(band_bins(&fvec, 10.0, &PeakFinding::default()).unwrap(), vec![9, 10]);
        let narrow = PeakFinding {
            lower_bw: 0.2,
            upper_bw: 0.2,
        };
        assert!(band_bins(&fvec, 10.5, &narrow).is_err());
    }

    #[test]
    fn test_complex_pressure_finds_tone() {
        let fs = 1000.0;
        let data = tone(fs, 125.0, 1024, 3);
        let fft = FftParameters {
            nfft: 256,
            window: None,
        };
        let peak = PeakFinding {
            lower_bw: 10.0,
            upper_bw: 10.0,
        };
        let (p, f_hist) =
            get_complex_pressure(data.view(), fs, 120.0, &fft, &peak, 256, None).unwrap();
        assert_eq!(p.dim(), (4, 3));
        assert!(f_hist.iter().all(|&f| (f - 125.0).abs() < 1e-9));
        // On-bin cosine: |X| = nfft / 2 and the channel phase offsets survive
        assert_relative_eq!(p[[0, 0]].norm(), 128.0, epsilon = 1e-6);
        assert_relative_eq!(p[[0, 1]].arg() - p[[0, 0]].arg(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_segments() {
        let data = tone(1000.0, 125.0, 1000, 1);
        let fft = FftParameters {
            nfft: 200,
            window: Some(Window::Hann),
        };
        let (p, _) = get_complex_pressure(
            data.view(),
            1000.0,
            125.0,
            &fft,
            &PeakFinding::default(),
            200,
            Some(100),
        )
        .unwrap();
        // 1000 / 100 segments; the last ones are shorter than the segment length
        assert_eq!(p.nrows(), 10);
    }

    #[test]
    fn test_normalized_covariance_has_unit_trace() {
        let p = Array2::from_shape_fn((3, 4), |(i, j)| Complex64::new(i as f64 + 1.0, j as f64));
        let k = get_covariance(&p, true);
        assert_eq!(k.dim(), (3, 4, 4));
        for i in 0..3 {
            let trace: Complex64 = k.slice(s![i, .., ..]).diag().sum();
            assert_relative_eq!(trace.re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(trace.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_average_covariance_uneven_split() {
        let k = Array3::from_shape_fn((7, 1, 1), |(i, _, _)| Complex64::new(i as f64, 0.0));
        let avg = average_covariance(&k, 3).unwrap();
        // 7 matrices in 2 groups: [0..4) and [4..7)
        assert_eq!(avg.dim(), (2, 1, 1));
        assert_relative_eq!(avg[[0, 0, 0]].re, 1.5);
        assert_relative_eq!(avg[[1, 0, 0]].re, 5.0);
        assert!(average_covariance(&k, 8).is_err());
        assert!(average_covariance(&k, 0).is_err());
    }

    #[test]
    fn test_processor_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let processor = Processor {
            data: tone(1000.0, 125.0, 2048, 2),
            fs: 1000.0,
            frequencies: vec![125.0, 250.0],
            fft: FftParameters {
                nfft: 256,
                window: None,
            },
            peak: PeakFinding::default(),
        };
        let mut options = ProcessOptions::new(256, dir.path());
        options.covariance_averaging = Some(2);
        processor.process(&options).unwrap();
        for freq in [125.0, 250.0] {
            let out = output_dir(dir.path(), freq);
            assert!(out.join("data.npy").exists());
            assert!(out.join("f_hist.npy").exists());
            assert!(out.join("covariance.npy").exists());
        }
        assert!(dir.path().join("125.0Hz").is_dir());
    }
}

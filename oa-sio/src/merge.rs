//! Merging converted recordings into one time-windowed stream
//!
//! Consecutive `.npy` files written by [`convert_files`](crate::convert_files)
//! are stacked in file-name order, stamped with times from a base time and
//! sampling rate, and cut to an analysis window. Times are written
//! `yj HH:MM`: two-digit year and day of year, e.g. `21135 12:00`.

use crate::convert::remove_channels;
use crate::error::{Result, SioError};
use chrono::{DateTime, NaiveDateTime, Utc};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2, s};
use oa_common::{CommonError, read_npy, write_npy};
use oa_signal::timeseries::{create_datetime_vector, create_time_vector, get_time_index};
use std::fs;
use std::path::{Path, PathBuf};

/// `chrono` layout of a `yj HH:MM` time stamp
pub const DAY_TIME_FORMAT: &str = "%y%j %H:%M";

const X_FILE: &str = "X.npy";
const T_FILE: &str = "t.npy";

/// Parse a `yj HH:MM` time stamp as UTC
pub fn parse_day_time(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), DAY_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| SioError::TimeFormat {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Samples with their times
#[derive(Debug, Clone, PartialEq)]
pub struct DataStream {
    /// `(samples, channels)`
    pub x: Array2<f64>,
    /// Seconds since the base time, one per row of `x`
    pub t: Array1<f64>,
}

impl DataStream {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Write `X.npy` and `t.npy` into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_npy(dir.join(X_FILE), &self.x)?;
        write_npy(dir.join(T_FILE), &self.t)?;
        log::info!("Saved {} samples to {}", self.len(), dir.display());
        Ok(())
    }

    /// Read a stream written by [`DataStream::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let x = read_npy::<_, f64, Ix2>(dir.join(X_FILE))?;
        let t = read_npy::<_, f64, Ix1>(dir.join(T_FILE))?;
        if t.len() != x.nrows() {
            return Err(CommonError::LengthMismatch {
                property: "t",
                expected: x.nrows(),
                got: t.len(),
            }
            .into());
        }
        Ok(Self { x, t })
    }
}

/// Analysis window over a merged recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeWindow {
    /// Time of the first sample of the first file
    pub base_time: DateTime<Utc>,
    /// First time kept
    pub start: DateTime<Utc>,
    /// Times from here on are dropped
    pub end: DateTime<Utc>,
    /// Sampling frequency [Hz]
    pub fs: f64,
}

impl MergeWindow {
    /// Window from `yj HH:MM` stamps
    pub fn parse(base_time: &str, start: &str, end: &str, fs: f64) -> Result<Self> {
        Ok(Self {
            base_time: parse_day_time(base_time)?,
            start: parse_day_time(start)?,
            end: parse_day_time(end)?,
            fs,
        })
    }
}

/// Stack `files` in path order, drop `channels_to_remove`, and keep the
/// samples with times in `[window.start, window.end)`
pub fn merge_npy_files(
    files: &[PathBuf],
    window: &MergeWindow,
    channels_to_remove: &[usize],
) -> Result<DataStream> {
    if window.fs.is_nan() || window.fs <= 0.0 {
        return Err(SioError::SampleRate(window.fs));
    }
    if files.is_empty() {
        return Err(SioError::NoFiles);
    }
    let mut files = files.to_vec();
    files.sort();

    let parts = files
        .iter()
        .map(|path| Ok(read_npy::<_, f64, Ix2>(path)?))
        .collect::<Result<Vec<_>>>()?;
    let channels = parts[0].ncols();
    if let Some((path, part)) = files.iter().zip(&parts).find(|(_, p)| p.ncols() != channels) {
        return Err(SioError::ChannelCount {
            path: path.clone(),
            expected: channels,
            got: part.ncols(),
        });
    }

    let total: usize = parts.iter().map(Array2::nrows).sum();
    let mut data = Array2::<f64>::zeros((total, channels));
    let mut row = 0;
    for part in &parts {
        data.slice_mut(s![row..row + part.nrows(), ..]).assign(part);
        row += part.nrows();
    }
    let data = remove_channels(&data, channels_to_remove)?;

    log::info!("Base time: {}", window.base_time);
    log::info!("Start time: {}", window.start);
    log::info!("End time: {}", window.end);
    let t = create_time_vector(data.nrows(), window.fs);
    let dt = create_datetime_vector(&t, window.base_time);
    let keep: Vec<usize> = get_time_index(&dt, Some(window.start), Some(window.end))
        .iter()
        .enumerate()
        .filter_map(|(i, &inside)| inside.then_some(i))
        .collect();
    log::debug!(
        "merged {} files, {total} samples, {} inside the window",
        files.len(),
        keep.len()
    );

    Ok(DataStream {
        x: data.select(Axis(0), &keep),
        t: keep.iter().map(|&i| t[i]).collect(),
    })
}

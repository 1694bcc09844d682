//! Source and receiver arrays
//!
//! Depths are in metres, receiver ranges in kilometres and range offsets in
//! metres, matching the units the Acoustics Toolbox expects in its input files.

use crate::error::{CommonError, Result};
use crate::types::{Point3D, constants::METERS_PER_KM};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

fn round_depths(z: &[f64]) -> Vec<f64> {
    z.iter().map(|v| (v * 1e3).round() / 1e3).collect()
}

fn is_equally_spaced(z: &[f64]) -> bool {
    if z.len() < 2 {
        return true;
    }
    let step = z[1] - z[0];
    z.windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= 1e-8 + 1e-5 * step.abs())
}

/// Acoustic source array (one or more source depths)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Depths of the array elements [m]
    pub z: Vec<f64>,
}

impl Source {
    /// Create a source array; depths are rounded to the millimetre
    pub fn new(z: impl Into<Vec<f64>>) -> Result<Self> {
        let z = z.into();
        if z.is_empty() {
            return Err(CommonError::EmptyArray("source"));
        }
        Ok(Self { z: round_depths(&z) })
    }

    /// Number of elements
    pub fn nz(&self) -> usize {
        self.z.len()
    }

    /// True if the depths have constant spacing (or there is a single element)
    pub fn equally_spaced(&self) -> bool {
        is_equally_spaced(&self.z)
    }
}

/// Acoustic receiver array with the ranges at which the field is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    /// Depths of the array elements [m]; tilted depths once a tilt is applied
    pub z: Vec<f64>,
    /// Receiver ranges [km]
    pub r: Vec<f64>,
    /// Array tilt [deg]
    pub tilt: Option<f64>,
    /// Array azimuth [deg]
    pub azimuth: f64,
    /// Pivot depth of the tilt [m]; defaults to the deepest element
    pub z_pivot: Option<f64>,
    /// Range offsets [m], shape (depths, ranges)
    pub r_offsets: Option<Array2<f64>>,
    /// 3-D element coordinates of a tilted array
    pub coords: Option<Vec<Point3D>>,
}

impl Receiver {
    /// Create a vertical receiver array
    ///
    /// A leading zero range is dropped, since the field is singular there.
    pub fn new(z: impl Into<Vec<f64>>, r: impl Into<Vec<f64>>) -> Result<Self> {
        let z = z.into();
        if z.is_empty() {
            return Err(CommonError::EmptyArray("receiver depth"));
        }
        let mut r = r.into();
        if r.first() == Some(&0.0) {
            r.remove(0);
        }
        if r.is_empty() {
            return Err(CommonError::EmptyArray("receiver range"));
        }
        Ok(Self {
            z: round_depths(&z),
            r,
            tilt: None,
            azimuth: 0.0,
            z_pivot: None,
            r_offsets: None,
            coords: None,
        })
    }

    /// Tilt the array about a pivot depth
    ///
    /// Element depths are replaced by the depressed depths of the tilted array
    /// and range offsets are computed for every element and range.
    pub fn with_tilt(mut self, tilt: f64, azimuth: Option<f64>, z_pivot: Option<f64>) -> Self {
        let azimuth = azimuth.unwrap_or(0.0);
        let (offsets, coords) = compute_range_offsets(&self.r, &self.z, tilt, azimuth, z_pivot);
        self.z = coords.iter().map(|p| p.z).collect();
        self.tilt = Some(tilt);
        self.azimuth = azimuth;
        self.z_pivot = z_pivot;
        self.r_offsets = Some(offsets);
        self.coords = Some(coords);
        self
    }

    /// Use explicit range offsets [m]
    ///
    /// Accepts one offset per depth (applied at every range) or a full
    /// (depths, ranges) matrix.
    pub fn with_offsets(mut self, offsets: Array2<f64>) -> Result<Self> {
        let (nz, nr) = (self.nz(), self.nr());
        let offsets = match offsets.dim() {
            (m, n) if m == nz && n == nr => offsets,
            (m, 1) if m == nz => offsets
                .column(0)
                .broadcast((nr, nz))
                .map(|b| b.t().to_owned())
                .ok_or_else(|| CommonError::OffsetShape {
                    got: vec![m, 1],
                    depths: nz,
                    ranges: nr,
                })?,
            (m, n) => {
                return Err(CommonError::OffsetShape {
                    got: vec![m, n],
                    depths: nz,
                    ranges: nr,
                });
            }
        };
        self.r_offsets = Some(offsets);
        Ok(self)
    }

    /// Number of receiver depths
    pub fn nz(&self) -> usize {
        self.z.len()
    }

    /// Number of receiver ranges
    pub fn nr(&self) -> usize {
        self.r.len()
    }

    /// Minimum range [km]
    pub fn r_min(&self) -> f64 {
        self.r.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    /// Maximum range [km]
    pub fn r_max(&self) -> f64 {
        self.r.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Ranges converted to metres
    pub fn r_meters(&self) -> Array1<f64> {
        self.r.iter().map(|r| r * METERS_PER_KM).collect()
    }

    /// True if the depths have constant spacing (or there is a single element)
    pub fn equally_spaced(&self) -> bool {
        is_equally_spaced(&self.z)
    }
}

/// 3-D coordinates of a tilted line array
///
/// `hyp = |z_pivot - z|`, `x = hyp sin(tilt) sin(az)`, `y = hyp sin(tilt) cos(az)`,
/// `z = z_pivot - hyp cos(tilt)`. Angles in degrees.
pub fn array_tilt(z: &[f64], tilt: f64, azimuth: f64, z_pivot: Option<f64>) -> Vec<Point3D> {
    let z_pivot = z_pivot.unwrap_or_else(|| z.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
    let (tilt, azimuth) = (tilt.to_radians(), azimuth.to_radians());
    z.iter()
        .map(|&depth| {
            let hyp = (z_pivot - depth).abs();
            Point3D::new(
                hyp * tilt.sin() * azimuth.sin(),
                hyp * tilt.sin() * azimuth.cos(),
                z_pivot - hyp * tilt.cos(),
            )
        })
        .collect()
}

/// Range offsets [m] of a tilted array, accounting for both the horizontal
/// displacement and the depression of each element
///
/// Returns the (elements, ranges) offset matrix and the tilted coordinates.
pub fn compute_range_offsets(
    r_km: &[f64],
    z: &[f64],
    tilt: f64,
    azimuth: f64,
    z_pivot: Option<f64>,
) -> (Array2<f64>, Vec<Point3D>) {
    let coords = array_tilt(z, tilt, azimuth, z_pivot);
    let offsets = Array2::from_shape_fn((coords.len(), r_km.len()), |(m, n)| {
        let range = r_km[n] * METERS_PER_KM;
        let element = coords[m];
        let total = (element.x.powi(2) + (element.y - range).powi(2)).sqrt();
        total - range
    });
    (offsets, coords)
}

/// Rotate 3-D coordinates about the z-axis by `theta` degrees
///
/// Points are treated as row vectors multiplied by the rotation matrix, so a
/// positive angle turns the array clockwise when viewed from above.
pub fn rotate_z(points: &[Point3D], theta: f64) -> Vec<Point3D> {
    let (s, c) = theta.to_radians().sin_cos();
    points
        .iter()
        .map(|p| Point3D::new(p.x * c + p.y * s, -p.x * s + p.y * c, p.z))
        .collect()
}

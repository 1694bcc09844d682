//! Sound speed profiles
//!
//! A profile samples the geoacoustic properties of one layer at a set of
//! depths. Every property other than depth may be supplied either as a single
//! value (applied at every depth) or as one value per depth.

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A property given as one value or as one value per depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// Single value broadcast to every depth
    One(f64),
    /// One value per depth
    Many(Vec<f64>),
}

impl OneOrMany {
    /// Values as a slice view
    pub fn as_slice(&self) -> &[f64] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }

    /// Number of values supplied
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True if no value was supplied
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Convert into a vector
    pub fn to_vec(&self) -> Vec<f64> {
        self.as_slice().to_vec()
    }
}

impl From<f64> for OneOrMany {
    fn from(v: f64) -> Self {
        OneOrMany::One(v)
    }
}

impl From<Vec<f64>> for OneOrMany {
    fn from(v: Vec<f64>) -> Self {
        OneOrMany::Many(v)
    }
}

impl From<&[f64]> for OneOrMany {
    fn from(v: &[f64]) -> Self {
        OneOrMany::Many(v.to_vec())
    }
}

/// Geoacoustic profile of a single layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSpeedProfile {
    /// Depths [m]
    pub z: Vec<f64>,
    /// Compressional sound speed [m/s]
    pub c_p: Vec<f64>,
    /// Shear sound speed [m/s]
    pub c_s: Vec<f64>,
    /// Density [g/cm³]
    pub rho: Vec<f64>,
    /// Compressional attenuation
    pub a_p: Vec<f64>,
    /// Shear attenuation
    pub a_s: Vec<f64>,
}

impl SoundSpeedProfile {
    /// Create a fluid profile with unit density and no attenuation
    pub fn new(z: impl Into<OneOrMany>, c_p: impl Into<OneOrMany>) -> Result<Self> {
        Self::with_properties(z, c_p, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a profile from every property, broadcasting single values
    pub fn with_properties(
        z: impl Into<OneOrMany>,
        c_p: impl Into<OneOrMany>,
        c_s: impl Into<OneOrMany>,
        rho: impl Into<OneOrMany>,
        a_p: impl Into<OneOrMany>,
        a_s: impl Into<OneOrMany>,
    ) -> Result<Self> {
        let z = z.into().to_vec();
        if z.is_empty() {
            return Err(CommonError::EmptyProfile);
        }
        if let Some(index) = z.windows(2).position(|w| w[1] < w[0]) {
            return Err(CommonError::NonMonotonicDepth {
                index: index + 1,
                value: z[index + 1],
            });
        }

        let n = z.len();
        Ok(Self {
            c_p: broadcast("c_p", c_p.into(), n)?,
            c_s: broadcast("c_s", c_s.into(), n)?,
            rho: broadcast("rho", rho.into(), n)?,
            a_p: broadcast("a_p", a_p.into(), n)?,
            a_s: broadcast("a_s", a_s.into(), n)?,
            z,
        })
    }

    /// Canonical Munk profile sampled every `dz` metres from 0 to `z_max`
    pub fn munk(z_max: f64, dz: f64) -> Result<Self> {
        const B: f64 = 1200.0;
        const Z0: f64 = 1200.0;
        const C0: f64 = 1492.0;
        const EPSILON: f64 = 0.006;

        let z = crate::types::arange(0.0, z_max + dz, dz);
        let c_p: Vec<f64> = z
            .iter()
            .map(|&depth| {
                let eta = 2.0 * (depth - Z0) / B;
                C0 * (1.0 + EPSILON * (eta + (-eta).exp() - 1.0))
            })
            .collect();
        Self::new(z, c_p)
    }

    /// Load a fluid profile from a delimited depth/speed file
    ///
    /// `zcol` and `ccol` are zero-based column indices. When `header` is the
    /// zero-based line number of a header row, that line and every line
    /// before it are skipped. The delimiter is taken from the first data
    /// row: comma, semicolon or tab if present, whitespace otherwise.
    pub fn from_delimited<P: AsRef<Path>>(
        path: P,
        zcol: usize,
        ccol: usize,
        header: Option<usize>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let first_data = header.map_or(0, |h| h + 1);

        let mut delimiter = None;
        let mut z = Vec::new();
        let mut c_p = Vec::new();
        for (index, line) in reader.lines().enumerate().skip(first_data) {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let delimiter = *delimiter.get_or_insert_with(|| {
                [',', ';', '\t'].into_iter().find(|d| line.contains(*d))
            });
            let fields: Vec<&str> = match delimiter {
                Some(d) => line.split(d).map(str::trim).collect(),
                None => line.split_whitespace().collect(),
            };

            let row_error = |message: String| CommonError::ProfileRow {
                path: path.display().to_string(),
                line: index + 1,
                message,
            };
            let column = |col: usize| -> Result<f64> {
                let field = fields.get(col).ok_or_else(|| {
                    row_error(format!("expected column {col}, row has {}", fields.len()))
                })?;
                field
                    .parse::<f64>()
                    .map_err(|_| row_error(format!("column {col}: `{field}` is not a number")))
            };
            z.push(column(zcol)?);
            c_p.push(column(ccol)?);
        }

        log::debug!("read {} profile samples from {}", z.len(), path.display());
        Self::new(z, c_p)
    }

    /// Number of depth samples
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// True if the profile holds no samples (never true for a constructed profile)
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Shallowest depth
    pub fn z_min(&self) -> f64 {
        self.z[0]
    }

    /// Deepest depth
    pub fn z_max(&self) -> f64 {
        self.z.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Maximum compressional speed in the profile
    pub fn c_p_max(&self) -> f64 {
        self.c_p.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

fn broadcast(property: &'static str, values: OneOrMany, n: usize) -> Result<Vec<f64>> {
    match values.len() {
        1 => Ok(vec![values.as_slice()[0]; n]),
        len if len == n => Ok(values.to_vec()),
        got => Err(CommonError::LengthMismatch {
            property,
            expected: n,
            got,
        }),
    }
}

/// Latitude used when a pressure-based equation is evaluated without one [deg]
pub const DEFAULT_LATITUDE: f64 = 45.0;

/// Empirical equations for the speed of sound in sea water
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundSpeedEquation {
    /// Chen and Millero (1977) with the Wong and Zhu (1995) ITS-90
    /// coefficients. Works in pressure, valid for 0-40 °C, 0-40 ppt, 0-1000 bar.
    #[default]
    Unesco,
    /// Del Grosso (1974), Wong and Zhu (1995) form.
    /// Valid for 0-30 °C, 30-40 ppt, 0-1000 kg/cm².
    DelGrosso,
    /// Mackenzie (1981) nine-term equation.
    /// Valid for 2-30 °C, 25-40 ppt, 0-8000 m.
    Mackenzie,
    /// Coppens (1981).
    /// Valid for 0-35 °C, 0-45 ppt, 0-4000 m.
    Coppens,
}

// Chen-Millero coefficients, rows are powers of pressure, columns powers of temperature
const UNESCO_A: [[f64; 5]; 4] = [
    [1.389, -1.262e-2, 7.166e-5, 2.008e-6, -3.21e-8],
    [9.4742e-5, -1.2583e-5, -6.4928e-8, 1.0515e-8, -2.0142e-10],
    [-3.9064e-7, 9.1061e-9, -1.6009e-10, 7.994e-12, 0.0],
    [1.100e-10, 6.651e-12, -3.391e-13, 0.0, 0.0],
];
const UNESCO_B: [[f64; 2]; 2] = [[-1.922e-2, -4.42e-5], [7.3637e-5, 1.7950e-7]];
const UNESCO_C: [[f64; 6]; 4] = [
    [1402.388, 5.03830, -5.81090e-2, 3.3432e-4, -1.47797e-6, 3.1419e-9],
    [0.153563, 6.8999e-4, -8.1829e-6, 1.3632e-7, -6.1260e-10, 0.0],
    [3.1260e-5, -1.7111e-6, 2.5986e-8, -2.5353e-10, 1.0415e-12, 0.0],
    [-9.7729e-9, 3.8513e-10, -2.3654e-12, 0.0, 0.0, 0.0],
];
const UNESCO_D: [f64; 2] = [1.727e-3, -7.9836e-6];

/// Sum of `coef[i][j] * p^i * t^j`
fn poly2<const N: usize>(coef: &[[f64; N]], p: f64, t: f64) -> f64 {
    coef.iter()
        .enumerate()
        .map(|(i, row)| {
            let inner: f64 = row.iter().rev().fold(0.0, |acc, c| acc * t + c);
            inner * p.powi(i as i32)
        })
        .sum()
}

fn unesco(p_bar: f64, s: f64, t: f64) -> f64 {
    let c = poly2(&UNESCO_C[..], p_bar, t);
    let a = poly2(&UNESCO_A[..], p_bar, t);
    let b = poly2(&UNESCO_B[..], p_bar, t);
    let d = UNESCO_D[0] + UNESCO_D[1] * p_bar;
    c + a * s + b * s.powf(1.5) + d * s * s
}

fn del_grosso(p: f64, s: f64, t: f64) -> f64 {
    const C000: f64 = 1402.392;
    let dct = 5.012285 * t - 0.551184e-1 * t.powi(2) + 0.221649e-3 * t.powi(3);
    let dcs = 1.329530 * s + 0.1288598e-3 * s.powi(2);
    let dcp = 0.1560592 * p + 0.2449993e-4 * p.powi(2) - 0.8833959e-8 * p.powi(3);
    let dcstp = 0.6353509e-2 * t * p - 0.4383615e-6 * t.powi(3) * p - 0.1593895e-5 * t * p.powi(2)
        + 0.2656174e-7 * t.powi(2) * p.powi(2)
        + 0.5222483e-9 * t * p.powi(3)
        - 0.1275936e-1 * s * t
        + 0.9688441e-4 * s * t.powi(2)
        - 0.3406824e-3 * s * t * p
        + 0.4857614e-5 * s.powi(2) * t * p
        - 0.1616745e-8 * s.powi(2) * p.powi(2);
    C000 + dct + dcs + dcp + dcstp
}

impl SoundSpeedEquation {
    /// Sound speed [m/s] at depth `z` [m], salinity `s` [ppt], temperature `t` [°C]
    ///
    /// Pressure-based equations assume [`DEFAULT_LATITUDE`].
    pub fn sound_speed(&self, z: f64, s: f64, t: f64) -> f64 {
        self.sound_speed_at(z, s, t, DEFAULT_LATITUDE)
    }

    /// Sound speed with the depth to pressure conversion done at `latitude` [deg]
    pub fn sound_speed_at(&self, z: f64, s: f64, t: f64, latitude: f64) -> f64 {
        match self {
            SoundSpeedEquation::Unesco => unesco(10.0 * depth_to_pressure(z, latitude), s, t),
            SoundSpeedEquation::DelGrosso => {
                // kg/cm² per MPa
                del_grosso(10.1972 * depth_to_pressure(z, latitude), s, t)
            }
            SoundSpeedEquation::Mackenzie => {
                1448.96 + 4.591 * t - 5.304e-2 * t.powi(2) + 2.374e-4 * t.powi(3)
                    + 1.340 * (s - 35.0)
                    + 1.630e-2 * z
                    + 1.675e-7 * z.powi(2)
                    - 1.025e-2 * t * (s - 35.0)
                    - 7.139e-13 * t * z.powi(3)
            }
            SoundSpeedEquation::Coppens => {
                // Coppens works in tens of degrees and kilometres
                let t = t / 10.0;
                let z = z / 1e3;
                let c0 = 1449.05 + 45.7 * t - 5.21 * t.powi(2)
                    + 0.23 * t.powi(3)
                    + (1.333 - 0.126 * t + 0.009 * t.powi(2)) * (s - 35.0);
                c0 + (16.23 + 0.253 * t) * z
                    + (0.213 - 0.1 * t) * z.powi(2)
                    + (0.016 + 0.0002 * (s - 35.0)) * (s - 35.0) * t * z
            }
        }
    }

    /// Evaluate along a CTD cast; the three slices must have equal length
    pub fn profile(&self, z: &[f64], s: &[f64], t: &[f64]) -> Result<Vec<f64>> {
        for (property, values) in [("salinity", s), ("temperature", t)] {
            if values.len() != z.len() {
                return Err(CommonError::LengthMismatch {
                    property,
                    expected: z.len(),
                    got: values.len(),
                });
            }
        }
        Ok(z
            .iter()
            .zip(s)
            .zip(t)
            .map(|((&z, &s), &t)| self.sound_speed(z, s, t))
            .collect())
    }
}

/// Gauge pressure [MPa] at depth `z` [m] in a common ocean (Leroy and Parthiot, 1998)
pub fn depth_to_pressure(z: f64, latitude: f64) -> f64 {
    let h45 = 1.00818e-2 * z + 2.465e-8 * z.powi(2) - 1.25e-13 * z.powi(3) + 2.8e-19 * z.powi(4);
    let k = (gravity(latitude) - 2e-5 * z) / (9.80612 - 2e-5 * z);
    let h0 = 1e-2 * z / (z + 100.0) + 6.2e-6 * z;
    h45 * k - h0
}

/// International gravity formula: g [m/s²] at a latitude in degrees
pub fn gravity(latitude: f64) -> f64 {
    const G1: f64 = 9.7803267714;
    const G2: f64 = 1.931851381639e-3;
    const G3: f64 = 6.6943999013e-3;
    let sin2 = latitude.to_radians().sin().powi(2);
    G1 * (1.0 + G2 * sin2) / (1.0 - G3 * sin2).sqrt()
}

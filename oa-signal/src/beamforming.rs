//! Beamformers for beamforming and matched-field processing
//!
//! All processors take a cross-spectral density matrix `K` (M × M) measured at
//! M sensors and replicas `r̂` (M × N). Replicas are normalized column by column
//! to unit length before evaluation. See Computational Ocean Acoustics,
//! eqs. 10.20, 10.21 and 10.61.

use crate::error::{Result, SignalError};
use crate::linalg::{hermitian_transpose, inverse};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

/// Ambiguity processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Beamformer {
    /// Conventional (Bartlett) processor `wᴴ K w`
    #[default]
    Bartlett,
    /// Bartlett maximum-likelihood residual `tr K - wᴴ K w`
    BartlettMl,
    /// Likelihood form of the residual `(N / (e π φ))^N`
    BartlettLikelihood,
    /// Minimum variance distortionless response `1 / (wᴴ K⁻¹ w)`
    Mvdr,
}

impl FromStr for Beamformer {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cbf" | "bartlett" => Ok(Beamformer::Bartlett),
            "cbf_ml" | "bartlett_ml" => Ok(Beamformer::BartlettMl),
            "cbf_ml2" | "bartlett_likelihood" => Ok(Beamformer::BartlettLikelihood),
            "mvdr" => Ok(Beamformer::Mvdr),
            other => Err(SignalError::InvalidArgument(format!(
                "unknown beamformer `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Beamformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Beamformer::Bartlett => "bartlett",
            Beamformer::BartlettMl => "bartlett_ml",
            Beamformer::BartlettLikelihood => "bartlett_likelihood",
            Beamformer::Mvdr => "mvdr",
        };
        f.write_str(name)
    }
}

/// Outer product `a bᴴ` of column vectors
pub fn covariance(a: ArrayView1<Complex64>, b: ArrayView1<Complex64>) -> Array2<Complex64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j].conj())
}

/// Hermitian part `(A + Aᴴ) / 2`
pub fn enforce_hermitian(a: &Array2<Complex64>) -> Array2<Complex64> {
    (a + &hermitian_transpose(a)) / Complex64::new(2.0, 0.0)
}

/// Normalize every replica column to unit length
pub fn normalize_replicas(r_hat: &Array2<Complex64>) -> Array2<Complex64> {
    let mut w = r_hat.clone();
    for mut column in w.axis_iter_mut(Axis(1)) {
        let norm = column.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
        if norm > 0.0 {
            column.mapv_inplace(|v| v / norm);
        }
    }
    w
}

// Quadratic form wᴴ A w for every column of w
fn quadratic_forms(a: &Array2<Complex64>, w: &Array2<Complex64>) -> Array1<Complex64> {
    let aw = a.dot(w);
    w.axis_iter(Axis(1))
        .zip(aw.axis_iter(Axis(1)))
        .map(|(wc, awc)| wc.iter().zip(awc.iter()).map(|(x, y)| x.conj() * y).sum())
        .collect()
}

fn check_shapes(k: &Array2<Complex64>, r_hat: &Array2<Complex64>) -> Result<()> {
    let (rows, cols) = k.dim();
    if rows != cols {
        return Err(SignalError::DimensionMismatch {
            context: "covariance matrix (square)",
            expected: rows,
            got: cols,
        });
    }
    if r_hat.nrows() != rows {
        return Err(SignalError::DimensionMismatch {
            context: "replica sensors",
            expected: rows,
            got: r_hat.nrows(),
        });
    }
    Ok(())
}

impl Beamformer {
    /// Complex processor output, one value per replica column
    pub fn evaluate_complex(
        &self,
        k: &Array2<Complex64>,
        r_hat: &Array2<Complex64>,
    ) -> Result<Array1<Complex64>> {
        check_shapes(k, r_hat)?;
        let w = normalize_replicas(r_hat);
        match self {
            Beamformer::Bartlett => Ok(quadratic_forms(k, &w)),
            Beamformer::BartlettMl => Ok(bartlett_ml(k, &w)),
            Beamformer::BartlettLikelihood => {
                let n = k.nrows() as i32;
                Ok(bartlett_ml(k, &w).mapv(|phi| {
                    (Complex64::new(n as f64, 0.0) / (E * PI * phi)).powi(n)
                }))
            }
            Beamformer::Mvdr => {
                let k_inv = inverse(k)?;
                Ok(quadratic_forms(&k_inv, &w).mapv(|v| v.inv()))
            }
        }
    }

    /// Magnitude of the processor output
    pub fn evaluate(&self, k: &Array2<Complex64>, r_hat: &Array2<Complex64>) -> Result<Array1<f64>> {
        Ok(self.evaluate_complex(k, r_hat)?.mapv(|v| v.norm()))
    }
}

fn bartlett_ml(k: &Array2<Complex64>, w: &Array2<Complex64>) -> Array1<Complex64> {
    let trace: Complex64 = k.diag().sum();
    quadratic_forms(k, w).mapv(|b| trace - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn plane_wave(n: usize, phase_step: f64) -> Array1<Complex64> {
        (0..n)
            .map(|i| Complex64::from_polar(1.0, phase_step * i as f64))
            .collect()
    }

    #[test]
    fn test_covariance_and_hermitian() {
        let a = array![c(1.0, 1.0), c(0.0, 2.0)];
        let k = covariance(a.view(), a.view());
        assert_relative_eq!(k[[0, 0]].re, 2.0);
        assert_eq!(k[[0, 1]], k[[1, 0]].conj());

        let m = array![[c(1.0, 0.0), c(2.0, 1.0)], [c(0.0, 0.0), c(3.0, 0.0)]];
        let h = enforce_hermitian(&m);
        assert_eq!(h[[0, 1]], c(1.0, 0.5));
        assert_eq!(h[[1, 0]], c(1.0, -0.5));
    }

    #[test]
    fn test_bartlett_peaks_at_true_replica() {
        let d = plane_wave(8, 0.7);
        let k = covariance(d.view(), d.view());
        let mut replicas = Array2::zeros((8, 3));
        replicas.column_mut(0).assign(&plane_wave(8, 0.1));
        replicas.column_mut(1).assign(&(&d * c(3.0, 0.0)));
        replicas.column_mut(2).assign(&plane_wave(8, 1.5));

        let b = Beamformer::Bartlett.evaluate(&k, &replicas).unwrap();
        // |d|² = 8 and the normalized replica projects all of it
        assert_relative_eq!(b[1], 8.0, epsilon = 1e-10);
        assert!(b[0] < b[1] && b[2] < b[1]);

        let ml = Beamformer::BartlettMl.evaluate(&k, &replicas).unwrap();
        assert_relative_eq!(ml[1], 0.0, epsilon = 1e-10);
        assert!(ml[0] > 0.0);
    }

    #[test]
    fn test_likelihood_form() {
        let k = Array2::from_diag(&array![c(1.0, 0.0), c(1.0, 0.0)]);
        let replicas = array![[c(1.0, 0.0)], [c(0.0, 0.0)]];
        // tr K - wᴴKw = 1
        let l = Beamformer::BartlettLikelihood.evaluate(&k, &replicas).unwrap();
        assert_relative_eq!(l[0], (2.0 / (E * PI)).powi(2), epsilon = 1e-12);
    }

    #[test]
    fn test_mvdr_on_diagonal_covariance() {
        let k = Array2::from_diag(&array![c(2.0, 0.0), c(4.0, 0.0)]);
        let replicas = array![[c(1.0, 0.0), c(1.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]];
        let b = Beamformer::Mvdr.evaluate(&k, &replicas).unwrap();
        assert_relative_eq!(b[0], 2.0, epsilon = 1e-12);
        // w = (1, 1)/√2 -> wᴴK⁻¹w = (1/2 + 1/4)/2
        assert_relative_eq!(b[1], 1.0 / 0.375, epsilon = 1e-12);
    }

    #[test]
    fn test_mvdr_singular_covariance() {
        let k = Array2::from_diag(&array![c(1.0, 0.0), c(0.0, 0.0)]);
        let replicas = array![[c(1.0, 0.0)], [c(1.0, 0.0)]];
        let err = Beamformer::Mvdr.evaluate(&k, &replicas).unwrap_err();
        assert!(matches!(err, SignalError::SingularMatrix));
    }

    #[test]
    fn test_shape_mismatch() {
        let k = Array2::<Complex64>::eye(3);
        let replicas = Array2::<Complex64>::zeros((2, 5));
        assert!(Beamformer::Bartlett.evaluate(&k, &replicas).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("cbf".parse::<Beamformer>().unwrap(), Beamformer::Bartlett);
        assert_eq!("MVDR".parse::<Beamformer>().unwrap(), Beamformer::Mvdr);
        assert_eq!(Beamformer::BartlettMl.to_string(), "bartlett_ml");
        assert!("music".parse::<Beamformer>().is_err());
    }
}

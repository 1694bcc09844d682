//! Normal-mode pressure field
//!
//! Far-field modal sum (Computational Ocean Acoustics, eq. 5.13) without the
//! `1 / 4π` scaling applied by the toolbox's own field programs.

use crate::error::{Result, SignalError};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Complex pressure (depth × range) from range-independent modes
///
/// * `phi_src` - mode amplitudes at the source depth, length M
/// * `phi_rec` - mode amplitudes at the receiver depths, shape (Nz, M)
/// * `k` - complex horizontal wavenumbers, length M
/// * `r` - ranges [m], length Nr
/// * `r_offsets` - range offsets [m] per depth, shape (Nz, 1) or (Nz, Nr)
pub fn pressure_field(
    phi_src: &Array1<Complex64>,
    phi_rec: &Array2<Complex64>,
    k: &Array1<Complex64>,
    r: &[f64],
    r_offsets: Option<&Array2<f64>>,
) -> Result<Array2<Complex64>> {
    let (nz, nmodes) = phi_rec.dim();
    if phi_src.len() != nmodes {
        return Err(SignalError::DimensionMismatch {
            context: "source mode amplitudes",
            expected: nmodes,
            got: phi_src.len(),
        });
    }
    if k.len() != nmodes {
        return Err(SignalError::DimensionMismatch {
            context: "wavenumbers",
            expected: nmodes,
            got: k.len(),
        });
    }
    if let Some(offsets) = r_offsets {
        let (rows, cols) = offsets.dim();
        if rows != nz {
            return Err(SignalError::DimensionMismatch {
                context: "range offset depths",
                expected: nz,
                got: rows,
            });
        }
        if cols != 1 && cols != r.len() {
            return Err(SignalError::DimensionMismatch {
                context: "range offset ranges",
                expected: r.len(),
                got: cols,
            });
        }
    }

    let offset = |iz: usize, ir: usize| -> f64 {
        match r_offsets {
            Some(o) if o.ncols() == 1 => o[[iz, 0]],
            Some(o) => o[[iz, ir]],
            None => 0.0,
        }
    };

    let scale = -Complex64::from_polar(1.0, PI / 4.0) / (8.0 * PI).sqrt();
    let i = Complex64::i();

    Ok(Array2::from_shape_fn((nz, r.len()), |(iz, ir)| {
        let range = r[ir] + offset(iz, ir);
        let sum: Complex64 = (0..nmodes)
            .map(|m| {
                let hankel = (i * k[m].conj() * range).exp() / (k[m].re * range).sqrt();
                phi_src[m] * phi_rec[[iz, m]] * hankel
            })
            .sum();
        (scale * sum).conj()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_single_mode_cylindrical_spreading() {
        let phi_src = array![c(1.0, 0.0)];
        let phi_rec = array![[c(1.0, 0.0)]];
        let k = array![c(0.5, 0.0)];
        let p = pressure_field(&phi_src, &phi_rec, &k, &[100.0, 400.0], None).unwrap();
        // |p| = 1 / sqrt(8π k r)
        assert_relative_eq!(p[[0, 0]].norm(), 1.0 / (8.0 * PI * 50.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(p[[0, 0]].norm() / p[[0, 1]].norm(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_convention() {
        let phi_src = array![c(1.0, 0.0)];
        let phi_rec = array![[c(1.0, 0.0)]];
        let k = array![c(PI / 200.0, 0.0)];
        // k r = π/2 at 100 m
        let p = pressure_field(&phi_src, &phi_rec, &k, &[100.0], None).unwrap();
        let expected = (-Complex64::from_polar(1.0, PI / 4.0) * Complex64::i()
            / (8.0 * PI).sqrt()
            / (PI / 2.0).sqrt())
        .conj();
        assert_relative_eq!(p[[0, 0]].re, expected.re, epsilon = 1e-12);
        assert_relative_eq!(p[[0, 0]].im, expected.im, epsilon = 1e-12);
    }

    #[test]
    fn test_attenuation_decays() {
        // Toolbox wavenumbers carry a negative imaginary part for lossy modes
        let phi_src = array![c(1.0, 0.0)];
        let phi_rec = array![[c(1.0, 0.0)]];
        let lossless = pressure_field(&phi_src, &phi_rec, &array![c(0.5, 0.0)], &[1000.0], None)
            .unwrap();
        let lossy = pressure_field(&phi_src, &phi_rec, &array![c(0.5, -1e-3)], &[1000.0], None)
            .unwrap();
        assert_relative_eq!(
            lossy[[0, 0]].norm() / lossless[[0, 0]].norm(),
            (-1.0f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_offsets_match_shifted_ranges() {
        let phi_src = array![c(0.8, 0.1), c(-0.3, 0.0)];
        let phi_rec = array![[c(0.2, 0.0), c(0.5, 0.0)], [c(-0.1, 0.0), c(0.4, 0.2)]];
        let k = array![c(0.41, 1e-5), c(0.39, 2e-5)];
        let r = [1000.0, 2000.0];

        let per_depth = array![[5.0], [-3.0]];
        let p = pressure_field(&phi_src, &phi_rec, &k, &r, Some(&per_depth)).unwrap();

        let shifted = pressure_field(
            &phi_src,
            &phi_rec.slice(ndarray::s![1..2, ..]).to_owned(),
            &k,
            &[997.0, 1997.0],
            None,
        )
        .unwrap();
        assert_relative_eq!(p[[1, 1]].re, shifted[[0, 1]].re, epsilon = 1e-14);
        assert_relative_eq!(p[[1, 1]].im, shifted[[0, 1]].im, epsilon = 1e-14);

        let full = array![[5.0, 5.0], [-3.0, -3.0]];
        let q = pressure_field(&phi_src, &phi_rec, &k, &r, Some(&full)).unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn test_dimension_checks() {
        let phi_rec = Array2::<Complex64>::zeros((3, 2));
        let err = pressure_field(
            &array![c(1.0, 0.0)],
            &phi_rec,
            &array![c(1.0, 0.0), c(1.0, 0.0)],
            &[1.0],
            None,
        )
        .unwrap_err();
        assert!(err.is_dimension_error());

        let bad_offsets = Array2::<f64>::zeros((2, 1));
        assert!(
            pressure_field(
                &array![c(1.0, 0.0), c(1.0, 0.0)],
                &phi_rec,
                &array![c(1.0, 0.0), c(1.0, 0.0)],
                &[1.0],
                Some(&bad_offsets),
            )
            .is_err()
        );
    }
}

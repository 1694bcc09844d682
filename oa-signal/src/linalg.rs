//! Inverting cross-spectral matrices for the adaptive beamformers

use crate::error::{Result, SignalError};
use ndarray::{Array2, Axis, s};
use num_complex::Complex64;

/// Pivots smaller than this fraction of the largest entry count as zero.
/// Rank-deficient covariances (fewer snapshots than sensors) leave pivots
/// at rounding level, well below it.
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Inverse of a square complex matrix
///
/// Gauss-Jordan elimination on `[A | I]` with partial pivoting. A matrix
/// whose pivot falls below [`RELATIVE_TOLERANCE`] of its largest entry is
/// [`SignalError::SingularMatrix`].
pub fn inverse(a: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(SignalError::DimensionMismatch {
            context: "matrix inverse (square)",
            expected: n,
            got: a.ncols(),
        });
    }

    let scale = a.iter().map(|v| v.norm()).fold(0.0, f64::max);
    let tolerance = scale * RELATIVE_TOLERANCE;

    let mut work = Array2::<Complex64>::zeros((n, 2 * n));
    work.slice_mut(s![.., ..n]).assign(a);
    work.slice_mut(s![.., n..]).assign(&Array2::eye(n));

    for col in 0..n {
        let (pivot_row, pivot_norm) = (col..n)
            .map(|r| (r, work[[r, col]].norm()))
            .fold((col, -1.0), |best, cand| if cand.1 > best.1 { cand } else { best });
        if pivot_norm <= tolerance {
            return Err(SignalError::SingularMatrix);
        }
        if pivot_row != col {
            let (mut upper, mut lower) = work.view_mut().split_at(Axis(0), pivot_row);
            ndarray::Zip::from(upper.row_mut(col))
                .and(lower.row_mut(0))
                .for_each(std::mem::swap);
        }

        let pivot = work[[col, col]];
        work.row_mut(col).mapv_inplace(|v| v / pivot);
        let pivot_row = work.row(col).to_owned();
        for r in (0..n).filter(|&r| r != col) {
            let factor = work[[r, col]];
            if factor.norm() > 0.0 {
                work.row_mut(r).scaled_add(-factor, &pivot_row);
            }
        }
    }

    Ok(work.slice(s![.., n..]).to_owned())
}

/// Conjugate transpose
pub fn hermitian_transpose(a: &Array2<Complex64>) -> Array2<Complex64> {
    a.t().mapv(|v| v.conj())
}

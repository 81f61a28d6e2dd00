//! Dense complex linear algebra for the modal method.
//!
//! Matrices are held as `ndarray` arrays; factorizations go through `faer`
//! (LU with partial pivoting, general complex eigendecomposition).

use faer::complex_native::c64;
use faer::linalg::solvers::SpSolver;
use faer::{Mat, MatRef};
use ndarray::Array2;
use num_complex::Complex64;

use crate::solver::SolverError;

pub type CMatrix = Array2<Complex64>;

pub fn to_faer(matrix: &CMatrix) -> Mat<c64> {
    Mat::<c64>::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
        let c = matrix[[i, j]];
        c64::new(c.re, c.im)
    })
}

pub fn from_faer(matrix: MatRef<'_, c64>) -> CMatrix {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(i, j)| {
        let c = matrix.read(i, j);
        Complex64::new(c.re, c.im)
    })
}

pub fn identity(n: usize) -> CMatrix {
    Array2::eye(n)
}

pub fn diagonal(values: &[Complex64]) -> CMatrix {
    let mut m = Array2::zeros((values.len(), values.len()));
    for (i, v) in values.iter().enumerate() {
        m[[i, i]] = *v;
    }
    m
}

pub fn frobenius_norm(matrix: &CMatrix) -> f64 {
    matrix.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt()
}

pub fn is_finite(matrix: &CMatrix) -> bool {
    matrix.iter().all(|c| c.re.is_finite() && c.im.is_finite())
}

/// $A^{-1} B$ via LU decomposition of $A$.
pub fn solve(a: &CMatrix, b: &CMatrix) -> Result<CMatrix, SolverError> {
    if a.nrows() != a.ncols() || a.nrows() != b.nrows() {
        return Err(SolverError::LinAlgError(format!(
            "cannot solve a {}x{} system against {} rows",
            a.nrows(),
            a.ncols(),
            b.nrows()
        )));
    }
    let lu = to_faer(a).partial_piv_lu();
    let solution = from_faer(lu.solve(&to_faer(b)).as_ref());
    if !is_finite(&solution) {
        return Err(SolverError::LinAlgError(format!(
            "singular {}x{} matrix in LU solve",
            a.nrows(),
            a.ncols()
        )));
    }
    Ok(solution)
}

pub fn inverse(a: &CMatrix) -> Result<CMatrix, SolverError> {
    solve(a, &identity(a.nrows()))
}

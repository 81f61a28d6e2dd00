//! Modal eigenproblem of a lamellar layer.
//!
//! Inside a layer whose permittivity varies only along $x$, the field
//! component along the grooves satisfies $\partial_{z'}^2 \mathbf{u} = A\,\mathbf{u}$
//! in normalized depth $z' = k_0 z$, where
//!
//! - TE: $A = K_x^2 - [\![\varepsilon]\!]$
//! - TM: $A = [\![1/\varepsilon]\!]^{-1}\,(K_x [\![\varepsilon]\!]^{-1} K_x - I)$
//!
//! with $[\![\cdot]\!]$ the Toeplitz matrix of Fourier coefficients. The TM
//! form uses the inverse rule for the field component normal to the groove
//! walls, which restores fast convergence for metallic gratings.
//!
//! Each eigenpair $(\mu_m, \mathbf{w}_m)$ gives a mode $\mathbf{w}_m e^{i q_m z'}$
//! with $q_m = \sqrt{-\mu_m}$.

use lamella_geometry::{FourierSeries, LayerSeries};
use ndarray::Array2;
use num_complex::Complex64;

use super::linalg::{self, CMatrix};
use crate::solver::SolverError;
use crate::types::Polarization;

/// Largest accepted relative residual $\|AW - W\Lambda\| / (\|A\|\|W\|)$.
pub const RESIDUAL_LIMIT: f64 = 1e-8;

/// Largest accepted condition estimate of the eigenvector matrix.
pub const CONDITION_LIMIT: f64 = 1e13;

/// Smallest magnitude allowed for a normal propagation constant.
pub const Q_FLOOR: f64 = 1e-10;

/// Eigenvalues and eigenvectors of a square matrix.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Vec<Complex64>,
    /// Eigenvectors as columns.
    pub vectors: CMatrix,
    pub inverse_vectors: CMatrix,
    pub residual: f64,
    pub condition: f64,
}

/// Decompose `matrix` as $A W = W \Lambda$.
///
/// No symmetry is assumed. Fails with [`SolverError::ConvergenceFailure`]
/// when the input or output is non-finite, the residual exceeds
/// [`RESIDUAL_LIMIT`], or the eigenvectors are numerically dependent.
pub fn eigen_decompose(matrix: &CMatrix) -> Result<EigenPairs, SolverError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(SolverError::LinAlgError(format!(
            "eigendecomposition needs a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if !linalg::is_finite(matrix) {
        return Err(SolverError::ConvergenceFailure {
            reason: "input matrix has non-finite entries".into(),
            residual: f64::INFINITY,
        });
    }

    let eig = linalg::to_faer(matrix).complex_eigendecomposition();
    let diag = eig.s().column_vector();
    let values: Vec<Complex64> = (0..n)
        .map(|i| {
            let c = diag.read(i);
            Complex64::new(c.re, c.im)
        })
        .collect();
    let vectors = linalg::from_faer(eig.u());

    if values.iter().any(|v| !(v.re.is_finite() && v.im.is_finite())) || !linalg::is_finite(&vectors) {
        return Err(SolverError::ConvergenceFailure {
            reason: "eigendecomposition produced non-finite values".into(),
            residual: f64::INFINITY,
        });
    }

    let scale = linalg::frobenius_norm(matrix) * linalg::frobenius_norm(&vectors);
    let defect = matrix.dot(&vectors) - vectors.dot(&linalg::diagonal(&values));
    let residual = if scale > 0.0 {
        linalg::frobenius_norm(&defect) / scale
    } else {
        linalg::frobenius_norm(&defect)
    };
    if !(residual <= RESIDUAL_LIMIT) {
        return Err(SolverError::ConvergenceFailure {
            reason: format!("eigenpair residual above {RESIDUAL_LIMIT:e}"),
            residual,
        });
    }

    let inverse_vectors = linalg::inverse(&vectors).map_err(|_| SolverError::ConvergenceFailure {
        reason: "eigenvector matrix is singular".into(),
        residual,
    })?;
    let condition = linalg::frobenius_norm(&vectors) * linalg::frobenius_norm(&inverse_vectors);
    if !(condition <= CONDITION_LIMIT) {
        return Err(SolverError::ConvergenceFailure {
            reason: format!("eigenvector matrix is ill-conditioned (estimate {condition:.2e})"),
            residual,
        });
    }

    Ok(EigenPairs {
        values,
        vectors,
        inverse_vectors,
        residual,
        condition,
    })
}

/// $\sqrt{z}$ on the branch of waves that decay (or propagate) toward $+z$:
/// $\mathrm{Im}\,q \ge 0$, and $\mathrm{Re}\,q > 0$ when $q$ is real.
///
/// A value within [`Q_FLOOR`] of zero becomes $i\,$`Q_FLOOR`.
pub fn decaying_sqrt(z: Complex64) -> Complex64 {
    let mut q = z.sqrt();
    // The principal root has Re >= 0; rounding noise in Im must not flip a propagating mode.
    if q.im < -1e-12 * q.norm() {
        q = -q;
    }
    if q.norm() < Q_FLOOR {
        q = Complex64::new(0.0, Q_FLOOR);
    }
    q
}

/// $T_{mn} = c_{m-n}$ for an $M \times M$ matrix.
pub fn toeplitz(series: &FourierSeries, size: usize) -> CMatrix {
    Array2::from_shape_fn((size, size), |(m, n)| series.get(m as i64 - n as i64))
}

/// Eigenmodes of one layer.
#[derive(Debug, Clone)]
pub struct LayerModes {
    pub thickness_um: f64,
    /// Normalized propagation constants $q_m$.
    pub q: Vec<Complex64>,
    /// Field component along the grooves, one mode per column.
    pub w: CMatrix,
    pub w_inv: CMatrix,
    /// Tangential companion field, $V = Y W Q$.
    pub v: CMatrix,
}

/// Solve the modal eigenproblem of `layer` for tangential wavevectors `kx`.
pub fn layer_modes(
    layer: &LayerSeries,
    kx: &[f64],
    polarization: Polarization,
) -> Result<LayerModes, SolverError> {
    let size = kx.len();
    let kx_diag = linalg::diagonal(&kx.iter().map(|&k| Complex64::new(k, 0.0)).collect::<Vec<_>>());
    let eps = toeplitz(&layer.permittivity, size);

    let (system, admittance) = match polarization {
        Polarization::Te => (kx_diag.dot(&kx_diag) - &eps, None),
        Polarization::Tm => {
            let inv_eps = toeplitz(&layer.inverse_permittivity, size);
            let coupling = kx_diag.dot(&linalg::solve(&eps, &kx_diag)?) - linalg::identity(size);
            (linalg::solve(&inv_eps, &coupling)?, Some(inv_eps))
        }
    };

    let pairs = eigen_decompose(&system)?;
    log::trace!(
        "layer {:.4} um: {} modes, residual {:.2e}, condition {:.2e}",
        layer.thickness_um,
        size,
        pairs.residual,
        pairs.condition
    );

    let q: Vec<Complex64> = pairs.values.iter().map(|&mu| decaying_sqrt(-mu)).collect();
    let wq = pairs.vectors.dot(&linalg::diagonal(&q));
    let v = match admittance {
        Some(inv_eps) => inv_eps.dot(&wq),
        None => wq,
    };

    Ok(LayerModes {
        thickness_um: layer.thickness_um,
        q,
        w: pairs.vectors,
        w_inv: pairs.inverse_vectors,
        v,
    })
}

//! Boundary matching by scattering-matrix recursion.
//!
//! The structure is the incidence half-space, the staircase layers (top
//! first) and the substrate half-space. Every layer is embedded between two
//! zero-thickness gap media and described by a scattering matrix; the global
//! matrix is the Redheffer star product of the chain. Only decaying
//! exponentials $e^{i q k_0 d}$ with $\mathrm{Im}\,q \ge 0$ appear, so thick or
//! strongly absorbing stacks stay well-conditioned.
//!
//! The gap medium is arbitrary as long as its mode matrices are invertible;
//! $W_0 = I$, $V_0 = \mathrm{diag}\sqrt{1 + k_{x,n}^2}$ is never singular.

use num_complex::Complex64;

use super::eigen::{decaying_sqrt, LayerModes};
use super::linalg::{self, CMatrix};
use crate::solver::SolverError;
use crate::types::{OrderStatus, Polarization};

/// Relative distance from the Rayleigh boundary below which an order counts
/// as evanescent.
pub const RAYLEIGH_TOLERANCE: f64 = 1e-9;

/// $\mathrm{Im}\,\varepsilon$ above which a medium counts as absorbing.
pub const ABSORPTION_THRESHOLD: f64 = 1e-12;

/// Normalized tangential wavevectors $k_{x,n} = n_0 \sin\theta + n\lambda/\Lambda$
/// for $n = -N..=N$.
pub fn tangential_wavevectors(
    ambient_index: f64,
    incidence_deg: f64,
    wavelength_um: f64,
    period_um: f64,
    truncation: usize,
) -> Vec<f64> {
    let base = ambient_index * incidence_deg.to_radians().sin();
    let n = truncation as i64;
    (-n..=n)
        .map(|order| base + order as f64 * wavelength_um / period_um)
        .collect()
}

/// Whether order `kx` carries power in a half-space of permittivity `eps`.
///
/// Orders on or within [`RAYLEIGH_TOLERANCE`] of the Rayleigh boundary are
/// evanescent. Nothing propagates into an absorbing or negative-permittivity
/// half-space.
pub fn classify(kx: f64, eps: Complex64) -> OrderStatus {
    if eps.im > ABSORPTION_THRESHOLD || eps.re <= 0.0 {
        return OrderStatus::Evanescent;
    }
    let index = eps.re.sqrt();
    if index - kx.abs() > RAYLEIGH_TOLERANCE * index {
        OrderStatus::Propagating
    } else {
        OrderStatus::Evanescent
    }
}

/// A homogeneous half-space bounding the grating.
#[derive(Debug, Clone)]
pub struct HalfSpace {
    pub permittivity: Complex64,
    /// Normalized normal wavevectors $q_n = \sqrt{\varepsilon - k_{x,n}^2}$.
    pub q: Vec<Complex64>,
    pub status: Vec<OrderStatus>,
    /// 1 for TE, $\varepsilon$ for TM.
    admittance: Complex64,
}

impl HalfSpace {
    pub fn new(permittivity: Complex64, kx: &[f64], polarization: Polarization) -> Self {
        let q = kx
            .iter()
            .map(|&k| decaying_sqrt(permittivity - k * k))
            .collect();
        let status = kx.iter().map(|&k| classify(k, permittivity)).collect();
        let admittance = match polarization {
            Polarization::Te => Complex64::new(1.0, 0.0),
            Polarization::Tm => permittivity,
        };
        Self {
            permittivity,
            q,
            status,
            admittance,
        }
    }

    /// Normal power flux carried per unit $|amplitude|^2$ in order index `i`.
    pub fn flux_weight(&self, i: usize) -> f64 {
        (self.q[i] / self.admittance).re
    }

    fn companion(&self) -> Vec<Complex64> {
        self.q.iter().map(|q| q / self.admittance).collect()
    }
}

/// The zero-thickness gap medium.
struct Gap {
    v: Vec<Complex64>,
}

impl Gap {
    fn new(kx: &[f64]) -> Self {
        Self {
            v: kx
                .iter()
                .map(|&k| Complex64::new((1.0 + k * k).sqrt(), 0.0))
                .collect(),
        }
    }

    /// $V_0^{-1} V$.
    fn v_inv_dot(&self, v: &CMatrix) -> CMatrix {
        let mut out = v.clone();
        for (mut row, v0) in out.rows_mut().into_iter().zip(&self.v) {
            row.mapv_inplace(|x| x / v0);
        }
        out
    }

    fn v_matrix(&self) -> CMatrix {
        linalg::diagonal(&self.v)
    }
}

/// A four-block scattering matrix relating outgoing to incoming mode
/// amplitudes on the two sides of a section.
#[derive(Debug, Clone)]
pub struct ScatteringMatrix {
    pub s11: CMatrix,
    pub s12: CMatrix,
    pub s21: CMatrix,
    pub s22: CMatrix,
}

impl ScatteringMatrix {
    /// Interface between the incidence half-space and the gap.
    fn reflection_side(medium: &HalfSpace, gap: &Gap) -> Result<Self, SolverError> {
        let n = medium.q.len();
        let coupled = gap.v_inv_dot(&linalg::diagonal(&medium.companion()));
        let a = linalg::identity(n) + &coupled;
        let b = linalg::identity(n) - &coupled;
        let a_inv = linalg::inverse(&a)?;
        let b_a_inv = b.dot(&a_inv);
        Ok(Self {
            s11: -a_inv.dot(&b),
            s12: &a_inv * Complex64::new(2.0, 0.0),
            s21: (&a - &b_a_inv.dot(&b)) * Complex64::new(0.5, 0.0),
            s22: b_a_inv,
        })
    }

    /// Interface between the gap and the substrate half-space.
    fn transmission_side(medium: &HalfSpace, gap: &Gap) -> Result<Self, SolverError> {
        let n = medium.q.len();
        let coupled = gap.v_inv_dot(&linalg::diagonal(&medium.companion()));
        let a = linalg::identity(n) + &coupled;
        let b = linalg::identity(n) - &coupled;
        let a_inv = linalg::inverse(&a)?;
        let b_a_inv = b.dot(&a_inv);
        Ok(Self {
            s11: b_a_inv.clone(),
            s12: (&a - &b_a_inv.dot(&b)) * Complex64::new(0.5, 0.0),
            s21: &a_inv * Complex64::new(2.0, 0.0),
            s22: -a_inv.dot(&b),
        })
    }

    /// A layer of thickness `modes.thickness_um` embedded in gap media.
    fn layer(modes: &LayerModes, gap: &Gap, k0: f64) -> Result<Self, SolverError> {
        let v_inv = linalg::inverse(&modes.v)?;
        // W0 = I, so W^-1 W0 = W^-1.
        let w_term = &modes.w_inv;
        let v_term = v_inv.dot(&gap.v_matrix());
        let a = w_term + &v_term;
        let b = w_term - &v_term;
        let x = linalg::diagonal(
            &modes
                .q
                .iter()
                .map(|q| (Complex64::i() * q * k0 * modes.thickness_um).exp())
                .collect::<Vec<_>>(),
        );

        let a_inv = linalg::inverse(&a)?;
        let xb = x.dot(&b);
        let xba_inv_x = xb.dot(&a_inv).dot(&x);
        let d = &a - &xba_inv_x.dot(&b);
        let s11 = linalg::solve(&d, &(xba_inv_x.dot(&a) - &b))?;
        let s12 = linalg::solve(&d, &x.dot(&(&a - &b.dot(&a_inv).dot(&b))))?;
        Ok(Self {
            s11: s11.clone(),
            s12: s12.clone(),
            s21: s12,
            s22: s11,
        })
    }

    /// Redheffer star product `self ⊗ other`, with `self` above `other`.
    pub fn star(&self, other: &Self) -> Result<Self, SolverError> {
        let n = self.s11.nrows();
        let i = linalg::identity(n);
        let d = self
            .s12
            .dot(&linalg::inverse(&(&i - &other.s11.dot(&self.s22)))?);
        let f = other
            .s21
            .dot(&linalg::inverse(&(&i - &self.s22.dot(&other.s11)))?);
        Ok(Self {
            s11: &self.s11 + &d.dot(&other.s11).dot(&self.s21),
            s12: d.dot(&other.s12),
            s21: f.dot(&self.s21),
            s22: &other.s22 + &f.dot(&self.s22).dot(&other.s12),
        })
    }
}

/// Mode amplitudes scattered by a unit zero-order incident wave.
#[derive(Debug, Clone)]
pub struct Amplitudes {
    /// $r_n$, orders $-N..=N$.
    pub reflection: Vec<Complex64>,
    /// $t_n$, orders $-N..=N$.
    pub transmission: Vec<Complex64>,
}

/// Chain the incidence half-space, `layers` (top first) and the substrate,
/// and illuminate with the zero order.
pub fn match_boundaries(
    incidence: &HalfSpace,
    layers: &[LayerModes],
    substrate: &HalfSpace,
    kx: &[f64],
    k0: f64,
) -> Result<Amplitudes, SolverError> {
    let gap = Gap::new(kx);
    let mut global = ScatteringMatrix::reflection_side(incidence, &gap)?;
    for modes in layers {
        global = global.star(&ScatteringMatrix::layer(modes, &gap, k0)?)?;
    }
    global = global.star(&ScatteringMatrix::transmission_side(substrate, &gap)?)?;

    // The incidence half-space has W = I, so the zero-order field is the unit vector at the centre.
    let centre = kx.len() / 2;
    let reflection = global.s11.column(centre).to_vec();
    let transmission = global.s21.column(centre).to_vec();

    if reflection
        .iter()
        .chain(&transmission)
        .any(|c| !(c.re.is_finite() && c.im.is_finite()))
    {
        return Err(SolverError::LinAlgError(
            "scattering matrix produced non-finite amplitudes".into(),
        ));
    }
    Ok(Amplitudes {
        reflection,
        transmission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_tangential_wavevectors_are_grating_equation() {
        let kx = tangential_wavevectors(1.0, 30.0, 0.5, 1.0, 2);
        let expected = [-0.5, 0.0, 0.5, 1.0, 1.5];
        for (k, e) in kx.iter().zip(expected) {
            assert_abs_diff_eq!(*k, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rayleigh_boundary_is_evanescent() {
        let air = c(1.0, 0.0);
        assert_eq!(classify(1.0, air), OrderStatus::Evanescent);
        assert_eq!(classify(-1.0 + 1e-12, air), OrderStatus::Evanescent);
        assert_eq!(classify(1.0 - 1e-6, air), OrderStatus::Propagating);
        assert_eq!(classify(0.0, air), OrderStatus::Propagating);
    }

    #[test]
    fn test_absorbing_or_metallic_substrate_has_no_propagating_orders() {
        assert_eq!(classify(0.0, c(0.86, 0.09)), OrderStatus::Evanescent);
        assert_eq!(classify(0.0, c(-10.0, 0.0)), OrderStatus::Evanescent);
    }

    #[test]
    fn test_flat_interface_reproduces_fresnel_te() {
        let n = 1.5;
        let kx = tangential_wavevectors(1.0, 0.0, 0.5, 1.0, 1);
        let incidence = HalfSpace::new(c(1.0, 0.0), &kx, Polarization::Te);
        let substrate = HalfSpace::new(c(n * n, 0.0), &kx, Polarization::Te);
        let amps = match_boundaries(&incidence, &[], &substrate, &kx, 1.0).unwrap();
        assert_abs_diff_eq!(amps.reflection[1].re, (1.0 - n) / (1.0 + n), epsilon = 1e-12);
        assert_abs_diff_eq!(amps.transmission[1].re, 2.0 / (1.0 + n), epsilon = 1e-12);
        assert!(amps.reflection[0].norm() < 1e-14);
    }

    #[test]
    fn test_star_with_identity_section_is_neutral() {
        let n = 3;
        let zero = CMatrix::zeros((n, n));
        let transparent = ScatteringMatrix {
            s11: zero.clone(),
            s12: linalg::identity(n),
            s21: linalg::identity(n),
            s22: zero,
        };
        let kx = [-0.3, 0.0, 0.3];
        let gap = Gap::new(&kx);
        let side = ScatteringMatrix::reflection_side(
            &HalfSpace::new(c(2.0, 0.1), &kx, Polarization::Tm),
            &gap,
        )
        .unwrap();
        let combined = side.star(&transparent).unwrap();
        assert!(linalg::frobenius_norm(&(&combined.s11 - &side.s11)) < 1e-14);
        assert!(linalg::frobenius_norm(&(&combined.s21 - &side.s21)) < 1e-14);
    }
}

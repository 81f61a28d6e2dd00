//! Rigorous coupled-wave analysis (Fourier modal method) for 1D gratings.
//!
//! The grooved region is staircased into lamellar layers. In each layer the
//! field is expanded in $M = 2N + 1$ Rayleigh harmonics and the modal
//! eigenproblem is solved numerically ([`eigen`]). Layers are chained to the
//! incidence and substrate half-spaces by scattering matrices ([`boundary`])
//! and the scattered amplitudes are converted into efficiencies ([`efficiency`]).
//!
//! # Pipeline
//!
//! 1. Validate incidence and wavelength.
//! 2. Look up $\tilde n = n + ik$ of the grating material and form $\varepsilon = \tilde n^2$.
//! 3. Slice the profile and expand $\varepsilon(x)$, $1/\varepsilon(x)$ per layer.
//! 4. Solve each layer's eigenproblem.
//! 5. Star-multiply the scattering matrices and illuminate with the zero order.
//! 6. Extract efficiencies and check the energy balance.

pub mod boundary;
pub mod efficiency;
pub mod eigen;
pub mod linalg;

use std::f64::consts::PI;
use std::sync::Arc;

use lamella_geometry::GratingProfile;
use lamella_materials::MaterialOptics;
use num_complex::Complex64;

use super::{GratingSolver, SolverError};
use crate::types::{
    DebugTrace, Diagnostics, EfficiencyResult, EvaluationStatus, LayerTrace, MathOptions,
    OrderEfficiency, OrderStatus,
};
use boundary::{HalfSpace, ABSORPTION_THRESHOLD};

/// The RCWA solver: a material lookup plus the index of the incidence medium.
///
/// Holds no per-evaluation state and may be shared across threads.
#[derive(Clone)]
pub struct RcwaSolver {
    materials: Arc<dyn MaterialOptics>,
    /// Real refractive index of the incidence medium (vacuum by default).
    ambient_index: f64,
}

struct Solution {
    orders: Vec<OrderEfficiency>,
    diagnostics: Diagnostics,
    trace: Option<DebugTrace>,
}

impl RcwaSolver {
    pub fn new(materials: Arc<dyn MaterialOptics>) -> Self {
        Self {
            materials,
            ambient_index: 1.0,
        }
    }

    /// Use a non-vacuum incidence medium of real index `index`.
    pub fn with_ambient_index(mut self, index: f64) -> Self {
        self.ambient_index = index;
        self
    }

    pub fn ambient_index(&self) -> f64 {
        self.ambient_index
    }

    pub fn materials(&self) -> &dyn MaterialOptics {
        self.materials.as_ref()
    }

    fn validate(&self, incidence_deg: f64, wavelength_um: f64) -> Result<(), SolverError> {
        if !(wavelength_um.is_finite() && wavelength_um > 0.0) {
            return Err(SolverError::InvalidInput(format!(
                "wavelength must be finite and positive, got {wavelength_um} um"
            )));
        }
        if !(incidence_deg.is_finite() && incidence_deg.abs() < 90.0) {
            return Err(SolverError::InvalidInput(format!(
                "incidence angle must be finite and strictly between -90 and 90 degrees, got {incidence_deg}"
            )));
        }
        if !(self.ambient_index.is_finite() && self.ambient_index > 0.0) {
            return Err(SolverError::InvalidInput(format!(
                "ambient refractive index must be finite and positive, got {}",
                self.ambient_index
            )));
        }
        Ok(())
    }

    fn solve(
        &self,
        profile: &GratingProfile,
        incidence_deg: f64,
        wavelength_um: f64,
        options: &MathOptions,
        debug: bool,
    ) -> Result<Solution, SolverError> {
        self.validate(incidence_deg, wavelength_um)?;
        let truncation = options.truncation();
        let polarization = options.polarization();

        let index = self.materials.lookup(profile.material(), wavelength_um)?;
        let eps_material = index * index;
        let eps_ambient = Complex64::new(self.ambient_index * self.ambient_index, 0.0);

        let kx = boundary::tangential_wavevectors(
            self.ambient_index,
            incidence_deg,
            wavelength_um,
            profile.period_um(),
            truncation,
        );
        let incidence = HalfSpace::new(eps_ambient, &kx, polarization);
        if incidence.status[truncation] != OrderStatus::Propagating {
            return Err(SolverError::InvalidInput(format!(
                "incident order is not propagating at {incidence_deg} degrees"
            )));
        }
        let substrate = HalfSpace::new(eps_material, &kx, polarization);

        let layers = profile.fourier_coefficients(truncation, options.slices(), eps_material, eps_ambient)?;
        let modes = layers
            .iter()
            .map(|layer| eigen::layer_modes(layer, &kx, polarization))
            .collect::<Result<Vec<_>, _>>()?;

        let k0 = 2.0 * PI / wavelength_um;
        let amplitudes = boundary::match_boundaries(&incidence, &modes, &substrate, &kx, k0)?;
        let orders = efficiency::order_efficiencies(truncation, &incidence, &substrate, &amplitudes, k0)?;

        let lossless = eps_material.im.abs() <= ABSORPTION_THRESHOLD;
        let diagnostics = efficiency::check_conservation(&orders, lossless, options.conservation_tolerance());

        let trace = debug.then(|| DebugTrace {
            material_permittivity: eps_material,
            ambient_permittivity: eps_ambient,
            kx: kx.clone(),
            layers: layers
                .iter()
                .zip(&modes)
                .map(|(layer, mode)| LayerTrace {
                    thickness_um: layer.thickness_um,
                    permittivity: layer.permittivity.as_slice().to_vec(),
                    inverse_permittivity: layer.inverse_permittivity.as_slice().to_vec(),
                    mode_constants: mode.q.clone(),
                })
                .collect(),
        });

        Ok(Solution {
            orders,
            diagnostics,
            trace,
        })
    }
}

impl std::fmt::Debug for RcwaSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcwaSolver")
            .field("ambient_index", &self.ambient_index)
            .field("materials", &self.materials.material_names())
            .finish()
    }
}

impl GratingSolver for RcwaSolver {
    fn evaluate(
        &self,
        profile: &GratingProfile,
        incidence_deg: f64,
        wavelength_um: f64,
        options: &MathOptions,
        debug: bool,
    ) -> EfficiencyResult {
        match self.solve(profile, incidence_deg, wavelength_um, options, debug) {
            Ok(solution) => {
                let status = if solution.diagnostics.message.is_some() {
                    log::warn!(
                        "{wavelength_um:.6} um, {incidence_deg} deg: {}",
                        solution.diagnostics.message.as_deref().unwrap_or_default()
                    );
                    EvaluationStatus::PartialFailure
                } else {
                    EvaluationStatus::Success
                };
                if let Some(trace) = &solution.trace {
                    log::debug!(
                        "eps = {:.6}, kx = {:?}, {} layers",
                        trace.material_permittivity,
                        trace.kx,
                        trace.layers.len()
                    );
                    for (i, layer) in trace.layers.iter().enumerate() {
                        log::debug!(
                            "layer {i}: d = {:.5} um, eps_0 = {:.6}, q = {:?}",
                            layer.thickness_um,
                            layer.permittivity[layer.permittivity.len() / 2],
                            layer.mode_constants
                        );
                    }
                }
                EfficiencyResult {
                    status,
                    wavelength_um,
                    incidence_deg,
                    polarization: options.polarization(),
                    truncation: options.truncation(),
                    orders: solution.orders,
                    diagnostics: solution.diagnostics,
                    debug: solution.trace,
                }
            }
            Err(e) => {
                log::warn!("{wavelength_um:.6} um, {incidence_deg} deg: {e}");
                EfficiencyResult::failure(wavelength_um, incidence_deg, options, &e)
            }
        }
    }

    fn method_name(&self) -> &str {
        "RCWA (Fourier modal method, S-matrix)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lamella_materials::{ConstantIndex, MaterialDatabase};

    fn solver() -> RcwaSolver {
        let db = MaterialDatabase::builtin()
            .with("glass", ConstantIndex::new("glass", 1.5, 0.0))
            .with("mirror", ConstantIndex::new("mirror", 0.0, 10f64.sqrt()))
            .with("gain", ConstantIndex::new("gain", 1.5, -0.2));
        RcwaSolver::new(Arc::new(db))
    }

    #[test]
    fn test_invalid_incidence_is_failure() {
        let g = GratingProfile::sinusoidal(1.0, 0.1, "glass").unwrap();
        let opts = MathOptions::new(3).unwrap();
        for theta in [90.0, -95.0, f64::NAN] {
            let result = solver().evaluate(&g, theta, 0.5, &opts, false);
            assert_eq!(result.status, EvaluationStatus::Failure);
            assert!(result.orders.is_empty());
        }
    }

    #[test]
    fn test_unknown_material_is_failure() {
        let g = GratingProfile::sinusoidal(1.0, 0.1, "Unobtainium").unwrap();
        let result = solver().evaluate(&g, 10.0, 0.5, &MathOptions::new(3).unwrap(), false);
        assert_eq!(result.status, EvaluationStatus::Failure);
        assert!(result.message().unwrap().contains("Unobtainium"));
    }

    #[test]
    fn test_flat_mirror_reflects_everything_into_zero_order() {
        let g = GratingProfile::rectangular(1.0, 0.0, 0.5, "mirror").unwrap();
        let result = solver().evaluate(&g, 20.0, 0.4, &MathOptions::new(4).unwrap(), false);
        assert_eq!(result.status, EvaluationStatus::Success);
        assert_abs_diff_eq!(result.efficiency(0).unwrap(), 1.0, epsilon = 1e-12);
        for o in result.orders.iter().filter(|o| o.order != 0) {
            assert!(o.efficiency.abs() < 1e-24, "order {} = {}", o.order, o.efficiency);
        }
    }

    #[test]
    fn test_debug_trace_does_not_change_results() {
        let g = GratingProfile::sinusoidal(1.0, 0.2, "glass").unwrap();
        let opts = MathOptions::new(3).unwrap().with_slices(5).unwrap();
        let plain = solver().evaluate(&g, 15.0, 0.6, &opts, false);
        let traced = solver().evaluate(&g, 15.0, 0.6, &opts, true);
        assert!(plain.debug.is_none());
        let trace = traced.debug.as_ref().unwrap();
        assert_eq!(trace.layers.len(), 5);
        assert_eq!(trace.layers[0].permittivity.len(), opts.coefficient_count());
        assert_eq!(plain.orders, traced.orders);
    }

    #[test]
    fn test_kz_is_normal_wavevector_in_incidence_medium() {
        let g = GratingProfile::sinusoidal(1.0, 0.05, "glass").unwrap();
        let result = solver().evaluate(&g, 30.0, 0.5, &MathOptions::new(2).unwrap(), false);
        let k0 = 2.0 * PI / 0.5;
        let zero = result.orders.iter().find(|o| o.order == 0).unwrap();
        assert_abs_diff_eq!(zero.kz.re, k0 * 30f64.to_radians().cos(), epsilon = 1e-9);
        let evanescent = result.orders.iter().find(|o| o.order == 2).unwrap();
        assert_eq!(evanescent.status, OrderStatus::Evanescent);
        assert!(evanescent.kz.im > 0.0);
    }

    #[test]
    fn test_gain_medium_breaks_energy_balance() {
        let g = GratingProfile::sinusoidal(1.0, 0.1, "gain").unwrap();
        let opts = MathOptions::new(3).unwrap();
        let result = solver().evaluate(&g, 20.0, 0.5, &opts, false);
        assert_eq!(result.status, EvaluationStatus::PartialFailure);
        assert_eq!(result.orders.len(), opts.harmonics());

        let diagnostics = &result.diagnostics;
        assert!(!diagnostics.lossless);
        assert!(diagnostics.energy_sum > 1.0 + diagnostics.tolerance);
        assert_abs_diff_eq!(diagnostics.residual, diagnostics.energy_sum - 1.0, epsilon = 1e-12);
        assert!(result.message().unwrap().contains("Energy balance violated"));
    }
}

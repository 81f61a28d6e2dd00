//! Grating solver abstraction and implementations.
//!
//! The [`GratingSolver`] trait is the single entry point used by the sweep
//! driver and the CLI. The rigorous coupled-wave / Fourier-modal method
//! ([`rcwa::RcwaSolver`]) is the implementation.

pub mod rcwa;

use lamella_geometry::{GeometryError, GratingProfile};
use lamella_materials::MaterialError;
use thiserror::Error;

use crate::types::{EfficiencyResult, MathOptions};

/// Errors that can occur during a grating solve.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Modal eigensolver failed: {reason} (residual: {residual:.2e})")]
    ConvergenceFailure { reason: String, residual: f64 },

    #[error(
        "Energy balance violated: R + T = {energy_sum:.9} (residual {residual:.2e} exceeds tolerance {tolerance:.2e})"
    )]
    ConservationViolation {
        energy_sum: f64,
        residual: f64,
        tolerance: f64,
    },

    #[error("Material lookup failed: {0}")]
    MaterialLookup(#[from] MaterialError),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Linear algebra error: {0}")]
    LinAlgError(String),
}

/// The trait every diffraction-efficiency method implements.
///
/// Evaluations never fail outright: errors are folded into the returned
/// [`EfficiencyResult`]'s status so that one bad step cannot abort a sweep.
pub trait GratingSolver: Send + Sync {
    /// Per-order efficiencies of `profile` at one incidence angle (degrees
    /// from the normal) and one vacuum wavelength (µm).
    ///
    /// With `debug` set, intermediate quantities are attached to the result
    /// and logged; the efficiencies themselves are unchanged.
    fn evaluate(
        &self,
        profile: &GratingProfile,
        incidence_deg: f64,
        wavelength_um: f64,
        options: &MathOptions,
        debug: bool,
    ) -> EfficiencyResult;

    /// Human-readable name of the solver method.
    fn method_name(&self) -> &str;
}

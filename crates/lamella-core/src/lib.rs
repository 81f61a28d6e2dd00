//! # Lamella Core
//!
//! The numerical backbone of Lamella: diffraction efficiencies of periodic
//! surface-relief gratings by rigorous coupled-wave analysis.
//!
//! ## Architecture
//!
//! Solvers implement the [`solver::GratingSolver`] trait, which maps one
//! profile, incidence angle and wavelength to per-order efficiencies. The
//! implementation is the Fourier modal method with scattering-matrix
//! boundary matching ([`solver::rcwa::RcwaSolver`]). Evaluations never panic
//! or abort on bad input; failures are reported through
//! [`types::EvaluationStatus`].
//!
//! ## Modules
//!
//! - [`types`]: numerical options and result containers.
//! - [`solver`]: solver trait, error type and the RCWA implementation.
//! - [`sweep`]: wavelength/angle sweeps on a compute backend.

pub mod solver;
pub mod sweep;
pub mod types;

pub use solver::rcwa::RcwaSolver;
pub use solver::{GratingSolver, SolverError};
pub use types::{EfficiencyResult, EvaluationStatus, MathOptions, OrderStatus, Polarization};

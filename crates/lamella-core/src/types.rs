//! Core types shared across the Lamella solver.
//!
//! This module defines the numerical options of a solve and the result
//! containers returned for every evaluation, whether it succeeded or not.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::solver::SolverError;

/// Default number of staircase slices for non-lamellar profiles.
pub const DEFAULT_SLICES: usize = 20;

/// Field component parallel to the grooves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarization {
    /// Electric field along the grooves ($E_y$).
    #[default]
    #[serde(rename = "TE", alias = "te")]
    Te,
    /// Magnetic field along the grooves ($H_y$).
    #[serde(rename = "TM", alias = "tm")]
    Tm,
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::Te => f.write_str("TE"),
            Polarization::Tm => f.write_str("TM"),
        }
    }
}

/// Numerical options of a solve.
///
/// Orders $-N..=N$ are retained, giving $M = 2N + 1$ harmonics and
/// $4N + 1$ permittivity Fourier coefficients per layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MathOptions {
    truncation: usize,
    polarization: Polarization,
    slices: usize,
}

impl FromStr for Polarization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TE" | "te" => Ok(Polarization::Te),
            "TM" | "tm" => Ok(Polarization::Tm),
            other => Err(format!("unknown polarization '{other}' (expected TE or TM)")),
        }
    }
}

impl MathOptions {
    pub fn new(truncation: usize) -> Result<Self, SolverError> {
        if truncation == 0 {
            return Err(SolverError::InvalidInput(
                "truncation order N must be at least 1".into(),
            ));
        }
        Ok(Self {
            truncation,
            polarization: Polarization::Te,
            slices: DEFAULT_SLICES,
        })
    }

    pub fn with_polarization(mut self, polarization: Polarization) -> Self {
        self.polarization = polarization;
        self
    }

    pub fn with_slices(mut self, slices: usize) -> Result<Self, SolverError> {
        if slices == 0 {
            return Err(SolverError::InvalidInput(
                "slice count must be at least 1".into(),
            ));
        }
        self.slices = slices;
        Ok(self)
    }

    /// Highest retained order $N$.
    pub fn truncation(&self) -> usize {
        self.truncation
    }

    /// $M = 2N + 1$.
    pub fn harmonics(&self) -> usize {
        2 * self.truncation + 1
    }

    /// $4N + 1$.
    pub fn coefficient_count(&self) -> usize {
        4 * self.truncation + 1
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Retained diffraction orders, lowest first.
    pub fn orders(&self) -> RangeInclusive<i64> {
        let n = self.truncation as i64;
        -n..=n
    }

    /// Allowed deviation of the energy balance. Tightens as more harmonics
    /// are retained.
    pub fn conservation_tolerance(&self) -> f64 {
        (1e-3 / self.harmonics() as f64).max(1e-10)
    }
}

/// Whether an order carries power away from the grating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Propagating,
    Evanescent,
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationStatus {
    Success,
    /// Efficiencies were computed but failed the energy balance check.
    PartialFailure,
    Failure,
}

impl EvaluationStatus {
    /// True when efficiencies are available.
    pub fn has_efficiencies(&self) -> bool {
        !matches!(self, EvaluationStatus::Failure)
    }
}

/// Reflected and transmitted response in one diffraction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEfficiency {
    pub order: i64,
    /// Classification in the incidence medium.
    pub status: OrderStatus,
    /// Normal propagation constant $\beta_{n,z}$ in the incidence medium (rad/µm).
    pub kz: Complex64,
    /// Complex reflection amplitude $r_n$.
    pub reflection: Complex64,
    /// Reflected efficiency $\eta_n$, exactly 0 for evanescent orders.
    pub efficiency: f64,
    /// Classification in the substrate.
    pub transmission_status: OrderStatus,
    pub transmission: Complex64,
    pub transmission_efficiency: f64,
}

/// Energy balance and error reporting of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total_reflection: f64,
    pub total_transmission: f64,
    /// $\sum R + \sum T$.
    pub energy_sum: f64,
    /// Amount by which the energy balance is violated (0 if it holds).
    pub residual: f64,
    pub tolerance: f64,
    /// All media are non-absorbing, so the balance must be exactly 1.
    pub lossless: bool,
    pub message: Option<String>,
}

impl Diagnostics {
    fn empty(tolerance: f64, message: String) -> Self {
        Self {
            total_reflection: 0.0,
            total_transmission: 0.0,
            energy_sum: 0.0,
            residual: 0.0,
            tolerance,
            lossless: false,
            message: Some(message),
        }
    }
}

/// Intermediate data of one staircase layer, kept for debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTrace {
    pub thickness_um: f64,
    /// $\varepsilon_k$, $k = -2N..=2N$.
    pub permittivity: Vec<Complex64>,
    /// $(1/\varepsilon)_k$, $k = -2N..=2N$.
    pub inverse_permittivity: Vec<Complex64>,
    /// Normalized modal propagation constants $q_m$.
    pub mode_constants: Vec<Complex64>,
}

/// Optional trace of the intermediate quantities of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub material_permittivity: Complex64,
    pub ambient_permittivity: Complex64,
    /// Normalized tangential wavevectors $k_{x,n}/k_0$.
    pub kx: Vec<f64>,
    pub layers: Vec<LayerTrace>,
}

/// Per-order efficiencies for one (profile, angle, wavelength) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyResult {
    pub status: EvaluationStatus,
    pub wavelength_um: f64,
    pub incidence_deg: f64,
    pub polarization: Polarization,
    pub truncation: usize,
    /// Orders $-N..=N$, empty on [`EvaluationStatus::Failure`].
    pub orders: Vec<OrderEfficiency>,
    pub diagnostics: Diagnostics,
    pub debug: Option<DebugTrace>,
}

impl EfficiencyResult {
    /// A failed evaluation carrying the error message.
    pub fn failure(
        wavelength_um: f64,
        incidence_deg: f64,
        options: &MathOptions,
        error: &SolverError,
    ) -> Self {
        Self {
            status: EvaluationStatus::Failure,
            wavelength_um,
            incidence_deg,
            polarization: options.polarization(),
            truncation: options.truncation(),
            orders: Vec::new(),
            diagnostics: Diagnostics::empty(options.conservation_tolerance(), error.to_string()),
            debug: None,
        }
    }

    /// Reflected efficiency of `order`, if it was computed.
    pub fn efficiency(&self, order: i64) -> Option<f64> {
        self.orders
            .iter()
            .find(|o| o.order == order)
            .map(|o| o.efficiency)
    }

    /// Reflected efficiencies in order $-N..=N$.
    pub fn reflection_efficiencies(&self) -> Vec<f64> {
        self.orders.iter().map(|o| o.efficiency).collect()
    }

    pub fn message(&self) -> Option<&str> {
        self.diagnostics.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_derived_sizes() {
        let opts = MathOptions::new(5).unwrap();
        assert_eq!(opts.harmonics(), 11);
        assert_eq!(opts.coefficient_count(), 21);
        assert_eq!(opts.orders().count(), 11);
        assert_eq!(opts.polarization(), Polarization::Te);
        assert_eq!(opts.slices(), DEFAULT_SLICES);
    }

    #[test]
    fn test_tolerance_shrinks_with_truncation() {
        let tols: Vec<f64> = [5, 15, 45]
            .iter()
            .map(|&n| MathOptions::new(n).unwrap().conservation_tolerance())
            .collect();
        assert!(tols[0] > tols[1] && tols[1] > tols[2]);
        assert!(tols[2] >= 1e-10);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        assert!(MathOptions::new(0).is_err());
        assert!(MathOptions::new(3).unwrap().with_slices(0).is_err());
    }

    #[test]
    fn test_failure_result_has_no_orders() {
        let opts = MathOptions::new(2).unwrap();
        let err = SolverError::InvalidInput("bad angle".into());
        let result = EfficiencyResult::failure(0.01, 95.0, &opts, &err);
        assert_eq!(result.status, EvaluationStatus::Failure);
        assert!(result.orders.is_empty());
        assert!(result.message().unwrap().contains("bad angle"));
        assert!(!result.status.has_efficiencies());
    }
}

//! Sweep plans: which (incidence, wavelength) pairs to evaluate.

use std::fmt;
use std::str::FromStr;

use lamella_materials::HC_EV_UM;
use serde::{Deserialize, Serialize};

use super::SweepError;

/// What varies during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SweepMode {
    /// Wavelength varies at a fixed incidence angle.
    ConstantIncidence,
    /// Wavelength varies; the incidence angle follows so that the angle
    /// between the incident beam and a chosen diffracted order stays fixed.
    ConstantIncludedAngle,
    /// Incidence angle varies at a fixed wavelength.
    ConstantWavelength,
}

impl SweepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepMode::ConstantIncidence => "constantIncidence",
            SweepMode::ConstantIncludedAngle => "constantIncludedAngle",
            SweepMode::ConstantWavelength => "constantWavelength",
        }
    }
}

impl fmt::Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constantIncidence" => Ok(SweepMode::ConstantIncidence),
            "constantIncludedAngle" => Ok(SweepMode::ConstantIncludedAngle),
            "constantWavelength" => Ok(SweepMode::ConstantWavelength),
            other => Err(format!(
                "unknown mode '{other}' (expected constantIncidence, constantIncludedAngle or constantWavelength)"
            )),
        }
    }
}

/// Units of the spectral values of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpectralUnits {
    #[default]
    Micrometres,
    /// Photon energy; $\lambda[\mu m] = 1.23984172 / E[eV]$.
    ElectronVolts,
}

impl SpectralUnits {
    /// Vacuum wavelength (µm) of a spectral value in these units.
    pub fn to_wavelength_um(&self, value: f64) -> f64 {
        match self {
            SpectralUnits::Micrometres => value,
            SpectralUnits::ElectronVolts => HC_EV_UM / value,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpectralUnits::Micrometres => "um",
            SpectralUnits::ElectronVolts => "eV",
        }
    }
}

/// The fixed part of a sweep's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepGeometry {
    ConstantIncidence {
        incidence_deg: f64,
    },
    ConstantIncludedAngle {
        included_angle_deg: f64,
        /// Diffraction order the included angle is measured to.
        order: i32,
    },
    ConstantWavelength {
        /// In the plan's spectral units.
        wavelength: f64,
    },
}

impl SweepGeometry {
    pub fn mode(&self) -> SweepMode {
        match self {
            SweepGeometry::ConstantIncidence { .. } => SweepMode::ConstantIncidence,
            SweepGeometry::ConstantIncludedAngle { .. } => SweepMode::ConstantIncludedAngle,
            SweepGeometry::ConstantWavelength { .. } => SweepMode::ConstantWavelength,
        }
    }
}

/// One point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepStep {
    pub index: usize,
    /// The swept value: wavelength or energy, or incidence angle for
    /// [`SweepMode::ConstantWavelength`].
    pub value: f64,
    pub wavelength_um: f64,
    /// `None` when no incidence angle satisfies the included-angle condition.
    pub incidence_deg: Option<f64>,
}

/// A validated list of sweep values, `min + i * increment` for
/// `i = 0..len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    geometry: SweepGeometry,
    units: SpectralUnits,
    min: f64,
    max: f64,
    increment: f64,
    len: usize,
}

impl SweepPlan {
    pub fn new(
        geometry: SweepGeometry,
        units: SpectralUnits,
        min: f64,
        max: f64,
        increment: f64,
    ) -> Result<Self, SweepError> {
        let invalid = |msg: String| Err(SweepError::InvalidPlan(msg));
        if ![min, max, increment].iter().all(|v| v.is_finite()) {
            return invalid(format!(
                "min, max and increment must be finite (got {min}, {max}, {increment})"
            ));
        }
        if increment <= 0.0 {
            return invalid(format!("increment must be positive, got {increment}"));
        }
        if max < min {
            return invalid(format!("max ({max}) is below min ({min})"));
        }

        match geometry {
            SweepGeometry::ConstantWavelength { wavelength } => {
                if !(wavelength.is_finite() && wavelength > 0.0) {
                    return invalid(format!(
                        "wavelength must be finite and positive, got {wavelength} {}",
                        units.label()
                    ));
                }
            }
            SweepGeometry::ConstantIncidence { incidence_deg } => {
                if !incidence_deg.is_finite() {
                    return invalid(format!("incidence angle must be finite, got {incidence_deg}"));
                }
                if min <= 0.0 {
                    return invalid(format!("spectral values must be positive, got min = {min}"));
                }
            }
            SweepGeometry::ConstantIncludedAngle {
                included_angle_deg, ..
            } => {
                if !included_angle_deg.is_finite() {
                    return invalid(format!(
                        "included angle must be finite, got {included_angle_deg}"
                    ));
                }
                if min <= 0.0 {
                    return invalid(format!("spectral values must be positive, got min = {min}"));
                }
            }
        }

        let len = ((max - min) / increment + 1e-9).floor() as usize + 1;
        Ok(Self {
            geometry,
            units,
            min,
            max,
            increment,
            len,
        })
    }

    pub fn mode(&self) -> SweepMode {
        self.geometry.mode()
    }

    pub fn geometry(&self) -> &SweepGeometry {
        &self.geometry
    }

    pub fn units(&self) -> SpectralUnits {
        self.units
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The swept value of step `index`.
    pub fn value(&self, index: usize) -> f64 {
        self.min + index as f64 * self.increment
    }

    /// Resolve step `index` for a grating of period `period_um`.
    pub fn step(&self, index: usize, period_um: f64) -> SweepStep {
        let value = self.value(index);
        let (wavelength_um, incidence_deg) = match self.geometry {
            SweepGeometry::ConstantIncidence { incidence_deg } => {
                (self.units.to_wavelength_um(value), Some(incidence_deg))
            }
            SweepGeometry::ConstantWavelength { wavelength } => {
                (self.units.to_wavelength_um(wavelength), Some(value))
            }
            SweepGeometry::ConstantIncludedAngle {
                included_angle_deg,
                order,
            } => {
                let wavelength_um = self.units.to_wavelength_um(value);
                (
                    wavelength_um,
                    included_angle_incidence(included_angle_deg, order, wavelength_um, period_um),
                )
            }
        };
        SweepStep {
            index,
            value,
            wavelength_um,
            incidence_deg,
        }
    }

    pub fn steps(&self, period_um: f64) -> Vec<SweepStep> {
        (0..self.len).map(|i| self.step(i, period_um)).collect()
    }
}

/// Incidence angle $\theta$ such that order `order` leaves at
/// `included_angle_deg` from the incident beam:
///
/// $$\theta = \arcsin\!\left(\frac{-m\lambda}{2\Lambda\cos(\psi/2)}\right) + \frac{\psi}{2}$$
pub fn included_angle_incidence(
    included_angle_deg: f64,
    order: i32,
    wavelength_um: f64,
    period_um: f64,
) -> Option<f64> {
    let half = (included_angle_deg / 2.0).to_radians();
    let arg = -(order as f64) * wavelength_um / (2.0 * period_um * half.cos());
    if !(arg.abs() <= 1.0) {
        return None;
    }
    Some(arg.asin().to_degrees() + included_angle_deg / 2.0)
}

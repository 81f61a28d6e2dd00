//! Material property provider traits.
//!
//! Two levels of abstraction are used:
//!
//! - [`MaterialProvider`] describes a single material: its complex refractive
//!   index $\tilde{n} = n + ik$ as a function of wavelength.
//! - [`MaterialOptics`] is the lookup interface the solver depends on: given a
//!   material *name* and a wavelength, return $\tilde{n}$. The in-memory
//!   [`MaterialDatabase`](crate::database::MaterialDatabase) implements it.

use num_complex::Complex64;
use thiserror::Error;

/// Errors from material providers and lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialError {
    #[error("Wavelength {wavelength_um} um is outside the data range [{min}, {max}] um")]
    OutOfRange {
        wavelength_um: f64,
        min: f64,
        max: f64,
    },

    #[error("Material not found: {0}")]
    NotFound(String),

    #[error("Data error: {0}")]
    DataError(String),
}

/// Provides the wavelength-dependent optical constants of one material.
pub trait MaterialProvider: Send + Sync {
    /// Human-readable name of this material.
    fn name(&self) -> &str;

    /// Wavelength range over which data is available (µm).
    fn wavelength_range(&self) -> (f64, f64);

    /// Complex refractive index $\tilde{n} = n + ik$ at a wavelength in µm.
    fn refractive_index(&self, wavelength_um: f64) -> Result<Complex64, MaterialError>;
}

/// Name-based refractive index lookup.
///
/// This is the only material interface the grating solver sees. Lookups must
/// be pure: the same `(material, wavelength)` always yields the same index,
/// so evaluations can run concurrently.
pub trait MaterialOptics: Send + Sync {
    /// Complex refractive index $n + ik$ of `material` at `wavelength_um`.
    fn lookup(&self, material: &str, wavelength_um: f64) -> Result<Complex64, MaterialError>;

    /// Names of all materials this source can resolve, sorted.
    fn material_names(&self) -> Vec<String>;
}

/// A material with the same complex index at every wavelength.
///
/// Useful for idealised dielectrics and lossless reflectors (purely imaginary
/// index, i.e. real negative permittivity).
#[derive(Debug, Clone)]
pub struct ConstantIndex {
    name: String,
    index: Complex64,
}

impl ConstantIndex {
    pub fn new(name: impl Into<String>, n: f64, k: f64) -> Self {
        Self {
            name: name.into(),
            index: Complex64::new(n, k),
        }
    }
}

impl MaterialProvider for ConstantIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn refractive_index(&self, wavelength_um: f64) -> Result<Complex64, MaterialError> {
        if !(wavelength_um.is_finite() && wavelength_um > 0.0) {
            return Err(MaterialError::OutOfRange {
                wavelength_um,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        Ok(self.index)
    }
}

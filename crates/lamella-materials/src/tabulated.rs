//! Tabulated soft x-ray optical constants.
//!
//! Soft x-ray tables are conventionally given per photon energy as the
//! decrement and absorption index of $\tilde{n} = 1 - \delta + i\beta$.
//! Both quantities fall off roughly as a power law in energy, so they are
//! interpolated as $\ln\delta$ and $\ln\beta$ against $\ln\lambda$, which keeps
//! them positive between the knots.
//!
//! ## Built-in tables
//!
//! | Identifier | Constructor | Energy range |
//! |-----------|-------------|--------------|
//! | `Au` | [`TabulatedMaterial::gold()`] | 50–1000 eV |
//! | `Ni` | [`TabulatedMaterial::nickel()`] | 50–1000 eV |
//! | `C`  | [`TabulatedMaterial::carbon()`] | 50–280 eV |
//!
//! The built-in values are coarse representative numbers, sufficient to
//! exercise the solver on realistic contrast and absorption. They are not a
//! substitute for a measured optical-constant database.

use num_complex::Complex64;

use crate::provider::{MaterialError, MaterialProvider};
use crate::spline::CubicSpline;
use crate::HC_EV_UM;

/// A material described by $(E, \delta, \beta)$ samples.
#[derive(Debug, Clone)]
pub struct TabulatedMaterial {
    name: String,
    /// Wavelength bounds (µm) of the table.
    range: (f64, f64),
    log_delta: CubicSpline,
    log_beta: CubicSpline,
}

impl TabulatedMaterial {
    /// Build from `(photon energy eV, δ, β)` samples in any order.
    ///
    /// Energies must be distinct and positive, and δ, β strictly positive.
    pub fn from_energy_table(
        name: impl Into<String>,
        samples: &[(f64, f64, f64)],
    ) -> Result<Self, MaterialError> {
        let name = name.into();
        if let Some(&(e, d, b)) = samples
            .iter()
            .find(|&&(e, d, b)| !(e > 0.0 && d > 0.0 && b > 0.0))
        {
            return Err(MaterialError::DataError(format!(
                "{name}: sample (E={e}, delta={d}, beta={b}) must be strictly positive"
            )));
        }

        // Ascending wavelength is descending energy.
        let mut rows: Vec<(f64, f64, f64)> = samples
            .iter()
            .map(|&(e, d, b)| (HC_EV_UM / e, d, b))
            .collect();
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));

        let log_lambda: Vec<f64> = rows.iter().map(|r| r.0.ln()).collect();
        let log_delta = CubicSpline::new(log_lambda.clone(), rows.iter().map(|r| r.1.ln()).collect())?;
        let log_beta = CubicSpline::new(log_lambda, rows.iter().map(|r| r.2.ln()).collect())?;
        let range = (rows[0].0, rows[rows.len() - 1].0);

        Ok(Self {
            name,
            range,
            log_delta,
            log_beta,
        })
    }

    /// Gold.
    pub fn gold() -> Result<Self, MaterialError> {
        Self::from_energy_table(
            "Au",
            &[
                (50.0, 0.1320, 0.0750),
                (70.0, 0.1040, 0.0620),
                (100.0, 0.0710, 0.0470),
                (130.0, 0.0480, 0.0330),
                (160.0, 0.0330, 0.0230),
                (200.0, 0.0215, 0.0160),
                (250.0, 0.0140, 0.0110),
                (300.0, 0.0098, 0.0078),
                (400.0, 0.0058, 0.0040),
                (500.0, 0.0038, 0.0024),
                (700.0, 0.0019, 0.0010),
                (1000.0, 0.00092, 0.00042),
            ],
        )
    }

    /// Nickel. The M-edge near 68 eV shows up as a bump in β.
    pub fn nickel() -> Result<Self, MaterialError> {
        Self::from_energy_table(
            "Ni",
            &[
                (50.0, 0.0950, 0.0600),
                (70.0, 0.0700, 0.0780),
                (100.0, 0.0420, 0.0400),
                (130.0, 0.0280, 0.0230),
                (160.0, 0.0200, 0.0140),
                (200.0, 0.0130, 0.0085),
                (250.0, 0.0085, 0.0052),
                (300.0, 0.0060, 0.0034),
                (400.0, 0.0034, 0.0016),
                (500.0, 0.0022, 0.00085),
                (700.0, 0.0011, 0.00033),
                (1000.0, 0.00058, 0.00012),
            ],
        )
    }

    /// Amorphous carbon, below the K edge.
    pub fn carbon() -> Result<Self, MaterialError> {
        Self::from_energy_table(
            "C",
            &[
                (50.0, 0.0420, 0.0180),
                (70.0, 0.0230, 0.0090),
                (100.0, 0.0110, 0.0040),
                (130.0, 0.0065, 0.0020),
                (160.0, 0.0042, 0.0011),
                (200.0, 0.0026, 0.00060),
                (250.0, 0.0016, 0.00030),
                (280.0, 0.0013, 0.00020),
            ],
        )
    }
}

impl MaterialProvider for TabulatedMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        self.range
    }

    fn refractive_index(&self, wavelength_um: f64) -> Result<Complex64, MaterialError> {
        let (min, max) = self.range;
        // Tolerate the rounding introduced by the eV <-> µm conversion at the table edges.
        let slack = 1e-12 * max;
        if !(wavelength_um >= min - slack && wavelength_um <= max + slack) {
            return Err(MaterialError::OutOfRange {
                wavelength_um,
                min,
                max,
            });
        }
        let x = wavelength_um.ln();
        let delta = self.log_delta.evaluate(x).exp();
        let beta = self.log_beta.evaluate(x).exp();
        Ok(Complex64::new(1.0 - delta, beta))
    }
}

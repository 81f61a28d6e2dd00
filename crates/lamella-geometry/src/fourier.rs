//! Fourier series of the permittivity of lamellar layers.
//!
//! Each layer is piecewise constant in $x$: $\varepsilon_g$ on its material
//! spans and $\varepsilon_a$ elsewhere. The coefficients
//!
//! $$\varepsilon_k = \frac{1}{\Lambda}\int_0^\Lambda \varepsilon(x)\,e^{-i 2\pi k x/\Lambda}\,dx$$
//!
//! are exact sums over the spans: an interval $[a, b]$ of $x/\Lambda$
//! contributes $(b-a)\,e^{-i\pi k(a+b)}\,\mathrm{sinc}(\pi k (b-a))$. Both
//! $\varepsilon$ and $1/\varepsilon$ are expanded, for indices $-2N..2N$, as
//! required by the coupling matrices of a $2N+1$ harmonic truncation.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::profile::{GeometryError, GratingProfile};
use crate::slicing::slice_profile;

/// Coefficients $c_k$ for $k = -K..=K$.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierSeries {
    max_order: usize,
    coefficients: Vec<Complex64>,
}

impl FourierSeries {
    /// A spatially uniform value: only $c_0$ is non-zero.
    pub fn uniform(value: Complex64, max_order: usize) -> Self {
        let mut coefficients = vec![Complex64::new(0.0, 0.0); 2 * max_order + 1];
        coefficients[max_order] = value;
        Self {
            max_order,
            coefficients,
        }
    }

    /// `inside` on `spans` (fractions of the period), `outside` elsewhere.
    pub fn piecewise(spans: &[(f64, f64)], inside: Complex64, outside: Complex64, max_order: usize) -> Self {
        let contrast = inside - outside;
        let coefficients = (-(max_order as i64)..=max_order as i64)
            .map(|k| {
                let base = if k == 0 { outside } else { Complex64::new(0.0, 0.0) };
                let shape: Complex64 = spans.iter().map(|&(a, b)| span_coefficient(k, a, b)).sum();
                base + contrast * shape
            })
            .collect();
        Self {
            max_order,
            coefficients,
        }
    }

    /// Highest harmonic index held.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// $c_k$, zero outside the stored range.
    pub fn get(&self, k: i64) -> Complex64 {
        if k.unsigned_abs() as usize > self.max_order {
            return Complex64::new(0.0, 0.0);
        }
        self.coefficients[(k + self.max_order as i64) as usize]
    }

    /// Coefficients in ascending index order.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.coefficients
    }
}

/// Fourier data for one layer of the staircase.
#[derive(Debug, Clone)]
pub struct LayerSeries {
    pub thickness_um: f64,
    pub permittivity: FourierSeries,
    pub inverse_permittivity: FourierSeries,
}

/// $\int_a^b e^{-i 2\pi k u}\,du$.
fn span_coefficient(k: i64, a: f64, b: f64) -> Complex64 {
    let width = b - a;
    if k == 0 {
        return Complex64::new(width, 0.0);
    }
    let arg = PI * k as f64 * width;
    let phase = Complex64::from_polar(1.0, -PI * k as f64 * (a + b));
    phase * (width * arg.sin() / arg)
}

impl GratingProfile {
    /// Slice the profile into `slices` layers and expand each layer's
    /// permittivity for a truncation of `truncation` orders either side of
    /// the specular one.
    ///
    /// Layers are top first. A flat profile gives an empty list.
    pub fn fourier_coefficients(
        &self,
        truncation: usize,
        slices: usize,
        eps_material: Complex64,
        eps_ambient: Complex64,
    ) -> Result<Vec<LayerSeries>, GeometryError> {
        let max_order = 2 * truncation;
        let inv_material = eps_material.inv();
        let inv_ambient = eps_ambient.inv();

        Ok(slice_profile(self, slices)?
            .into_iter()
            .map(|slice| LayerSeries {
                thickness_um: slice.thickness_um,
                permittivity: FourierSeries::piecewise(&slice.spans, eps_material, eps_ambient, max_order),
                inverse_permittivity: FourierSeries::piecewise(&slice.spans, inv_material, inv_ambient, max_order),
            })
            .collect())
    }
}

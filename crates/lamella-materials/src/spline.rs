//! Cubic spline interpolation of tabulated optical constants.
//!
//! Soft x-ray tables are sparse (a handful of photon energies per decade), so
//! the optical constants between knots are interpolated with natural cubic
//! splines. Malformed tables are reported as [`MaterialError::DataError`]
//! rather than panicking, since they may come from user-supplied data.

use crate::provider::MaterialError;

/// A natural cubic spline interpolator for real-valued data.
///
/// Given $n$ knots $(x_i, y_i)$, constructs piecewise cubic polynomials with
/// continuous first and second derivatives and zero curvature at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Construct a natural cubic spline.
    ///
    /// `xs` must be strictly increasing, finite, and of the same length as
    /// `ys` (at least two points).
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, MaterialError> {
        if xs.len() != ys.len() {
            return Err(MaterialError::DataError(format!(
                "spline knots and values differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(MaterialError::DataError(
                "spline needs at least 2 data points".into(),
            ));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(MaterialError::DataError(
                "spline data contains non-finite values".into(),
            ));
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(MaterialError::DataError(format!(
                "spline knots must be strictly increasing (index {i})"
            )));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Tridiagonal forward sweep
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            let slope_jump = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * slope_jump / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// The closed interval covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot range the boundary polynomial is extrapolated; callers
    /// that must not extrapolate check [`domain`](Self::domain) first.
    pub fn evaluate(&self, x: f64) -> f64 {
        // partition_point returns the first knot strictly greater than x
        let upper = self.xs.partition_point(|&knot| knot <= x);
        let hi = upper.clamp(1, self.xs.len() - 1);
        let lo = hi - 1;

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_spline_passes_through_data_points() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();

        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(spline.evaluate(*x), *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_spline_reproduces_straight_line() {
        let xs = vec![0.0, 0.5, 2.0, 3.5];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();
        for x in [0.25, 1.0, 1.7, 3.0] {
            assert_abs_diff_eq!(spline.evaluate(x), 3.0 * x - 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spline_rejects_unsorted_knots() {
        let result = CubicSpline::new(vec![1.0, 3.0, 2.0], vec![0.0, 1.0, 2.0]);
        assert!(matches!(result, Err(MaterialError::DataError(_))));
    }

    #[test]
    fn test_spline_rejects_single_point() {
        assert!(CubicSpline::new(vec![1.0], vec![1.0]).is_err());
    }
}

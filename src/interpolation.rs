//! Interpolation on monotone tables: natural cubic splines for curves and
//! bilinear blending for tabulated loss surfaces.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Natural cubic spline over strictly increasing abscissae.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Fits a natural spline through `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when fewer than two points are given
    /// or the abscissae are not strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(Error::InvalidInput(
                "spline needs at least two points with matching lengths".to_owned(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput(
                "spline abscissae must be strictly increasing".to_owned(),
            ));
        }

        let n = x.len();
        let mut second_derivatives = vec![0.0; n];
        let mut scratch = vec![0.0; n];

        // tridiagonal sweep for the natural boundary conditions
        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * second_derivatives[i - 1] + 2.0;
            second_derivatives[i] = (sig - 1.0) / p;
            let slope_right = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
            let slope_left = (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            scratch[i] =
                (6.0 * (slope_right - slope_left) / (x[i + 1] - x[i - 1]) - sig * scratch[i - 1]) / p;
        }
        for i in (0..n - 1).rev() {
            second_derivatives[i] = second_derivatives[i] * second_derivatives[i + 1] + scratch[i];
        }

        Ok(Self {
            x,
            y,
            second_derivatives,
        })
    }

    /// Evaluates the spline at `x`, extrapolating linearly outside the table.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x <= self.x[0] {
            let slope = self.slope_at_knot(0);
            return self.y[0] + slope * (x - self.x[0]);
        }
        if x >= self.x[n - 1] {
            let slope = self.slope_at_knot(n - 1);
            return self.y[n - 1] + slope * (x - self.x[n - 1]);
        }
        let i = match self.x.binary_search_by(|probe| probe.total_cmp(&x)) {
            Ok(i) => return self.y[i],
            Err(i) => i - 1,
        };
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - x) / h;
        let b = (x - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a.powi(3) - a) * self.second_derivatives[i]
                + (b.powi(3) - b) * self.second_derivatives[i + 1])
                * h
                * h
                / 6.0
    }

    fn slope_at_knot(&self, i: usize) -> f64 {
        let n = self.x.len();
        if i == 0 {
            let h = self.x[1] - self.x[0];
            (self.y[1] - self.y[0]) / h - h / 6.0 * (2.0 * self.second_derivatives[0] + self.second_derivatives[1])
        } else {
            let h = self.x[n - 1] - self.x[n - 2];
            (self.y[n - 1] - self.y[n - 2]) / h
                + h / 6.0 * (self.second_derivatives[n - 2] + 2.0 * self.second_derivatives[n - 1])
        }
    }
}

/// Interpolates a table of `(x, y)` pairs with a spline when it has enough
/// points and linearly otherwise.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] on an empty table.
pub fn interpolate_table(points: &[(f64, f64)], x: f64) -> Result<f64> {
    match points {
        [] => Err(Error::InvalidInput("empty interpolation table".to_owned())),
        [only] => Ok(only.1),
        [a, b] => {
            let t = (x - a.0) / (b.0 - a.0);
            Ok(a.1 + t * (b.1 - a.1))
        }
        _ => {
            let (xs, ys): (Vec<_>, Vec<_>) = points.iter().copied().unzip();
            Ok(CubicSpline::new(xs, ys)?.evaluate(x))
        }
    }
}

/// A surface `z(x, y)` sampled on a rectangular grid, interpolated
/// bilinearly in log-log on both axes. Used for tabulated volumetric-loss
/// data where both frequency and flux density span decades.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LogLogSurface {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Row-major, `z[i_x * y.len() + i_y]`, strictly positive.
    z: Vec<f64>,
}

impl LogLogSurface {
    /// Builds the surface from grid axes and row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the grid is degenerate, not
    /// strictly increasing, or contains non-positive values.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() < 2 || y.len() < 2 || z.len() != x.len() * y.len() {
            return Err(Error::InvalidInput("degenerate loss surface grid".to_owned()));
        }
        let monotone = |v: &[f64]| v.windows(2).all(|w| w[1] > w[0]) && v[0] > 0.0;
        if !monotone(&x) || !monotone(&y) || z.iter().any(|&v| v <= 0.0) {
            return Err(Error::InvalidInput(
                "loss surface axes must be positive and strictly increasing".to_owned(),
            ));
        }
        Ok(Self { x, y, z })
    }

    /// Evaluates the surface at `(x, y)`, clamping to the grid edges.
    #[must_use]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (ix, tx) = Self::locate(&self.x, x);
        let (iy, ty) = Self::locate(&self.y, y);
        let ny = self.y.len();
        let z00 = self.z[ix * ny + iy].ln();
        let z01 = self.z[ix * ny + iy + 1].ln();
        let z10 = self.z[(ix + 1) * ny + iy].ln();
        let z11 = self.z[(ix + 1) * ny + iy + 1].ln();
        let z0 = z00 + ty * (z01 - z00);
        let z1 = z10 + ty * (z11 - z10);
        (z0 + tx * (z1 - z0)).exp()
    }

    fn locate(axis: &[f64], value: f64) -> (usize, f64) {
        let v = value.max(axis[0]).min(axis[axis.len() - 1]).ln();
        let i = axis
            .windows(2)
            .position(|w| v <= w[1].ln())
            .unwrap_or(axis.len() - 2);
        let lo = axis[i].ln();
        let hi = axis[i + 1].ln();
        (i, (v - lo) / (hi - lo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn spline_reproduces_knots() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 4.0, 9.0]).unwrap();
        assert_approx_eq!(f64, spline.evaluate(2.0), 4.0, epsilon = 1e-12);
        // a parabola is reproduced well inside the table
        assert_approx_eq!(f64, spline.evaluate(1.5), 2.25, epsilon = 0.1);
    }

    #[test]
    fn log_log_surface_is_exact_for_power_laws() {
        // z = x^1.5 * y^2.5 is linear in log-log, so bilinear blending is exact
        let x = vec![1e4, 1e5, 1e6];
        let y = vec![0.01, 0.1, 1.0];
        let z = x
            .iter()
            .flat_map(|&f: &f64| y.iter().map(move |&b: &f64| f.powf(1.5) * b.powf(2.5)))
            .collect();
        let surface = LogLogSurface::new(x, y, z).unwrap();
        let expected = 3e4_f64.powf(1.5) * 0.05_f64.powf(2.5);
        assert_approx_eq!(f64, surface.evaluate(3e4, 0.05), expected, epsilon = expected * 1e-9);
    }
}

//! Levenberg–Marquardt nonlinear least squares for caller-supplied
//! residual functions.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2};

/// Options controlling the fit.
#[derive(Clone, Debug)]
pub struct FitOptions {
    /// Iteration budget before the fit is declared diverged.
    pub maximum_iterations: usize,
    /// Relative cost decrease under which the fit is considered converged.
    pub cost_tolerance: f64,
    /// Infinity norm of the gradient under which the fit stops.
    pub gradient_tolerance: f64,
    /// Relative step used by the forward-difference Jacobian.
    pub jacobian_step: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            maximum_iterations: 100,
            cost_tolerance: 1e-12,
            gradient_tolerance: 1e-12,
            jacobian_step: 1e-7,
        }
    }
}

/// Result of a successful fit.
#[derive(Clone, Debug)]
pub struct FitReport {
    /// Best parameter vector found.
    pub parameters: Vec<f64>,
    /// Final sum of squared residuals.
    pub cost: f64,
    /// Iterations actually spent.
    pub iterations: usize,
}

/// Minimizes `‖residuals(p)‖²` starting from `initial`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the residual function fails on the
/// starting point, [`Error::NaNResult`] when residuals stop being finite and
/// [`Error::Diverged`] when the iteration budget runs out while the cost is
/// still falling.
pub fn levenberg_marquardt<F>(
    residuals: F,
    initial: &[f64],
    options: &FitOptions,
) -> Result<FitReport>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    let mut parameters = initial.to_vec();
    let mut residual = residuals(&parameters)?;
    let mut cost = squared_norm(&residual);
    if !cost.is_finite() {
        return Err(Error::NaNResult("initial residuals are not finite".to_owned()));
    }

    let mut lambda = 1e-3;
    for iteration in 0..options.maximum_iterations {
        let jacobian = numerical_jacobian(&residuals, &parameters, &residual, options.jacobian_step)?;
        let gradient = jacobian.t().dot(&Array1::from_vec(residual.clone()));
        if gradient.iter().fold(0.0_f64, |m, g| m.max(g.abs())) < options.gradient_tolerance {
            return Ok(FitReport {
                parameters,
                cost,
                iterations: iteration,
            });
        }

        let mut normal = jacobian.t().dot(&jacobian);
        for i in 0..parameters.len() {
            normal[[i, i]] *= 1.0 + lambda;
        }
        let Some(step) = solve_linear(&normal, &gradient) else {
            lambda *= 10.0;
            continue;
        };

        let trial: Vec<f64> = parameters
            .iter()
            .zip(step.iter())
            .map(|(p, s)| p - s)
            .collect();
        match residuals(&trial) {
            Ok(trial_residual) => {
                let trial_cost = squared_norm(&trial_residual);
                if trial_cost.is_finite() && trial_cost < cost {
                    let improvement = (cost - trial_cost) / cost.max(f64::MIN_POSITIVE);
                    parameters = trial;
                    residual = trial_residual;
                    cost = trial_cost;
                    lambda = (lambda / 10.0).max(1e-12);
                    if improvement < options.cost_tolerance {
                        return Ok(FitReport {
                            parameters,
                            cost,
                            iterations: iteration + 1,
                        });
                    }
                } else {
                    lambda *= 10.0;
                }
            }
            Err(_) => lambda *= 10.0,
        }
        if lambda > 1e12 {
            // the damping has frozen the step; accept the stationary point
            return Ok(FitReport {
                parameters,
                cost,
                iterations: iteration + 1,
            });
        }
    }

    Err(Error::Diverged(format!(
        "least squares did not settle in {} iterations (cost {cost:.3e})",
        options.maximum_iterations
    )))
}

fn squared_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

fn numerical_jacobian<F>(
    residuals: &F,
    parameters: &[f64],
    base: &[f64],
    relative_step: f64,
) -> Result<Array2<f64>>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    let mut jacobian = Array2::zeros((base.len(), parameters.len()));
    let mut perturbed = parameters.to_vec();
    for j in 0..parameters.len() {
        let step = relative_step * parameters[j].abs().max(1e-9);
        perturbed[j] = parameters[j] + step;
        let shifted = residuals(&perturbed)?;
        perturbed[j] = parameters[j];
        for (i, (s, b)) in shifted.iter().zip(base.iter()).enumerate() {
            jacobian[[i, j]] = (s - b) / step;
        }
    }
    Ok(jacobian)
}

/// Gaussian elimination with partial pivoting. Returns `None` on a singular
/// system, which the caller answers by raising the damping.
fn solve_linear(matrix: &Array2<f64>, rhs: &Array1<f64>) -> Option<Array1<f64>> {
    let n = rhs.len();
    let mut a = matrix.clone();
    let mut b = rhs.clone();
    for column in 0..n {
        let pivot_row = (column..n).max_by(|&i, &j| a[[i, column]].abs().total_cmp(&a[[j, column]].abs()))?;
        if a[[pivot_row, column]].abs() < 1e-300 {
            return None;
        }
        if pivot_row != column {
            for k in 0..n {
                let tmp = a[[column, k]];
                a[[column, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(column, pivot_row);
        }
        for row in column + 1..n {
            let factor = a[[row, column]] / a[[column, column]];
            for k in column..n {
                a[[row, k]] -= factor * a[[column, k]];
            }
            b[row] -= factor * b[column];
        }
    }
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn fits_an_exponential_decay() {
        let xs: Vec<f64> = (0..20).map(|i| f64::from(i) * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * (-1.7 * x).exp()).collect();
        let report = levenberg_marquardt(
            |p| {
                Ok(xs
                    .iter()
                    .zip(ys.iter())
                    .map(|(x, y)| p[0] * (-p[1] * x).exp() - y)
                    .collect())
            },
            &[1.0, 1.0],
            &FitOptions::default(),
        )
        .unwrap();
        assert_approx_eq!(f64, report.parameters[0], 3.0, epsilon = 1e-6);
        assert_approx_eq!(f64, report.parameters[1], 1.7, epsilon = 1e-6);
    }
}

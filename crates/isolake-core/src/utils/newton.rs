//! Damped Newton iteration for small dense nonlinear systems.
//!
//! The Jacobian is approximated by forward differences and each step is solved with a dense
//! LU factorisation. Steps are halved until the residual norm decreases, which keeps the
//! iteration stable when the initial guess is only roughly right.

use crate::errors::{IsolakeError, IsolakeResult};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Relative step used for the finite-difference Jacobian ($\sqrt{\epsilon}$ of `f64`).
const JACOBIAN_STEP: f64 = 1.4901161193847656e-8;

/// Smallest line-search step fraction before the iteration is declared stalled.
const MIN_STEP_FRACTION: f64 = 1.0 / 1024.0;

/// Options controlling the Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum number of Newton steps.
    /// Default: 100
    pub max_iterations: usize,

    /// Euclidean norm of the residual vector below which the system is solved.
    /// Default: 1e-8
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

/// Converged root of a nonlinear system.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonSolution {
    pub root: Vec<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn residual_norm<F>(residuals: &F, x: &[f64]) -> f64
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = norm(&residuals(x));
    if n.is_finite() {
        n
    } else {
        f64::INFINITY
    }
}

fn jacobian<F>(residuals: &F, x: &[f64], f0: &[f64]) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = x.len();
    let mut jac = DMatrix::zeros(f0.len(), n);
    let mut probe = x.to_vec();
    for j in 0..n {
        let step = JACOBIAN_STEP * x[j].abs().max(1.0);
        probe[j] = x[j] + step;
        let f1 = residuals(&probe);
        for (i, (a, b)) in f1.iter().zip(f0).enumerate() {
            jac[(i, j)] = (a - b) / step;
        }
        probe[j] = x[j];
    }
    jac
}

/// Find a root of `residuals` starting from `initial_guess`.
///
/// `residuals` must return one value per unknown. Variables should be scaled so that they
/// and the residuals are of order one; the finite-difference step is relative to
/// `max(|x|, 1)`.
///
/// # Errors
///
/// [`IsolakeError::ConvergenceFailure`] when the tolerance is not reached within
/// `max_iterations`, when the Jacobian is singular, or when no step along the Newton
/// direction reduces the residual. The error carries the last iterate.
pub fn solve<F>(
    residuals: F,
    initial_guess: &[f64],
    options: &SolverOptions,
) -> IsolakeResult<NewtonSolution>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = initial_guess.len();
    let mut x = initial_guess.to_vec();
    let mut f = residuals(&x);
    if f.len() != n {
        return Err(IsolakeError::InvalidConfig(format!(
            "Residual function returned {} values for {} unknowns",
            f.len(),
            n
        )));
    }
    let mut current_norm = norm(&f);
    let failure = |x: Vec<f64>, iterations: usize, residual_norm: f64| {
        IsolakeError::ConvergenceFailure {
            iterations,
            residual_norm,
            best_estimate: x,
        }
    };

    if !current_norm.is_finite() {
        return Err(failure(x, 0, current_norm));
    }

    for iteration in 0..options.max_iterations {
        if current_norm < options.tolerance {
            debug!(
                "Newton converged in {} iterations (residual norm {:e})",
                iteration, current_norm
            );
            return Ok(NewtonSolution {
                root: x,
                iterations: iteration,
                residual_norm: current_norm,
            });
        }

        let jac = jacobian(&residuals, &x, &f);
        let rhs = DVector::from_iterator(n, f.iter().map(|v| -v));
        let delta = match jac.lu().solve(&rhs) {
            Some(delta) => delta,
            None => {
                debug!("Singular Jacobian at iteration {}", iteration);
                return Err(failure(x, iteration, current_norm));
            }
        };

        let mut fraction = 1.0;
        let mut accepted = None;
        while fraction >= MIN_STEP_FRACTION {
            let candidate: Vec<f64> = x
                .iter()
                .zip(delta.iter())
                .map(|(xi, di)| xi + fraction * di)
                .collect();
            let candidate_norm = residual_norm(&residuals, &candidate);
            if candidate_norm < current_norm {
                accepted = Some(candidate);
                break;
            }
            fraction *= 0.5;
        }

        match accepted {
            Some(candidate) => {
                x = candidate;
                f = residuals(&x);
                current_norm = norm(&f);
            }
            None => {
                debug!("Line search stalled at iteration {}", iteration);
                return Err(failure(x, iteration, current_norm));
            }
        }
    }

    if current_norm < options.tolerance {
        return Ok(NewtonSolution {
            root: x,
            iterations: options.max_iterations,
            residual_norm: current_norm,
        });
    }
    Err(failure(x, options.max_iterations, current_norm))
}

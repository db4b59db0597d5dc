//! Analytic steady-state lake balance
//!
//! For a well-mixed lake of constant volume, the evaporation/inflow ratio follows from the
//! lake and inflow compositions (Gonfiantini, 1986, Equations 5 and 6 of Custado et al., 2024):
//!
//! $$X = \frac{E}{I} = \frac{\delta_L - \delta_I}{A - B \delta_L}$$
//!
//! and inversely, the steady-state composition reached for a given $X$ is
//!
//! $$\delta_S = \frac{X A + \delta_I}{1 + B X}$$
//!
//! which tends to the limiting enrichment $A / B$ as $X \to \infty$.

use crate::craig_gordon::{guard_denominator, mass_balance_coefficients, MassBalanceCoefficients};
use crate::errors::IsolakeResult;
use crate::fractionation::FractionationFactors;
use serde::{Deserialize, Serialize};

/// Result of the analytic steady-state solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyStateSolution {
    /// Steady-state lake composition implied by the solved $X$ (‰).
    pub lake_steady_state: f64,
    /// Evaporation/inflow ratio. Not clamped to $[0, 1]$.
    pub x: f64,
    pub coefficients: MassBalanceCoefficients,
}

/// Forward projection of the lake composition for a chosen $X$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeProjection {
    /// Steady-state lake composition (‰).
    pub lake: f64,
    /// Theoretical maximum enrichment $A / B$ (‰), undefined when $B = 0$.
    pub max_enrichment: Option<f64>,
}

fn x_from_coefficients(
    coefficients: &MassBalanceCoefficients,
    delta_lake: f64,
    delta_inflow: f64,
) -> IsolakeResult<f64> {
    let denominator = guard_denominator(
        coefficients.x_denominator(delta_lake),
        "steady-state denominator A - B * delta_lake",
    )?;
    Ok((delta_lake - delta_inflow) / denominator)
}

fn lake_from_coefficients(
    coefficients: &MassBalanceCoefficients,
    delta_inflow: f64,
    x: f64,
) -> IsolakeResult<f64> {
    let denominator = guard_denominator(1.0 + coefficients.b * x, "projection denominator 1 + B * X")?;
    Ok((x * coefficients.a + delta_inflow) / denominator)
}

/// Solve the steady-state balance for $X$ given observed lake and inflow compositions.
pub fn solve_steady_state(
    humidity: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
    delta_lake: f64,
    delta_inflow: f64,
) -> IsolakeResult<SteadyStateSolution> {
    let coefficients = mass_balance_coefficients(humidity, factors, delta_atmosphere)?;
    let x = x_from_coefficients(&coefficients, delta_lake, delta_inflow)?;
    let lake_steady_state = lake_from_coefficients(&coefficients, delta_inflow, x)?;
    Ok(SteadyStateSolution {
        lake_steady_state,
        x,
        coefficients,
    })
}

/// Evaluate only the evaporation/inflow ratio $X$.
///
/// This is the scalar objective of the Monte Carlo and sensitivity runs.
pub fn evaluate_x(
    humidity: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
    delta_lake: f64,
    delta_inflow: f64,
) -> IsolakeResult<f64> {
    let coefficients = mass_balance_coefficients(humidity, factors, delta_atmosphere)?;
    x_from_coefficients(&coefficients, delta_lake, delta_inflow)
}

/// Project the steady-state lake composition for a chosen $X$.
pub fn project_lake_isotope(
    humidity: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
    delta_inflow: f64,
    x: f64,
) -> IsolakeResult<LakeProjection> {
    let coefficients = mass_balance_coefficients(humidity, factors, delta_atmosphere)?;
    Ok(LakeProjection {
        lake: lake_from_coefficients(&coefficients, delta_inflow, x)?,
        max_enrichment: coefficients.limit(),
    })
}

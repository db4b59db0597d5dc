//! Mass-balance solvers
//!
//! Three solve modes share the Craig-Gordon terms:
//! - [`steady_state`]: closed-form $X$ and steady-state lake composition
//! - [`hydrologic`]: simultaneous water and dual-tracer balance for six unknowns
//! - [`scenario`]: single-unknown root-find for $X$ under perturbed climate
//!
//! All solvers are pure functions without state between calls.

pub mod hydrologic;
pub mod scenario;
pub mod steady_state;

pub use hydrologic::{
    solve_hydrologic_balance, Discharges, EndMembers, HydrologicBalance, HydrologicSolution,
    HydrologicUnknowns,
};
pub use scenario::{solve_x_for_scenario, ScenarioSolver};
pub use steady_state::{
    evaluate_x, project_lake_isotope, solve_steady_state, LakeProjection, SteadyStateSolution,
};

use crate::fractionation::FractionationFactors;

/// Evaporation/inflow ratio implied by one tracer, in the form used by the iterative solvers.
///
/// Algebraically equal to $(\delta_L - \delta_I)/(A - B \delta_L)$ but without the shared
/// denominator factored out, so it stays finite while the iteration explores $h \to 1$.
/// `epsilon_k` is passed separately because the iterative solvers treat humidity as unknown.
pub(crate) fn tracer_balance_ratio(
    humidity: f64,
    epsilon_k: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
    delta_lake: f64,
    delta_inflow: f64,
) -> f64 {
    let enrichment = epsilon_k + factors.epsilon_eq() / factors.alpha();
    ((delta_lake - delta_inflow) * (1.0 - humidity + 0.001 * epsilon_k))
        / (humidity * (delta_atmosphere - delta_lake) + enrichment * (0.001 * delta_lake + 1.0))
}

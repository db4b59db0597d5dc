//! Evaporation/inflow ratio under a perturbed climate.
//!
//! Each call recomputes the equilibrium fractionation, kinetic enrichment and atmospheric
//! composition for its own humidity and temperature, then root-finds the steady-state
//! tracer balance with $X$ as the only unknown. Used once per Monte Carlo trial of the
//! climate-period runs.

use super::tracer_balance_ratio;
use crate::climate::ClimateState;
use crate::craig_gordon::{atmospheric_isotope, guard_denominator, mass_balance_coefficients};
use crate::errors::IsolakeResult;
use crate::fractionation::FractionationFactors;
use crate::species::IsotopeSpecies;
use crate::utils::newton::{self, SolverOptions};
use serde::{Deserialize, Serialize};

/// Configuration of the single-unknown root-find.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSolver {
    /// Tracer used for the balance.
    /// Default: d18O
    pub species: IsotopeSpecies,
    /// Seasonality factor applied to the atmospheric composition.
    /// Default: 1.0
    pub seasonality_k: f64,
    /// Starting value for $X$, typically the modern estimate.
    /// Default: 0.38
    pub initial_x: f64,
    pub options: SolverOptions,
}

impl Default for ScenarioSolver {
    fn default() -> Self {
        Self {
            species: IsotopeSpecies::Oxygen18,
            seasonality_k: 1.0,
            initial_x: 0.38,
            options: SolverOptions::default(),
        }
    }
}

impl ScenarioSolver {
    /// Solve for $X$ given the lake, inflow and precipitation compositions (‰) and the
    /// scenario humidity and temperature (°C).
    pub fn solve(
        &self,
        delta_lake: f64,
        delta_inflow: f64,
        delta_precipitation: f64,
        humidity: f64,
        temperature: f64,
    ) -> IsolakeResult<f64> {
        let climate = ClimateState::new(humidity, temperature)?;
        let factors = FractionationFactors::from_climate(self.species, &climate)?;
        let delta_atmosphere =
            atmospheric_isotope(delta_precipitation, factors.epsilon_eq(), self.seasonality_k)?;

        // Surface singular climates before iterating
        let coefficients = mass_balance_coefficients(humidity, &factors, delta_atmosphere)?;
        guard_denominator(
            coefficients.x_denominator(delta_lake),
            "steady-state denominator A - B * delta_lake",
        )?;

        let residual = |x: &[f64]| {
            vec![
                tracer_balance_ratio(
                    humidity,
                    factors.epsilon_k(),
                    &factors,
                    delta_atmosphere,
                    delta_lake,
                    delta_inflow,
                ) - x[0],
            ]
        };
        let solution = newton::solve(residual, &[self.initial_x], &self.options)?;
        Ok(solution.root[0])
    }
}

/// Solve for the $\delta^{18}$O evaporation/inflow ratio of one climate scenario.
///
/// Uses the default [`ScenarioSolver`] (non-seasonal atmosphere, initial guess 0.38).
pub fn solve_x_for_scenario(
    delta_lake: f64,
    delta_inflow: f64,
    delta_precipitation: f64,
    humidity: f64,
    temperature: f64,
) -> IsolakeResult<f64> {
    ScenarioSolver::default().solve(
        delta_lake,
        delta_inflow,
        delta_precipitation,
        humidity,
        temperature,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IsolakeError;
    use crate::solvers::steady_state::evaluate_x;
    use approx::assert_relative_eq;

    #[test]
    fn test_current_climate_matches_closed_form() {
        let x = solve_x_for_scenario(-8.76, -16.22, -11.7, 0.62, 11.15).unwrap();
        assert_relative_eq!(x, 0.38330463016, epsilon = 1e-8);

        let climate = ClimateState::new(0.62, 11.15).unwrap();
        let factors = FractionationFactors::from_climate(IsotopeSpecies::Oxygen18, &climate).unwrap();
        let delta_a = atmospheric_isotope(-11.7, factors.epsilon_eq(), 1.0).unwrap();
        let closed_form = evaluate_x(0.62, &factors, delta_a, -8.76, -16.22).unwrap();
        assert!((x - closed_form).abs() < 1e-9);
    }

    #[test]
    fn test_glacial_climate() {
        // Humidity 0.1 lower and 6 degC colder than today
        let x = solve_x_for_scenario(-13.13, -16.22, -11.7, 0.52, 5.15).unwrap();
        assert_relative_eq!(x, 0.11820328023, epsilon = 1e-8);
    }

    #[test]
    fn test_deuterium_solver() {
        let solver = ScenarioSolver {
            species: IsotopeSpecies::Deuterium,
            ..ScenarioSolver::default()
        };
        let x = solver
            .solve(-86.4422222222222, -122.145607652468, -84.02, 0.62, 11.15)
            .unwrap();
        assert_relative_eq!(x, 0.38212434081, epsilon = 1e-8);
    }

    #[test]
    fn test_invalid_climate_rejected() {
        let result = solve_x_for_scenario(-8.76, -16.22, -11.7, 1.2, 11.15);
        assert!(matches!(result, Err(IsolakeError::InvalidInput { .. })));
        let result = solve_x_for_scenario(-8.76, -16.22, -11.7, 1.0, 11.15);
        assert!(matches!(result, Err(IsolakeError::SingularInput(_))));
    }
}

//! Trial models connecting the mass balance to the Monte Carlo engine.

use crate::engine::{trial_inputs, write_outputs, TrialModel};
use isolake_core::climate::{validate_humidity, ClimateState};
use isolake_core::craig_gordon::{atmospheric_isotope, evaporate_isotope};
use isolake_core::fractionation::FractionationFactors;
use isolake_core::parameters::{ClimatePeriods, Scenario, SiteParameters};
use isolake_core::solvers::{evaluate_x, ScenarioSolver};
use isolake_core::{IsolakeResult, IsotopeSpecies};
use serde::{Deserialize, Serialize};

/// Full steady-state balance with fractionation recomputed for each trial's climate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyStateModel {
    pub species: IsotopeSpecies,
    pub seasonality_k: f64,
    /// Total annual inflow (m³/yr), converting $X$ into an evaporated volume.
    pub total_inflow_volume: f64,
}

impl SteadyStateModel {
    pub const INPUTS: [&'static str; 5] = ["humidity", "temperature", "precipitation", "lake", "inflow"];
    pub const OUTPUTS: [&'static str; 4] = ["x", "evaporate", "atmosphere", "evaporation_volume"];

    pub fn new(site: &SiteParameters, species: IsotopeSpecies) -> Self {
        Self {
            species,
            seasonality_k: site.seasonality_k,
            total_inflow_volume: site.total_inflow_volume,
        }
    }
}

impl TrialModel for SteadyStateModel {
    fn input_names(&self) -> &[&'static str] {
        &Self::INPUTS
    }

    fn output_names(&self) -> &[&'static str] {
        &Self::OUTPUTS
    }

    fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> IsolakeResult<()> {
        let [humidity, temperature, precipitation, lake, inflow] = trial_inputs(inputs)?;
        let climate = ClimateState::new(humidity, temperature)?;
        let factors = FractionationFactors::from_climate(self.species, &climate)?;
        let atmosphere = atmospheric_isotope(precipitation, factors.epsilon_eq(), self.seasonality_k)?;
        let x = evaluate_x(humidity, &factors, atmosphere, lake, inflow)?;
        let evaporate = evaporate_isotope(humidity, &factors, atmosphere, lake)?;

        write_outputs(outputs, &[x, evaporate, atmosphere, x * self.total_inflow_volume])
    }
}

/// Steady-state balance with the fractionation factors held at a base climate.
///
/// Isolates the effect of humidity and of the precipitation composition on $X$: only the
/// humidity weighting of the atmospheric term varies between trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrozenFractionationModel {
    pub seasonality_k: f64,
    pub factors: FractionationFactors,
}

impl FrozenFractionationModel {
    pub const INPUTS: [&'static str; 4] = ["humidity", "precipitation", "lake", "inflow"];
    pub const OUTPUTS: [&'static str; 2] = ["x", "atmosphere"];

    /// Freeze the fractionation factors of `species` at the site climate.
    pub fn new(site: &SiteParameters, species: IsotopeSpecies) -> IsolakeResult<Self> {
        let factors = FractionationFactors::from_climate(species, &site.climate()?)?;
        Ok(Self {
            seasonality_k: site.seasonality_k,
            factors,
        })
    }
}

impl TrialModel for FrozenFractionationModel {
    fn input_names(&self) -> &[&'static str] {
        &Self::INPUTS
    }

    fn output_names(&self) -> &[&'static str] {
        &Self::OUTPUTS
    }

    fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> IsolakeResult<()> {
        let [humidity, precipitation, lake, inflow] = trial_inputs(inputs)?;
        let humidity = validate_humidity(humidity)?;
        let atmosphere =
            atmospheric_isotope(precipitation, self.factors.epsilon_eq(), self.seasonality_k)?;
        let x = evaluate_x(humidity, &self.factors, atmosphere, lake, inflow)?;

        write_outputs(outputs, &[x, atmosphere])
    }
}

/// $\delta^{18}$O root-find for $X$ in one climate period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimatePeriodModel {
    pub solver: ScenarioSolver,
    pub precipitation: f64,
    pub inflow: f64,
}

impl ClimatePeriodModel {
    pub const INPUTS: [&'static str; 3] = ["humidity", "temperature", "lake"];
    pub const OUTPUTS: [&'static str; 1] = ["x"];

    pub fn new(periods: &ClimatePeriods, scenario: Scenario) -> Self {
        let period = periods.period(scenario);
        Self {
            solver: ScenarioSolver {
                seasonality_k: period.seasonality_k,
                initial_x: periods.initial_x,
                ..ScenarioSolver::default()
            },
            precipitation: period.precipitation,
            inflow: period.inflow,
        }
    }
}

impl TrialModel for ClimatePeriodModel {
    fn input_names(&self) -> &[&'static str] {
        &Self::INPUTS
    }

    fn output_names(&self) -> &[&'static str] {
        &Self::OUTPUTS
    }

    fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> IsolakeResult<()> {
        let [humidity, temperature, lake] = trial_inputs(inputs)?;
        let x = self
            .solver
            .solve(lake, self.inflow, self.precipitation, humidity, temperature)?;
        write_outputs(outputs, &[x])
    }
}

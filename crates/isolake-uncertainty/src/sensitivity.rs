//! Forward-model adapter for variance-based sensitivity analysis.
//!
//! An external sampler (e.g. Saltelli sampling for Sobol indices) generates an $N \times 5$
//! matrix of parameter sets within the bounds of a [`SensitivityProblem`]. [`ForwardModel`]
//! evaluates $X$ for every row; index estimation is left to the external tool.

use isolake_core::climate::ClimateState;
use isolake_core::craig_gordon::atmospheric_isotope;
use isolake_core::fractionation::FractionationFactors;
use isolake_core::parameters::SiteParameters;
use isolake_core::solvers::evaluate_x;
use isolake_core::{IsolakeError, IsolakeResult, IsotopeSpecies};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameter order of the forward model.
pub const PARAMETER_NAMES: [&str; 5] = ["humidity", "temperature", "precipitation", "lake", "inflow"];

/// Stateless map from `[humidity, temperature, precipitation, lake, inflow]` to $X$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardModel {
    pub species: IsotopeSpecies,
    pub seasonality_k: f64,
}

impl ForwardModel {
    pub fn new(species: IsotopeSpecies, seasonality_k: f64) -> Self {
        Self {
            species,
            seasonality_k,
        }
    }

    /// Evaluate $X$ for one parameter set, recomputing the fractionation, kinetic and
    /// atmospheric terms.
    pub fn evaluate(&self, params: &[f64]) -> IsolakeResult<f64> {
        let &[humidity, temperature, precipitation, lake, inflow] = params else {
            return Err(IsolakeError::SamplingError(format!(
                "Expected {} parameters, got {}",
                PARAMETER_NAMES.len(),
                params.len()
            )));
        };
        let climate = ClimateState::new(humidity, temperature)?;
        let factors = FractionationFactors::from_climate(self.species, &climate)?;
        let atmosphere = atmospheric_isotope(precipitation, factors.epsilon_eq(), self.seasonality_k)?;
        evaluate_x(humidity, &factors, atmosphere, lake, inflow)
    }

    /// Evaluate every row of an $N \times 5$ sample matrix in parallel.
    ///
    /// Rows outside the model domain give NaN.
    pub fn evaluate_batch(&self, samples: &Array2<f64>) -> IsolakeResult<Array1<f64>> {
        if samples.ncols() != PARAMETER_NAMES.len() {
            return Err(IsolakeError::SamplingError(format!(
                "Sample matrix has {} columns, expected {}",
                samples.ncols(),
                PARAMETER_NAMES.len()
            )));
        }
        let values = (0..samples.nrows())
            .into_par_iter()
            .map(|i| match self.evaluate(&samples.row(i).to_vec()) {
                Ok(x) => Ok(x),
                Err(e) if e.is_trial_recoverable() => Ok(f64::NAN),
                Err(e) => Err(e),
            })
            .collect::<IsolakeResult<Vec<f64>>>()?;
        Ok(Array1::from(values))
    }
}

/// Parameter names and bounds handed to the external sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityProblem {
    pub names: Vec<String>,
    /// `(low, high)` per parameter.
    pub bounds: Vec<(f64, f64)>,
}

impl SensitivityProblem {
    /// Bounds of ± the measurement uncertainty about each site observation.
    pub fn from_site(site: &SiteParameters, species: IsotopeSpecies) -> Self {
        let obs = site.observations(species);
        let around = |value: f64, half_width: f64| (value - half_width, value + half_width);
        Self {
            names: PARAMETER_NAMES.iter().map(|s| s.to_string()).collect(),
            bounds: vec![
                around(site.humidity, site.humidity_uncertainty),
                around(site.temperature, site.temperature_uncertainty),
                around(obs.precipitation, obs.precipitation_uncertainty),
                around(obs.lake, obs.lake_uncertainty),
                around(obs.inflow, obs.inflow_uncertainty),
            ],
        }
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    /// Map unit-hypercube samples (e.g. from a Sobol sequence) onto the bounds.
    pub fn scale_unit_samples(&self, unit: &Array2<f64>) -> IsolakeResult<Array2<f64>> {
        if unit.ncols() != self.num_vars() {
            return Err(IsolakeError::SamplingError(format!(
                "Unit sample matrix has {} columns, expected {}",
                unit.ncols(),
                self.num_vars()
            )));
        }
        let mut scaled = unit.clone();
        for (mut column, &(low, high)) in scaled.columns_mut().into_iter().zip(&self.bounds) {
            column.mapv_inplace(|u| low + u * (high - low));
        }
        Ok(scaled)
    }
}

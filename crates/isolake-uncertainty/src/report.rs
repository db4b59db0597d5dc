//! Run summaries for printing and serialisation.

use crate::engine::TrialBatch;
use crate::statistics::{linear_fit, summarize, LinearTrend, OutputSummary};
use isolake_core::craig_gordon::{atmospheric_isotope, evaporate_isotope};
use isolake_core::fractionation::FractionationFactors;
use isolake_core::parameters::SiteParameters;
use isolake_core::solvers::solve_steady_state;
use isolake_core::{IsolakeError, IsolakeResult, IsotopeSpecies};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of every output of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub label: String,
    #[serde(rename = "isotope_species")]
    pub species: IsotopeSpecies,
    pub n_trials: usize,
    pub n_failed: usize,
    pub outputs: Vec<OutputSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<LinearTrend>,
}

impl RunReport {
    pub fn from_batch(label: impl Into<String>, species: IsotopeSpecies, batch: &TrialBatch) -> Self {
        let outputs = batch
            .output_names
            .iter()
            .zip(batch.outputs.columns())
            .map(|(name, column)| summarize(name, column.iter().copied()))
            .collect();
        Self {
            label: label.into(),
            species,
            n_trials: batch.n_trials(),
            n_failed: batch.n_failed,
            outputs,
            trend: None,
        }
    }

    /// Attach the least-squares line of `output` against `input` over the trials of `batch`.
    ///
    /// The trend is left empty when the input does not vary.
    pub fn with_trend(mut self, batch: &TrialBatch, input: &str, output: &str) -> IsolakeResult<Self> {
        let missing = |name: &str| {
            IsolakeError::SamplingError(format!("Run '{}' has no variable '{}'", self.label, name))
        };
        let xs = batch.input(input).ok_or_else(|| missing(input))?;
        let ys = batch.output(output).ok_or_else(|| missing(output))?;
        let trend = linear_fit(xs.iter().copied().zip(ys.iter().copied())).map(
            |(slope, intercept, sample_count)| LinearTrend {
                input: input.to_string(),
                output: output.to_string(),
                slope,
                intercept,
                sample_count,
            },
        );
        self.trend = trend;
        Ok(self)
    }

    pub fn output(&self, variable: &str) -> Option<&OutputSummary> {
        self.outputs.iter().find(|o| o.variable == variable)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): {} trials, {} failed",
            self.label, self.species, self.n_trials, self.n_failed
        )?;
        writeln!(
            f,
            "{:<20} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
            "variable", "mean", "median", "stdev", "p15.9", "p84.1", "min", "max"
        )?;
        for o in &self.outputs {
            writeln!(
                f,
                "{:<20} {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
                o.variable, o.mean, o.median, o.std_dev, o.p15_9, o.p84_1, o.min, o.max
            )?;
        }
        if let Some(trend) = &self.trend {
            writeln!(
                f,
                "{} vs {}: slope {:.6}, intercept {:.6}",
                trend.output, trend.input, trend.slope, trend.intercept
            )?;
        }
        Ok(())
    }
}

/// Deterministic steady-state balance of one species at the site values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyStateReport {
    #[serde(rename = "isotope_species")]
    pub species: IsotopeSpecies,
    pub humidity: f64,
    pub temperature: f64,
    pub seasonality_k: f64,
    pub precipitation: f64,
    pub lake: f64,
    pub inflow: f64,
    pub alpha: f64,
    pub epsilon_eq: f64,
    pub epsilon_k: f64,
    pub atmosphere: f64,
    pub evaporate: f64,
    pub x: f64,
    pub evaporation_volume: f64,
    /// Theoretical maximum lake enrichment, when defined.
    pub max_enrichment: Option<f64>,
}

impl SteadyStateReport {
    pub fn compute(site: &SiteParameters, species: IsotopeSpecies) -> IsolakeResult<Self> {
        let climate = site.climate()?;
        let isotopes = site.isotope_set(species);
        let factors = FractionationFactors::from_climate(species, &climate)?;
        let atmosphere =
            atmospheric_isotope(isotopes.precipitation, factors.epsilon_eq(), isotopes.seasonality_k)?;
        let evaporate = evaporate_isotope(climate.humidity(), &factors, atmosphere, isotopes.lake)?;
        let solution = solve_steady_state(
            climate.humidity(),
            &factors,
            atmosphere,
            isotopes.lake,
            isotopes.inflow,
        )?;

        Ok(Self {
            species,
            humidity: climate.humidity(),
            temperature: climate.temperature(),
            seasonality_k: isotopes.seasonality_k,
            precipitation: isotopes.precipitation,
            lake: isotopes.lake,
            inflow: isotopes.inflow,
            alpha: factors.alpha(),
            epsilon_eq: factors.epsilon_eq(),
            epsilon_k: factors.epsilon_k(),
            atmosphere,
            evaporate,
            x: solution.x,
            evaporation_volume: solution.x * site.total_inflow_volume,
            max_enrichment: solution.coefficients.limit(),
        })
    }
}

impl fmt::Display for SteadyStateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Steady-state balance ({})", self.species)?;
        let rows = [
            ("humidity", self.humidity),
            ("temperature", self.temperature),
            ("seasonality k", self.seasonality_k),
            ("precipitation", self.precipitation),
            ("lake", self.lake),
            ("inflow", self.inflow),
            ("alpha", self.alpha),
            ("epsilon eq", self.epsilon_eq),
            ("epsilon k", self.epsilon_k),
            ("atmosphere", self.atmosphere),
            ("evaporate", self.evaporate),
            ("X = E/I", self.x),
            ("evaporation volume", self.evaporation_volume),
        ];
        for (name, value) in rows {
            writeln!(f, "{:<20} {:>16.6}", name, value)?;
        }
        match self.max_enrichment {
            Some(limit) => writeln!(f, "{:<20} {:>16.6}", "max enrichment", limit),
            None => writeln!(f, "{:<20} {:>16}", "max enrichment", "undefined"),
        }
    }
}

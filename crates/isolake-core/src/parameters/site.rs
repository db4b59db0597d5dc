//! Site Parameters
//!
//! Climate and isotope observations of one lake, with the measurement uncertainty of each.
//!
//! # Reference
//!
//! Defaults are the Bear Lake (Utah/Idaho) values of Custado et al. (2024): the
//! evaporation-flux weighted climate over the lake and the annual mean compositions of
//! precipitation, lake water and total inflow.

use super::parse_toml;
use crate::climate::{ClimateState, IsotopeSet};
use crate::errors::IsolakeResult;
use crate::species::{IsotopeSpecies, SpeciesPair};
use serde::{Deserialize, Serialize};

/// Isotope observations of one species with their uncertainties.
///
/// Uncertainties are half-widths of a uniform distribution about the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesObservations {
    /// Evaporation-flux weighted precipitation
    /// unit: ‰
    pub precipitation: f64,
    /// Lake water, assumed at steady state
    /// unit: ‰
    pub lake: f64,
    /// Total inflow
    /// unit: ‰
    pub inflow: f64,
    /// unit: ‰
    pub precipitation_uncertainty: f64,
    /// unit: ‰
    pub lake_uncertainty: f64,
    /// unit: ‰
    pub inflow_uncertainty: f64,
}

/// Observations of one lake used by the deterministic and Monte Carlo runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteParameters {
    /// Relative humidity as a fraction
    /// unit: dimensionless
    /// default: 0.62
    pub humidity: f64,

    /// Air temperature
    /// unit: °C
    /// default: 11.15
    pub temperature: f64,

    /// Seasonality factor $k$ of the atmospheric composition
    /// unit: dimensionless
    /// default: 1.0 (non-seasonal)
    pub seasonality_k: f64,

    /// Half-width of the humidity uncertainty (5 % of the default humidity)
    /// unit: dimensionless
    /// default: 0.031
    pub humidity_uncertainty: f64,

    /// Half-width of the temperature uncertainty
    /// unit: °C
    /// default: 0.2
    pub temperature_uncertainty: f64,

    /// Total annual inflow, converting $X$ into an evaporated volume
    /// unit: m³/yr
    /// default: 570772551.507645
    pub total_inflow_volume: f64,

    /// Per-species observations.
    /// Precipitation uncertainty defaults to 0.3 % ($\delta^{18}$O) and 1 % ($\delta$D) of
    /// the precipitation value.
    pub observations: SpeciesPair<SpeciesObservations>,
}

impl Default for SiteParameters {
    fn default() -> Self {
        Self {
            humidity: 0.62,
            temperature: 11.15,
            seasonality_k: 1.0,
            humidity_uncertainty: 0.62 * 0.05,
            temperature_uncertainty: 0.2,
            total_inflow_volume: 570772551.507645,
            observations: SpeciesPair::new(
                SpeciesObservations {
                    precipitation: -11.70,
                    lake: -8.75978345841666,
                    inflow: -16.2152393388515,
                    precipitation_uncertainty: 11.70 * 0.003,
                    lake_uncertainty: 0.1,
                    inflow_uncertainty: 0.0454711273463026,
                },
                SpeciesObservations {
                    precipitation: -84.02,
                    lake: -86.4422222222222,
                    inflow: -122.145607652468,
                    precipitation_uncertainty: 84.02 * 0.01,
                    lake_uncertainty: 0.5,
                    inflow_uncertainty: 0.338982073484539,
                },
            ),
        }
    }
}

impl SiteParameters {
    /// Parse site parameters from TOML. Missing keys take the default values.
    pub fn from_toml_str(source: &str) -> IsolakeResult<Self> {
        parse_toml(source, "site parameters")
    }

    /// Validated climate of the site.
    pub fn climate(&self) -> IsolakeResult<ClimateState> {
        ClimateState::new(self.humidity, self.temperature)
    }

    pub fn observations(&self, species: IsotopeSpecies) -> &SpeciesObservations {
        self.observations.get(species)
    }

    /// Isotope values of one species in the form taken by the deterministic solve.
    pub fn isotope_set(&self, species: IsotopeSpecies) -> IsotopeSet {
        let obs = self.observations(species);
        IsotopeSet {
            seasonality_k: self.seasonality_k,
            precipitation: obs.precipitation,
            lake: obs.lake,
            inflow: obs.inflow,
        }
    }
}

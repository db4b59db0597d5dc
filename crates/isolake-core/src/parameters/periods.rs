//! Climate Period Parameters
//!
//! Lake and inflow compositions and climate offsets for the past, present and projected
//! climate states of the lake.
//!
//! Each period perturbs the modern climate by a humidity decrease and a temperature increase
//! and supplies the lake composition reconstructed (or projected) for that period. The
//! evaporation/inflow ratio of each period is then found with
//! [`crate::solvers::solve_x_for_scenario`].

use super::parse_toml;
use crate::errors::IsolakeResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A climate state of the lake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Last Interglacial Period
    Lig,
    /// Present day
    Current,
    /// Projected warmer and drier climate
    Future,
    /// Last Glacial Period
    Glacial,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Lig,
        Scenario::Current,
        Scenario::Future,
        Scenario::Glacial,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Lig => "LIG",
            Scenario::Current => "Current",
            Scenario::Future => "Future",
            Scenario::Glacial => "Glacial",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// $\delta^{18}$O values and climate offsets of one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimatePeriod {
    /// unit: dimensionless
    pub seasonality_k: f64,
    /// unit: ‰
    pub precipitation: f64,
    /// Lake composition of the period
    /// unit: ‰
    pub lake: f64,
    /// Total inflow composition of the period
    /// unit: ‰
    pub inflow: f64,
    /// Decrease of relative humidity relative to today
    /// unit: dimensionless
    pub humidity_decrease: f64,
    /// Temperature change relative to today
    /// unit: °C
    pub temperature_increase: f64,
    /// Half-width of the uniform uncertainty on `lake`
    /// unit: ‰
    pub lake_uncertainty: f64,
}

impl ClimatePeriod {
    const fn new(
        lake: f64,
        inflow: f64,
        humidity_decrease: f64,
        temperature_increase: f64,
        lake_uncertainty: f64,
    ) -> Self {
        Self {
            seasonality_k: 1.0,
            precipitation: -11.7,
            lake,
            inflow,
            humidity_decrease,
            temperature_increase,
            lake_uncertainty,
        }
    }
}

/// The full set of climate periods with their shared perturbation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimatePeriods {
    /// Modern relative humidity the offsets apply to
    /// unit: dimensionless
    /// default: 0.62
    pub base_humidity: f64,

    /// Modern temperature the offsets apply to
    /// unit: °C
    /// default: 11.15
    pub base_temperature: f64,

    /// Standard deviation of the normal humidity perturbation
    /// unit: dimensionless
    /// default: 0.03
    pub humidity_uncertainty: f64,

    /// Standard deviation of the normal temperature perturbation
    /// unit: °C
    /// default: 0.3
    pub temperature_uncertainty: f64,

    /// Starting value of the $X$ root-find
    /// default: 0.38
    pub initial_x: f64,

    pub lig: ClimatePeriod,
    pub current: ClimatePeriod,
    pub future: ClimatePeriod,
    pub glacial: ClimatePeriod,
}

impl Default for ClimatePeriods {
    fn default() -> Self {
        Self {
            base_humidity: 0.62,
            base_temperature: 11.15,
            humidity_uncertainty: 0.03,
            temperature_uncertainty: 0.3,
            initial_x: 0.38,
            lig: ClimatePeriod::new(-7.21, -15.77, 0.1, 1.0, 2.0),
            current: ClimatePeriod::new(-8.76, -16.22, 0.0, 0.0, 1.0),
            future: ClimatePeriod::new(-8.76, -16.22, 0.1, 1.0, 1.0),
            glacial: ClimatePeriod::new(-13.13, -16.22, 0.1, -6.0, 0.9),
        }
    }
}

impl ClimatePeriods {
    /// Parse climate periods from TOML. Missing keys take the default values.
    pub fn from_toml_str(source: &str) -> IsolakeResult<Self> {
        parse_toml(source, "climate periods")
    }

    pub fn period(&self, scenario: Scenario) -> &ClimatePeriod {
        match scenario {
            Scenario::Lig => &self.lig,
            Scenario::Current => &self.current,
            Scenario::Future => &self.future,
            Scenario::Glacial => &self.glacial,
        }
    }

    /// Central humidity of a period.
    pub fn humidity(&self, scenario: Scenario) -> f64 {
        self.base_humidity - self.period(scenario).humidity_decrease
    }

    /// Central temperature of a period (°C).
    pub fn temperature(&self, scenario: Scenario) -> f64 {
        self.base_temperature + self.period(scenario).temperature_increase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::solve_x_for_scenario;
    use is_close::is_close;

    #[test]
    fn test_period_climates() {
        let periods = ClimatePeriods::default();
        assert!(is_close!(periods.humidity(Scenario::Glacial), 0.52));
        assert!(is_close!(periods.temperature(Scenario::Glacial), 5.15));
        assert!(is_close!(periods.humidity(Scenario::Current), 0.62));
        assert!(is_close!(periods.temperature(Scenario::Future), 12.15));
    }

    #[test]
    fn test_period_ratios_ordered() {
        let periods = ClimatePeriods::default();
        let x = |scenario| {
            let p = periods.period(scenario);
            solve_x_for_scenario(
                p.lake,
                p.inflow,
                p.precipitation,
                periods.humidity(scenario),
                periods.temperature(scenario),
            )
            .unwrap()
        };
        let lig = x(Scenario::Lig);
        let current = x(Scenario::Current);
        let future = x(Scenario::Future);
        let glacial = x(Scenario::Glacial);

        assert!((lig - 0.4426).abs() < 1e-3);
        assert!((current - 0.3833).abs() < 1e-3);
        assert!((future - 0.3563).abs() < 1e-3);
        assert!((glacial - 0.1182).abs() < 1e-3);
        assert!(lig > current && current > future && future > glacial);
    }

    #[test]
    fn test_scenario_serde_names() {
        let parsed: Scenario = serde_json::from_str("\"glacial\"").unwrap();
        assert_eq!(parsed, Scenario::Glacial);
        assert_eq!(Scenario::Lig.to_string(), "LIG");
    }

    #[test]
    fn test_toml_override_one_period() {
        let periods = ClimatePeriods::from_toml_str(
            r#"
            humidity_uncertainty = 0.05

            [glacial]
            seasonality_k = 0.8
            precipitation = -13.0
            lake = -14.0
            inflow = -17.0
            humidity_decrease = 0.15
            temperature_increase = -8.0
            lake_uncertainty = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(periods.humidity_uncertainty, 0.05);
        assert_eq!(periods.glacial.seasonality_k, 0.8);
        assert_eq!(periods.lig, ClimatePeriods::default().lig);
    }

    #[test]
    fn test_single_period_key_keeps_defaults() {
        let periods = ClimatePeriods::from_toml_str("[glacial]\nlake = -14.0").unwrap();
        let defaults = ClimatePeriods::default();
        assert_eq!(periods.glacial.lake, -14.0);
        assert_eq!(periods.glacial.seasonality_k, defaults.glacial.seasonality_k);
        assert_eq!(periods.glacial.humidity_decrease, defaults.glacial.humidity_decrease);
        assert_eq!(periods.current, defaults.current);
    }
}

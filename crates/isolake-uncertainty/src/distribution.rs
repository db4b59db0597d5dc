//! Input distributions and the uncertainty scenarios built from them.
//!
//! Each Monte Carlo input is described by a named [`Distribution`]. An
//! [`UncertaintyScenario`] collects the specifications for one run; the pre-built scenarios
//! reproduce the measurement, climate-period and sweep experiments of the Bear Lake study.

use isolake_core::parameters::{ClimatePeriods, Scenario, SiteParameters};
use isolake_core::{IsolakeError, IsolakeResult, IsotopeSpecies};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Lower bound of the humidity sweep.
pub const HUMIDITY_SWEEP_LOW: f64 = 0.5;
/// Upper (exclusive) bound of the humidity sweep.
pub const HUMIDITY_SWEEP_HIGH: f64 = 1.0;
/// Relative half-width of the precipitation sweep.
pub const PRECIPITATION_SWEEP_FRACTION: f64 = 0.2;

/// Probability distribution of one model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    Normal { mean: f64, std_dev: f64 },
    /// Half-open interval $[low, high)$.
    Uniform { low: f64, high: f64 },
}

impl Distribution {
    pub fn normal(mean: f64, std_dev: f64) -> IsolakeResult<Self> {
        let distribution = Distribution::Normal { mean, std_dev };
        distribution.validate()?;
        Ok(distribution)
    }

    pub fn uniform(low: f64, high: f64) -> IsolakeResult<Self> {
        let distribution = Distribution::Uniform { low, high };
        distribution.validate()?;
        Ok(distribution)
    }

    /// Uniform distribution of the given half-width about `center`.
    pub fn centered_uniform(center: f64, half_width: f64) -> IsolakeResult<Self> {
        Self::uniform(center - half_width, center + half_width)
    }

    /// A distribution that always returns `value`.
    pub fn fixed(value: f64) -> IsolakeResult<Self> {
        Self::uniform(value, value)
    }

    /// Check the parameters, e.g. after deserialisation.
    pub fn validate(&self) -> IsolakeResult<()> {
        match *self {
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(IsolakeError::SamplingError(format!(
                        "Normal distribution requires finite mean and std_dev >= 0, got mean={}, std_dev={}",
                        mean, std_dev
                    )));
                }
            }
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(IsolakeError::SamplingError(format!(
                        "Uniform distribution requires finite low <= high, got [{}, {})",
                        low, high
                    )));
                }
            }
        }
        Ok(())
    }

    /// Central value: the mean, or the midpoint of the uniform interval.
    pub fn location(&self) -> f64 {
        match *self {
            Distribution::Normal { mean, .. } => mean,
            Distribution::Uniform { low, high } if low == high => low,
            Distribution::Uniform { low, high } => 0.5 * (low + high),
        }
    }

    /// Whether every draw returns the same value.
    pub fn is_degenerate(&self) -> bool {
        match *self {
            Distribution::Normal { std_dev, .. } => std_dev == 0.0,
            Distribution::Uniform { low, high } => low == high,
        }
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.is_degenerate() {
            return self.location();
        }
        match *self {
            Distribution::Normal { mean, std_dev } => {
                let z: f64 = rng.sample(StandardNormal);
                mean + std_dev * z
            }
            Distribution::Uniform { low, high } => rng.gen_range(low..high),
        }
    }
}

/// A named model input and its distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintySpec {
    pub name: String,
    pub distribution: Distribution,
}

/// Ordered, uniquely named input distributions for one Monte Carlo run.
///
/// Deserialisation goes through [`UncertaintyScenario::push`], so invalid distributions and
/// duplicate names are rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioRecord")]
pub struct UncertaintyScenario {
    pub label: String,
    specs: Vec<UncertaintySpec>,
}

/// Unchecked serialised form of [`UncertaintyScenario`].
#[derive(Deserialize)]
struct ScenarioRecord {
    label: String,
    #[serde(default)]
    specs: Vec<UncertaintySpec>,
}

impl TryFrom<ScenarioRecord> for UncertaintyScenario {
    type Error = IsolakeError;

    fn try_from(record: ScenarioRecord) -> IsolakeResult<Self> {
        let mut scenario = Self::new(record.label);
        for spec in record.specs {
            scenario.push(spec.name, spec.distribution)?;
        }
        Ok(scenario)
    }
}

impl UncertaintyScenario {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            specs: Vec::new(),
        }
    }

    /// Add an input, rejecting names that are already present.
    pub fn push(&mut self, name: impl Into<String>, distribution: Distribution) -> IsolakeResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(IsolakeError::SamplingError(format!(
                "Duplicate uncertainty specification '{}' in scenario '{}'",
                name, self.label
            )));
        }
        distribution.validate()?;
        self.specs.push(UncertaintySpec { name, distribution });
        Ok(())
    }

    /// Builder form of [`UncertaintyScenario::push`].
    pub fn with(mut self, name: impl Into<String>, distribution: Distribution) -> IsolakeResult<Self> {
        self.push(name, distribution)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Distribution> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| &spec.distribution)
    }

    pub fn specs(&self) -> &[UncertaintySpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Measurement uncertainty of the site observations, all uniform.
    ///
    /// Inputs: humidity, temperature, precipitation, lake, inflow.
    pub fn measurement(site: &SiteParameters, species: IsotopeSpecies) -> IsolakeResult<Self> {
        let obs = site.observations(species);
        Self::new(format!("measurement {}", species))
            .with(
                "humidity",
                Distribution::centered_uniform(site.humidity, site.humidity_uncertainty)?,
            )?
            .with(
                "temperature",
                Distribution::centered_uniform(site.temperature, site.temperature_uncertainty)?,
            )?
            .with(
                "precipitation",
                Distribution::centered_uniform(obs.precipitation, obs.precipitation_uncertainty)?,
            )?
            .with(
                "lake",
                Distribution::centered_uniform(obs.lake, obs.lake_uncertainty)?,
            )?
            .with(
                "inflow",
                Distribution::centered_uniform(obs.inflow, obs.inflow_uncertainty)?,
            )
    }

    /// Climate perturbation of one period: normal humidity and temperature about the period
    /// climate, uniform lake composition.
    ///
    /// Inputs: humidity, temperature, lake.
    pub fn climate_period(periods: &ClimatePeriods, scenario: Scenario) -> IsolakeResult<Self> {
        let period = periods.period(scenario);
        Self::new(format!("climate {}", scenario))
            .with(
                "humidity",
                Distribution::normal(periods.humidity(scenario), periods.humidity_uncertainty)?,
            )?
            .with(
                "temperature",
                Distribution::normal(
                    periods.temperature(scenario),
                    periods.temperature_uncertainty,
                )?,
            )?
            .with(
                "lake",
                Distribution::centered_uniform(period.lake, period.lake_uncertainty)?,
            )
    }

    /// Humidity swept uniformly over $[0.5, 1)$ with the isotope values held at the site
    /// observations.
    ///
    /// Inputs: humidity, precipitation, lake, inflow.
    pub fn humidity_sweep(site: &SiteParameters, species: IsotopeSpecies) -> IsolakeResult<Self> {
        let obs = site.observations(species);
        Self::new(format!("humidity sweep {}", species))
            .with(
                "humidity",
                Distribution::uniform(HUMIDITY_SWEEP_LOW, HUMIDITY_SWEEP_HIGH)?,
            )?
            .with("precipitation", Distribution::fixed(obs.precipitation)?)?
            .with("lake", Distribution::fixed(obs.lake)?)?
            .with("inflow", Distribution::fixed(obs.inflow)?)
    }

    /// Precipitation composition swept uniformly over ±20 % of the observed value with the
    /// humidity held at the site value.
    ///
    /// Inputs: humidity, precipitation, lake, inflow.
    pub fn precipitation_sweep(
        site: &SiteParameters,
        species: IsotopeSpecies,
    ) -> IsolakeResult<Self> {
        let obs = site.observations(species);
        let a = obs.precipitation * (1.0 - PRECIPITATION_SWEEP_FRACTION);
        let b = obs.precipitation * (1.0 + PRECIPITATION_SWEEP_FRACTION);
        Self::new(format!("precipitation sweep {}", species))
            .with("humidity", Distribution::fixed(site.humidity)?)?
            .with("precipitation", Distribution::uniform(a.min(b), a.max(b))?)?
            .with("lake", Distribution::fixed(obs.lake)?)?
            .with("inflow", Distribution::fixed(obs.inflow)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_degenerate_distributions_return_location() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let normal = Distribution::normal(-8.75978345841666, 0.0).unwrap();
        let uniform = Distribution::fixed(0.62).unwrap();
        for _ in 0..100 {
            assert_eq!(normal.sample(&mut rng), -8.75978345841666);
            assert_eq!(uniform.sample(&mut rng), 0.62);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Distribution::normal(0.0, -1.0),
            Err(IsolakeError::SamplingError(_))
        ));
        assert!(Distribution::normal(f64::NAN, 1.0).is_err());
        assert!(Distribution::uniform(1.0, 0.0).is_err());
        assert!(Distribution::centered_uniform(0.0, -0.1).is_err());
        let deserialized: Distribution =
            serde_json::from_str(r#"{"kind": "uniform", "low": 2.0, "high": 1.0}"#).unwrap();
        assert!(deserialized.validate().is_err());
    }

    #[test]
    fn test_uniform_stays_in_half_open_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dist = Distribution::uniform(0.5, 1.0).unwrap();
        for _ in 0..10_000 {
            let v = dist.sample(&mut rng);
            assert!((0.5..1.0).contains(&v));
        }
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist = Distribution::normal(0.52, 0.03).unwrap();
        let samples: Vec<f64> = (0..20_000).map(|_| dist.sample(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert_relative_eq!(mean, 0.52, epsilon = 2e-3);
        assert_relative_eq!(var.sqrt(), 0.03, epsilon = 2e-3);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let scenario = UncertaintyScenario::new("test")
            .with("humidity", Distribution::fixed(0.6).unwrap())
            .unwrap();
        let result = scenario.with("humidity", Distribution::fixed(0.7).unwrap());
        assert!(matches!(result, Err(IsolakeError::SamplingError(_))));
    }

    #[test]
    fn test_deserialised_scenario_is_validated() {
        let inverted = r#"{
            "label": "inverted",
            "specs": [{"name": "humidity", "distribution": {"kind": "uniform", "low": 0.65, "high": 0.60}}]
        }"#;
        let err = serde_json::from_str::<UncertaintyScenario>(inverted).unwrap_err();
        assert!(err.to_string().contains("Uniform distribution requires"));

        let duplicate = r#"{
            "label": "duplicate",
            "specs": [
                {"name": "inflow", "distribution": {"kind": "normal", "mean": -16.2, "std_dev": 0.1}},
                {"name": "inflow", "distribution": {"kind": "normal", "mean": -16.0, "std_dev": 0.1}}
            ]
        }"#;
        let err = serde_json::from_str::<UncertaintyScenario>(duplicate).unwrap_err();
        assert!(err.to_string().contains("Duplicate uncertainty specification 'inflow'"));

        let site = SiteParameters::default();
        let scenario = UncertaintyScenario::measurement(&site, IsotopeSpecies::Deuterium).unwrap();
        let json = serde_json::to_string(&scenario).unwrap();
        let parsed: UncertaintyScenario = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.label, scenario.label);
        assert_eq!(parsed.len(), scenario.len());
        assert!(parsed.get("lake").is_some());
    }

    #[test]
    fn test_measurement_scenario() {
        let site = SiteParameters::default();
        let scenario = UncertaintyScenario::measurement(&site, IsotopeSpecies::Oxygen18).unwrap();
        let names: Vec<&str> = scenario.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["humidity", "temperature", "precipitation", "lake", "inflow"]);
        match scenario.get("humidity") {
            Some(Distribution::Uniform { low, high }) => {
                assert_relative_eq!(*low, 0.589, epsilon = 1e-12);
                assert_relative_eq!(*high, 0.651, epsilon = 1e-12);
            }
            other => panic!("Unexpected humidity distribution {:?}", other),
        }
    }

    #[test]
    fn test_climate_period_scenario() {
        let periods = ClimatePeriods::default();
        let scenario = UncertaintyScenario::climate_period(&periods, Scenario::Glacial).unwrap();
        assert_eq!(scenario.label, "climate Glacial");
        match scenario.get("temperature") {
            Some(Distribution::Normal { mean, std_dev }) => {
                assert_relative_eq!(*mean, 5.15, epsilon = 1e-12);
                assert_eq!(*std_dev, 0.3);
            }
            other => panic!("Unexpected temperature distribution {:?}", other),
        }
        assert!(scenario.get("inflow").is_none());
    }

    #[test]
    fn test_precipitation_sweep_bounds_ordered() {
        let site = SiteParameters::default();
        let scenario =
            UncertaintyScenario::precipitation_sweep(&site, IsotopeSpecies::Oxygen18).unwrap();
        match scenario.get("precipitation") {
            Some(Distribution::Uniform { low, high }) => {
                assert_relative_eq!(*low, -14.04, epsilon = 1e-12);
                assert_relative_eq!(*high, -9.36, epsilon = 1e-12);
            }
            other => panic!("Unexpected precipitation distribution {:?}", other),
        }
        assert!(scenario.get("humidity").unwrap().is_degenerate());
    }
}

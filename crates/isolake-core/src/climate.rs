//! Climate and isotope observations that drive the model.

use crate::errors::{IsolakeError, IsolakeResult};
use serde::{Deserialize, Serialize};

/// Absolute zero in degrees Celsius.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

/// Check that a relative humidity lies in $[0, 1]$.
pub fn validate_humidity(humidity: f64) -> IsolakeResult<f64> {
    if !humidity.is_finite() || !(0.0..=1.0).contains(&humidity) {
        return Err(IsolakeError::invalid_input(
            "humidity",
            humidity,
            "must lie in [0, 1]",
        ));
    }
    Ok(humidity)
}

/// Check that a temperature (°C) lies above absolute zero.
pub fn validate_temperature(temperature: f64) -> IsolakeResult<f64> {
    if !temperature.is_finite() || temperature <= ABSOLUTE_ZERO_CELSIUS {
        return Err(IsolakeError::invalid_input(
            "temperature",
            temperature,
            "must be finite and above absolute zero",
        ));
    }
    Ok(temperature)
}

/// Evaporation-flux weighted climate over the lake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    humidity: f64,
    temperature: f64,
}

impl ClimateState {
    /// Create a climate state.
    ///
    /// # Arguments
    ///
    /// * `humidity` - Relative humidity as a fraction, in $[0, 1]$
    /// * `temperature` - Air temperature (°C)
    pub fn new(humidity: f64, temperature: f64) -> IsolakeResult<Self> {
        Ok(Self {
            humidity: validate_humidity(humidity)?,
            temperature: validate_temperature(temperature)?,
        })
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Temperature in kelvin.
    pub fn temperature_kelvin(&self) -> f64 {
        self.temperature - ABSOLUTE_ZERO_CELSIUS
    }
}

/// Isotope values (‰) for one species at one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsotopeSet {
    /// Seasonality factor $k$: 0.5 (highly seasonal) to 1.0 (non-seasonal).
    pub seasonality_k: f64,
    /// Evaporation-flux weighted precipitation.
    pub precipitation: f64,
    /// Lake water, assumed at steady state.
    pub lake: f64,
    /// Total inflow.
    pub inflow: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_state_bounds() {
        assert!(ClimateState::new(0.0, 10.0).is_ok());
        assert!(ClimateState::new(1.0, 10.0).is_ok());
        assert!(ClimateState::new(-0.01, 10.0).is_err());
        assert!(ClimateState::new(1.01, 10.0).is_err());
        assert!(ClimateState::new(f64::NAN, 10.0).is_err());
        assert!(ClimateState::new(0.5, -273.15).is_err());
        assert!(ClimateState::new(0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn test_kelvin() {
        let climate = ClimateState::new(0.62, 11.15).unwrap();
        assert!((climate.temperature_kelvin() - 284.3).abs() < 1e-12);
    }
}

//! Craig-Gordon evaporation model
//!
//! Isotopic composition of atmospheric moisture, of the evaporating flux, and the two
//! auxiliary coefficients of the steady-state lake balance (Gonfiantini, 1986; Gibson et
//! al., 2015).
//!
//! # Physics Overview
//!
//! Atmospheric moisture upwind of the lake is assumed to be in equilibrium with
//! evaporation-flux weighted precipitation, scaled by the seasonality factor $k$:
//!
//! $$\delta_A = \frac{\delta_P - k \varepsilon_{eq}}{1 + 10^{-3} k \varepsilon_{eq}}$$
//!
//! The evaporate follows the linearised Craig-Gordon relation
//!
//! $$\delta_E = \frac{(\delta_L - \varepsilon_{eq})/\alpha - h \delta_A - \varepsilon_k}{1 - h + 10^{-3} \varepsilon_k}$$
//!
//! and the steady-state balance is written in terms of
//!
//! $$A = \frac{h \delta_A + \varepsilon_k + \varepsilon_{eq}/\alpha}{1 - h + 10^{-3} \varepsilon_k}, \qquad
//!   B = \frac{h - 10^{-3}(\varepsilon_k + \varepsilon_{eq}/\alpha)}{1 - h + 10^{-3} \varepsilon_k}$$
//!
//! The shared denominator vanishes as $h \to 1$, which is reported as
//! [`IsolakeError::SingularInput`] rather than propagated as infinities.

use crate::errors::{IsolakeError, IsolakeResult};
use crate::fractionation::FractionationFactors;
use log::warn;
use serde::{Deserialize, Serialize};

/// Magnitude below which a denominator is treated as zero.
pub const SINGULARITY_TOLERANCE: f64 = 1e-9;

/// Seasonality regime bounds: fully seasonal to non-seasonal evaporation.
pub const SEASONALITY_RANGE: (f64, f64) = (0.5, 1.0);

pub(crate) fn guard_denominator(value: f64, what: &str) -> IsolakeResult<f64> {
    if !value.is_finite() || value.abs() < SINGULARITY_TOLERANCE {
        return Err(IsolakeError::SingularInput(format!(
            "{what} is {value:e}"
        )));
    }
    Ok(value)
}

/// Craig-Gordon denominator $1 - h + 10^{-3} \varepsilon_k$.
fn evaporation_denominator(humidity: f64, factors: &FractionationFactors) -> IsolakeResult<f64> {
    guard_denominator(
        1.0 - humidity + 0.001 * factors.epsilon_k(),
        "Craig-Gordon denominator 1 - h + 0.001 * epsilon_k",
    )
}

/// Isotopic composition of atmospheric moisture $\delta_A$ (‰).
///
/// Seasonality factors outside the physical regime $[0.5, 1]$ are accepted with a warning,
/// since scenario runs deliberately explore edge values. Values outside $[0, 1]$ are rejected.
pub fn atmospheric_isotope(
    precipitation: f64,
    epsilon_eq: f64,
    seasonality_k: f64,
) -> IsolakeResult<f64> {
    if !seasonality_k.is_finite() || !(0.0..=1.0).contains(&seasonality_k) {
        return Err(IsolakeError::invalid_input(
            "seasonality_k",
            seasonality_k,
            "must lie in [0, 1]",
        ));
    }
    if seasonality_k < SEASONALITY_RANGE.0 {
        warn!(
            "Seasonality factor k={} lies below the seasonal regime [{}, {}]",
            seasonality_k, SEASONALITY_RANGE.0, SEASONALITY_RANGE.1
        );
    }
    let denominator = guard_denominator(
        1.0 + 0.001 * seasonality_k * epsilon_eq,
        "atmospheric denominator 1 + 0.001 * k * epsilon_eq",
    )?;
    Ok((precipitation - seasonality_k * epsilon_eq) / denominator)
}

/// Isotopic composition of the evaporating flux $\delta_E$ (‰).
pub fn evaporate_isotope(
    humidity: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
    delta_lake: f64,
) -> IsolakeResult<f64> {
    let denominator = evaporation_denominator(humidity, factors)?;
    let numerator = (delta_lake - factors.epsilon_eq()) / factors.alpha()
        - humidity * delta_atmosphere
        - factors.epsilon_k();
    Ok(numerator / denominator)
}

/// Auxiliary terms $A$ and $B$ of the steady-state lake balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassBalanceCoefficients {
    pub a: f64,
    pub b: f64,
}

impl MassBalanceCoefficients {
    /// Denominator $A - B \delta$ of the evaporation/inflow ratio for a lake at `delta_lake`.
    pub fn x_denominator(&self, delta_lake: f64) -> f64 {
        self.a - self.b * delta_lake
    }

    /// Limiting lake composition $A / B$ as $X \to \infty$, if defined.
    pub fn limit(&self) -> Option<f64> {
        if self.b.abs() < SINGULARITY_TOLERANCE {
            None
        } else {
            Some(self.a / self.b)
        }
    }
}

/// Compute $A$ and $B$ for the given climate and atmosphere.
pub fn mass_balance_coefficients(
    humidity: f64,
    factors: &FractionationFactors,
    delta_atmosphere: f64,
) -> IsolakeResult<MassBalanceCoefficients> {
    let denominator = evaporation_denominator(humidity, factors)?;
    let enrichment = factors.total_enrichment();
    Ok(MassBalanceCoefficients {
        a: (humidity * delta_atmosphere + enrichment) / denominator,
        b: (humidity - 0.001 * enrichment) / denominator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateState;
    use crate::species::IsotopeSpecies;
    use approx::assert_relative_eq;

    fn oxygen_factors() -> FractionationFactors {
        let climate = ClimateState::new(0.62, 11.15).unwrap();
        FractionationFactors::from_climate(IsotopeSpecies::Oxygen18, &climate).unwrap()
    }

    #[test]
    fn test_atmosphere_bear_lake() {
        let factors = oxygen_factors();
        let delta_a = atmospheric_isotope(-11.70, factors.epsilon_eq(), 1.0).unwrap();
        assert_relative_eq!(delta_a, -22.07867721134, epsilon = 1e-9);
    }

    #[test]
    fn test_atmosphere_seasonality() {
        let factors = oxygen_factors();
        let seasonal = atmospheric_isotope(-11.70, factors.epsilon_eq(), 0.5).unwrap();
        let annual = atmospheric_isotope(-11.70, factors.epsilon_eq(), 1.0).unwrap();
        assert!(seasonal > annual);
        // k = 0 leaves precipitation unchanged
        assert_eq!(atmospheric_isotope(-11.70, factors.epsilon_eq(), 0.0).unwrap(), -11.70);
        assert!(atmospheric_isotope(-11.70, factors.epsilon_eq(), 1.2).is_err());
        assert!(atmospheric_isotope(-11.70, factors.epsilon_eq(), -0.1).is_err());
    }

    #[test]
    fn test_evaporate_bear_lake() {
        let factors = oxygen_factors();
        let delta_a = atmospheric_isotope(-11.70, factors.epsilon_eq(), 1.0).unwrap();
        let delta_e = evaporate_isotope(0.62, &factors, delta_a, -8.75978345841666).unwrap();
        assert_relative_eq!(delta_e, -28.22177089514, epsilon = 1e-9);
    }

    #[test]
    fn test_coefficients_bear_lake() {
        let factors = oxygen_factors();
        let delta_a = atmospheric_isotope(-11.70, factors.epsilon_eq(), 1.0).unwrap();
        let coefficients = mass_balance_coefficients(0.62, &factors, delta_a).unwrap();
        assert_relative_eq!(coefficients.a, 5.73115813401, epsilon = 1e-9);
        assert_relative_eq!(coefficients.b, 1.56748501466, epsilon = 1e-9);
        assert_relative_eq!(coefficients.limit().unwrap(), 3.65627618792, epsilon = 1e-9);
    }

    #[test]
    fn test_saturated_air_is_singular() {
        let factors = oxygen_factors().with_humidity(IsotopeSpecies::Oxygen18, 1.0).unwrap();
        let result = evaporate_isotope(1.0, &factors, -22.0, -8.76);
        assert!(matches!(result, Err(IsolakeError::SingularInput(_))));
        let result = mass_balance_coefficients(1.0, &factors, -22.0);
        assert!(matches!(result, Err(IsolakeError::SingularInput(_))));
    }

    #[test]
    fn test_limit_undefined_when_b_vanishes() {
        let coefficients = MassBalanceCoefficients { a: 2.0, b: 0.0 };
        assert_eq!(coefficients.limit(), None);
    }
}

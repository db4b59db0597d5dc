//! Equilibrium and kinetic fractionation
//!
//! Temperature-dependent equilibrium fractionation factors between liquid water and vapour
//! follow Horita & Wesolowski (1994):
//!
//! $$\ln \alpha_{18O} = -7.685 \times 10^{-3} + \frac{6.7123}{T} - \frac{1666.4}{T^2} + \frac{350410}{T^3}$$
//!
//! $$\ln \alpha_{D} = 1158.8 \frac{T^3}{10^{12}} - 1620.1 \frac{T^2}{10^9} + 794.84 \frac{T}{10^6} - 161.04 \times 10^{-3} + \frac{2999200}{T^3}$$
//!
//! with $T$ in kelvin. The kinetic enrichment during evaporation into an unsaturated
//! atmosphere is linear in the humidity deficit (Gonfiantini, 1986):
//!
//! $$\varepsilon_k = C_k (1 - h)$$

use crate::climate::{validate_humidity, validate_temperature, ClimateState, ABSOLUTE_ZERO_CELSIUS};
use crate::errors::IsolakeResult;
use crate::species::IsotopeSpecies;
use serde::{Deserialize, Serialize};

/// Equilibrium fractionation factor $\alpha$ (liquid/vapour) at `temperature` (°C).
pub fn equilibrium_fractionation(species: IsotopeSpecies, temperature: f64) -> IsolakeResult<f64> {
    let t = validate_temperature(temperature)? - ABSOLUTE_ZERO_CELSIUS;
    let ln_alpha = match species {
        IsotopeSpecies::Oxygen18 => {
            -7.685e-3 + 6.7123 / t - 1666.4 / t.powi(2) + 350410.0 / t.powi(3)
        }
        IsotopeSpecies::Deuterium => {
            1158.8 * t.powi(3) / 1e12 - 1620.1 * t.powi(2) / 1e9 + 794.84 * t / 1e6 - 161.04 / 1e3
                + 2999200.0 / t.powi(3)
        }
    };
    Ok(ln_alpha.exp())
}

/// Kinetic enrichment factor $\varepsilon_k$ (‰) for evaporation at `humidity`.
pub fn kinetic_enrichment(species: IsotopeSpecies, humidity: f64) -> IsolakeResult<f64> {
    let h = validate_humidity(humidity)?;
    Ok(species.kinetic_slope() * (1.0 - h))
}

/// Fractionation factors for one species under one climate.
///
/// The equilibrium enrichment $\varepsilon_{eq} = (\alpha - 1) \cdot 1000$ is always derived
/// from $\alpha$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionationFactors {
    alpha: f64,
    epsilon_eq: f64,
    epsilon_k: f64,
}

impl FractionationFactors {
    pub fn new(alpha: f64, epsilon_k: f64) -> Self {
        Self {
            alpha,
            epsilon_eq: (alpha - 1.0) * 1000.0,
            epsilon_k,
        }
    }

    /// Compute the factors for `species` from a climate state.
    pub fn from_climate(species: IsotopeSpecies, climate: &ClimateState) -> IsolakeResult<Self> {
        let alpha = equilibrium_fractionation(species, climate.temperature())?;
        let epsilon_k = kinetic_enrichment(species, climate.humidity())?;
        Ok(Self::new(alpha, epsilon_k))
    }

    /// Same equilibrium terms with the kinetic term recomputed for `humidity`.
    pub fn with_humidity(&self, species: IsotopeSpecies, humidity: f64) -> IsolakeResult<Self> {
        Ok(Self::new(self.alpha, kinetic_enrichment(species, humidity)?))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Equilibrium enrichment factor (‰).
    pub fn epsilon_eq(&self) -> f64 {
        self.epsilon_eq
    }

    /// Kinetic enrichment factor (‰).
    pub fn epsilon_k(&self) -> f64 {
        self.epsilon_k
    }

    /// Total enrichment term $\varepsilon_k + \varepsilon_{eq} / \alpha$ shared by the
    /// steady-state formulas.
    pub fn total_enrichment(&self) -> f64 {
        self.epsilon_k + self.epsilon_eq / self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_alpha_at_bear_lake_temperature() {
        let alpha_o = equilibrium_fractionation(IsotopeSpecies::Oxygen18, 11.15).unwrap();
        let alpha_d = equilibrium_fractionation(IsotopeSpecies::Deuterium, 11.15).unwrap();
        assert_relative_eq!(alpha_o, 1.0106129981722, epsilon = 1e-10);
        assert_relative_eq!(alpha_d, 1.0954151031392, epsilon = 1e-10);
    }

    #[test]
    fn test_alpha_finite_and_positive_over_range() {
        // The cubic terms overflow `exp` within a few tens of kelvin of absolute zero
        for species in IsotopeSpecies::ALL {
            for i in 0..=140 {
                let temperature = -60.0 + i as f64;
                let alpha = equilibrium_fractionation(species, temperature).unwrap();
                assert!(alpha.is_finite() && alpha > 0.0, "{species} at {temperature}");
            }
        }
    }

    #[test]
    fn test_alpha_decreases_with_temperature() {
        for species in IsotopeSpecies::ALL {
            let cold = equilibrium_fractionation(species, 0.0).unwrap();
            let warm = equilibrium_fractionation(species, 30.0).unwrap();
            assert!(cold > warm);
        }
    }

    #[test]
    fn test_absolute_zero_rejected() {
        assert!(equilibrium_fractionation(IsotopeSpecies::Oxygen18, -273.15).is_err());
        assert!(equilibrium_fractionation(IsotopeSpecies::Deuterium, -300.0).is_err());
    }

    #[test]
    fn test_kinetic_enrichment_bounds() {
        assert_eq!(kinetic_enrichment(IsotopeSpecies::Oxygen18, 0.0).unwrap(), 14.2);
        assert_eq!(kinetic_enrichment(IsotopeSpecies::Deuterium, 0.0).unwrap(), 12.5);
        assert_eq!(kinetic_enrichment(IsotopeSpecies::Oxygen18, 1.0).unwrap(), 0.0);
        assert!(kinetic_enrichment(IsotopeSpecies::Oxygen18, 1.5).is_err());
        assert!(kinetic_enrichment(IsotopeSpecies::Deuterium, -0.1).is_err());
    }

    #[test]
    fn test_epsilon_eq_is_derived() {
        let climate = ClimateState::new(0.62, 11.15).unwrap();
        let factors = FractionationFactors::from_climate(IsotopeSpecies::Oxygen18, &climate).unwrap();
        assert_relative_eq!(factors.epsilon_eq(), (factors.alpha() - 1.0) * 1000.0);
        assert_relative_eq!(factors.epsilon_k(), 14.2 * 0.38, epsilon = 1e-12);

        let drier = factors.with_humidity(IsotopeSpecies::Oxygen18, 0.5).unwrap();
        assert_eq!(drier.alpha(), factors.alpha());
        assert_relative_eq!(drier.epsilon_k(), 7.1, epsilon = 1e-12);
    }
}

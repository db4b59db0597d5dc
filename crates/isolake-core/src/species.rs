//! Isotope species tracked by the mass balance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable-isotope tracer of water.
///
/// Every model function is parameterised by the species rather than duplicated per tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsotopeSpecies {
    /// $\delta^{18}\text{O}$
    #[serde(rename = "d18O")]
    Oxygen18,
    /// $\delta\text{D}$ ($\delta^2\text{H}$)
    #[serde(rename = "dD")]
    Deuterium,
}

impl IsotopeSpecies {
    /// Both species, oxygen first.
    pub const ALL: [IsotopeSpecies; 2] = [IsotopeSpecies::Oxygen18, IsotopeSpecies::Deuterium];

    /// Slope of the kinetic enrichment factor against $(1 - h)$ (‰).
    ///
    /// Gonfiantini (1986): 14.2 for $\delta^{18}\text{O}$ and 12.5 for $\delta\text{D}$.
    pub fn kinetic_slope(&self) -> f64 {
        match self {
            IsotopeSpecies::Oxygen18 => 14.2,
            IsotopeSpecies::Deuterium => 12.5,
        }
    }

    /// Short label used in reports and configuration files.
    pub fn label(&self) -> &'static str {
        match self {
            IsotopeSpecies::Oxygen18 => "d18O",
            IsotopeSpecies::Deuterium => "dD",
        }
    }
}

/// One value per species, for quantities the two tracers share a balance over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesPair<T> {
    #[serde(rename = "d18O")]
    pub oxygen: T,
    #[serde(rename = "dD")]
    pub deuterium: T,
}

impl<T> SpeciesPair<T> {
    pub fn new(oxygen: T, deuterium: T) -> Self {
        Self { oxygen, deuterium }
    }

    pub fn get(&self, species: IsotopeSpecies) -> &T {
        match species {
            IsotopeSpecies::Oxygen18 => &self.oxygen,
            IsotopeSpecies::Deuterium => &self.deuterium,
        }
    }

    /// Build a pair by evaluating `f` for each species.
    pub fn try_from_fn<E, F>(mut f: F) -> Result<Self, E>
    where
        F: FnMut(IsotopeSpecies) -> Result<T, E>,
    {
        Ok(Self {
            oxygen: f(IsotopeSpecies::Oxygen18)?,
            deuterium: f(IsotopeSpecies::Deuterium)?,
        })
    }
}

impl fmt::Display for IsotopeSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

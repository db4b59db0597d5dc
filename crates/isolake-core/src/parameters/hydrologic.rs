//! Hydrologic Balance Parameters
//!
//! Gauged discharges, end-member compositions and the starting point of the joint water and
//! dual-tracer balance.

use super::parse_toml;
use super::site::SiteParameters;
use crate::craig_gordon::atmospheric_isotope;
use crate::errors::IsolakeResult;
use crate::fractionation::FractionationFactors;
use crate::solvers::{Discharges, EndMembers, HydrologicBalance, HydrologicSolution, HydrologicUnknowns};
use crate::species::SpeciesPair;
use crate::utils::newton::SolverOptions;
use serde::{Deserialize, Serialize};

/// Parameters of the joint hydrologic balance.
///
/// The lake, precipitation and climate observations are taken from `site`; the atmospheric
/// composition and equilibrium fractionation are derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrologicParameters {
    pub site: SiteParameters,

    /// Gauged annual discharges
    /// unit: m³/yr
    /// default: inlet 317867056.26687, creek 145049044.909472,
    /// precipitation 107856450.331302, outlet 352639058.615613
    pub discharges: Discharges,

    /// Composition of each inflow source
    /// unit: ‰
    pub end_members: SpeciesPair<EndMembers>,

    /// Starting point of the Newton iteration. Convergence depends on it being physically
    /// plausible.
    pub initial_guess: HydrologicUnknowns,

    pub options: SolverOptions,
}

impl Default for HydrologicParameters {
    fn default() -> Self {
        Self {
            site: SiteParameters::default(),
            discharges: Discharges {
                inlet: 317867056.26687,
                creek: 145049044.909472,
                precipitation: 107856450.331302,
                outlet: 352639058.615613,
            },
            end_members: SpeciesPair::new(
                EndMembers {
                    inlet: -16.5680552351257,
                    creek: -16.6427693908244,
                    precipitation: -14.5993690452293,
                    groundwater: -17.7983116883116,
                },
                EndMembers {
                    inlet: -125.869415352418,
                    creek: -126.203603690239,
                    precipitation: -105.704124214273,
                    groundwater: -135.735649350649,
                },
            ),
            initial_guess: HydrologicUnknowns {
                groundwater: 0.0,
                evaporation: 231211349.583575,
                x: 0.435,
                humidity: 0.76,
                inflow_oxygen: -16.2150279446561,
                inflow_deuterium: -122.143792918018,
            },
            options: SolverOptions::default(),
        }
    }
}

impl HydrologicParameters {
    /// Parse hydrologic parameters from TOML. Missing keys take the default values.
    pub fn from_toml_str(source: &str) -> IsolakeResult<Self> {
        parse_toml(source, "hydrologic parameters")
    }

    /// Assemble the balance problem from the site observations.
    pub fn balance(&self) -> IsolakeResult<HydrologicBalance> {
        let climate = self.site.climate()?;
        let fractionation =
            SpeciesPair::try_from_fn(|species| FractionationFactors::from_climate(species, &climate))?;
        let atmosphere = SpeciesPair::try_from_fn(|species| {
            atmospheric_isotope(
                self.site.observations(species).precipitation,
                fractionation.get(species).epsilon_eq(),
                self.site.seasonality_k,
            )
        })?;
        let lake = SpeciesPair::new(
            self.site.observations.oxygen.lake,
            self.site.observations.deuterium.lake,
        );
        Ok(HydrologicBalance {
            discharges: self.discharges,
            end_members: self.end_members,
            lake,
            atmosphere,
            fractionation,
        })
    }

    /// Build the balance and solve it from the configured initial guess.
    pub fn solve(&self) -> IsolakeResult<HydrologicSolution> {
        self.balance()?.solve(&self.initial_guess, &self.options)
    }
}

//! Stable-isotope mass balance of lakes
//!
//! This crate estimates the evaporation/inflow ratio $X = E/I$ of a lake from the
//! $\delta^{18}$O and $\delta$D compositions of its water, inflow and precipitation, using the
//! Craig-Gordon model of evaporative fractionation.
//!
//! # Module Organisation
//!
//! - `fractionation`: temperature-dependent equilibrium and humidity-dependent kinetic terms
//! - `craig_gordon`: atmospheric moisture, evaporate and steady-state coefficients
//! - `solvers`: analytic steady state, joint hydrologic balance and climate scenario root-find
//! - `parameters`: site, hydrologic and climate-period parameters with reference defaults
//!
//! All model functions are pure and parameterised by [`IsotopeSpecies`].

pub mod climate;
pub mod craig_gordon;
pub mod errors;
pub mod fractionation;
pub mod parameters;
pub mod solvers;
pub mod species;
pub mod utils;

pub use errors::{IsolakeError, IsolakeResult};
pub use species::{IsotopeSpecies, SpeciesPair};

//! Lake stable-isotope mass balance with Monte Carlo uncertainty propagation.
//!
//! Re-exports the model crate as [`model`] and the uncertainty engine as [`uncertainty`].

pub use isolake_core as model;
pub use isolake_uncertainty as uncertainty;

pub use isolake_core::{IsolakeError, IsolakeResult, IsotopeSpecies};

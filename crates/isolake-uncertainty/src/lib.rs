//! Uncertainty propagation for the lake isotope mass balance
//!
//! Monte Carlo sampling of measurement and climate uncertainty, the trial models evaluated
//! per sample, summary statistics, and a forward-model adapter for external variance-based
//! sensitivity analysis.
//!
//! # Example
//!
//! ```no_run
//! use isolake_core::parameters::SiteParameters;
//! use isolake_core::IsotopeSpecies;
//! use isolake_uncertainty::{MonteCarlo, RunReport, SteadyStateModel, UncertaintyScenario};
//!
//! let site = SiteParameters::default();
//! let scenario = UncertaintyScenario::measurement(&site, IsotopeSpecies::Oxygen18)?;
//! let model = SteadyStateModel::new(&site, IsotopeSpecies::Oxygen18);
//! let batch = MonteCarlo::new(100_000)?.run(&scenario, &model)?;
//! println!("{}", RunReport::from_batch(scenario.label.clone(), IsotopeSpecies::Oxygen18, &batch));
//! # Ok::<(), isolake_core::IsolakeError>(())
//! ```

pub mod distribution;
pub mod engine;
pub mod models;
pub mod report;
pub mod sensitivity;
pub mod statistics;

pub use distribution::{Distribution, UncertaintyScenario, UncertaintySpec};
pub use engine::{MonteCarlo, TrialBatch, TrialModel};
pub use models::{ClimatePeriodModel, FrozenFractionationModel, SteadyStateModel};
pub use report::{RunReport, SteadyStateReport};
pub use sensitivity::{ForwardModel, SensitivityProblem};
pub use statistics::{linear_fit, summarize, LinearTrend, OutputSummary};

//! Monte Carlo propagation of input uncertainty through a trial model.
//!
//! Inputs are drawn sequentially from a single random stream, so a seeded generator
//! reproduces the full sample. Trials are then evaluated in parallel with rayon and their
//! outputs written into one flat buffer.
//!
//! Trials failing with an out-of-domain or singular input are recorded as NaN and counted.
//! Convergence and sampling errors abort the run.

use crate::distribution::{Distribution, UncertaintyScenario};
use isolake_core::{IsolakeError, IsolakeResult};
use log::{debug, warn};
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fraction of failed trials above which a run is reported as degraded.
pub const FAILURE_WARNING_FRACTION: f64 = 0.01;

/// A model evaluated once per Monte Carlo trial.
///
/// Implementations must be pure: the same inputs give the same outputs, and trials share no
/// mutable state.
pub trait TrialModel: Sync {
    /// Names of the inputs, in the order passed to [`TrialModel::evaluate`].
    fn input_names(&self) -> &[&'static str];

    /// Names of the outputs, in the order written by [`TrialModel::evaluate`].
    fn output_names(&self) -> &[&'static str];

    /// Evaluate one trial, writing one value per output name.
    fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> IsolakeResult<()>;
}

/// Inputs and outputs of every trial of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBatch {
    pub input_names: Vec<String>,
    /// Sampled inputs: shape (n_trials, n_inputs)
    pub inputs: Array2<f64>,
    pub output_names: Vec<String>,
    /// Trial outputs: shape (n_trials, n_outputs). Failed trials are NaN.
    pub outputs: Array2<f64>,
    /// Number of trials that failed with a recoverable error.
    pub n_failed: usize,
}

impl TrialBatch {
    pub fn n_trials(&self) -> usize {
        self.inputs.nrows()
    }

    /// Fraction of trials that failed with a recoverable error.
    pub fn failure_fraction(&self) -> f64 {
        self.n_failed as f64 / self.n_trials() as f64
    }

    /// Whether more than [`FAILURE_WARNING_FRACTION`] of the trials failed.
    pub fn is_degraded(&self) -> bool {
        self.failure_fraction() > FAILURE_WARNING_FRACTION
    }

    pub fn input(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.input_names.iter().position(|n| n == name)?;
        Some(self.inputs.column(index))
    }

    pub fn output(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.output_names.iter().position(|n| n == name)?;
        Some(self.outputs.column(index))
    }
}

/// Monte Carlo driver with a fixed number of trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarlo {
    n_trials: usize,
}

impl MonteCarlo {
    pub fn new(n_trials: usize) -> IsolakeResult<Self> {
        if n_trials == 0 {
            return Err(IsolakeError::SamplingError(
                "Monte Carlo run requires at least one trial".to_string(),
            ));
        }
        Ok(Self { n_trials })
    }

    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    /// Run with a fresh thread-local random stream.
    pub fn run<M: TrialModel>(
        &self,
        scenario: &UncertaintyScenario,
        model: &M,
    ) -> IsolakeResult<TrialBatch> {
        let mut rng = rand::thread_rng();
        self.run_with_rng(scenario, model, &mut rng)
    }

    /// Run with an injected random number generator.
    pub fn run_with_rng<M, R>(
        &self,
        scenario: &UncertaintyScenario,
        model: &M,
        rng: &mut R,
    ) -> IsolakeResult<TrialBatch>
    where
        M: TrialModel,
        R: Rng + ?Sized,
    {
        let distributions = resolve_inputs(scenario, model)?;
        let n_inputs = distributions.len();
        let n_outputs = model.output_names().len();
        if n_outputs == 0 {
            return Err(IsolakeError::SamplingError(
                "Trial model declares no outputs".to_string(),
            ));
        }

        debug!(
            "Running {} trials of scenario '{}' ({} inputs, {} outputs)",
            self.n_trials, scenario.label, n_inputs, n_outputs
        );

        let mut inputs = Vec::with_capacity(self.n_trials * n_inputs);
        for _ in 0..self.n_trials {
            inputs.extend(distributions.iter().map(|d| d.sample(rng)));
        }

        let mut outputs = vec![0.0; self.n_trials * n_outputs];
        let n_failed = outputs
            .par_chunks_mut(n_outputs)
            .zip(inputs.par_chunks(n_inputs))
            .map(|(out, inp)| match model.evaluate(inp, out) {
                Ok(()) => Ok(0),
                Err(e) if e.is_trial_recoverable() => {
                    out.fill(f64::NAN);
                    Ok(1)
                }
                Err(e) => Err(e),
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        let batch = TrialBatch {
            input_names: model.input_names().iter().map(|s| s.to_string()).collect(),
            inputs: to_matrix(inputs, self.n_trials, n_inputs)?,
            output_names: model.output_names().iter().map(|s| s.to_string()).collect(),
            outputs: to_matrix(outputs, self.n_trials, n_outputs)?,
            n_failed,
        };
        if batch.is_degraded() {
            warn!(
                "{} of {} trials of scenario '{}' failed ({:.1}%)",
                n_failed,
                self.n_trials,
                scenario.label,
                100.0 * batch.failure_fraction()
            );
        }
        Ok(batch)
    }
}

/// Match each model input to its distribution by name.
fn resolve_inputs<M: TrialModel>(
    scenario: &UncertaintyScenario,
    model: &M,
) -> IsolakeResult<Vec<Distribution>> {
    if model.input_names().is_empty() {
        return Err(IsolakeError::SamplingError(
            "Trial model declares no inputs".to_string(),
        ));
    }
    model
        .input_names()
        .iter()
        .map(|name| {
            let distribution = scenario.get(name).copied().ok_or_else(|| {
                IsolakeError::SamplingError(format!(
                    "Scenario '{}' has no distribution for model input '{}'",
                    scenario.label, name
                ))
            })?;
            distribution.validate()?;
            Ok(distribution)
        })
        .collect()
}

/// Unpack the inputs of one trial into a fixed-size array.
pub(crate) fn trial_inputs<const N: usize>(inputs: &[f64]) -> IsolakeResult<[f64; N]> {
    inputs.try_into().map_err(|_| {
        IsolakeError::SamplingError(format!(
            "Expected {} trial inputs, got {}",
            N,
            inputs.len()
        ))
    })
}

pub(crate) fn write_outputs(outputs: &mut [f64], values: &[f64]) -> IsolakeResult<()> {
    if outputs.len() != values.len() {
        return Err(IsolakeError::SamplingError(format!(
            "Expected {} trial outputs, got buffer of {}",
            values.len(),
            outputs.len()
        )));
    }
    outputs.copy_from_slice(values);
    Ok(())
}

fn to_matrix(values: Vec<f64>, rows: usize, cols: usize) -> IsolakeResult<Array2<f64>> {
    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| IsolakeError::SamplingError(format!("Failed to shape trial matrix: {}", e)))
}

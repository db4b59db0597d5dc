use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IsolakeError {
    /// A physical parameter lies outside its valid domain.
    #[error("Invalid input: {parameter}={value} ({reason})")]
    InvalidInput {
        parameter: String,
        value: f64,
        reason: String,
    },
    /// A denominator of the Craig-Gordon or steady-state formulas vanished.
    ///
    /// The individual parameters may each be valid while their combination is degenerate.
    #[error("Singular input: {0}")]
    SingularInput(String),
    #[error("Solver did not converge after {iterations} iterations (residual norm {residual_norm:e})")]
    ConvergenceFailure {
        iterations: usize,
        residual_norm: f64,
        /// Last iterate reached by the solver, for diagnostics only.
        best_estimate: Vec<f64>,
    },
    #[error("Sampling error: {0}")]
    SamplingError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IsolakeError {
    pub(crate) fn invalid_input(parameter: &str, value: f64, reason: &str) -> Self {
        IsolakeError::InvalidInput {
            parameter: parameter.to_string(),
            value,
            reason: reason.to_string(),
        }
    }

    /// Whether a Monte Carlo trial failing with this error may be recorded as NaN
    /// instead of aborting the whole run.
    pub fn is_trial_recoverable(&self) -> bool {
        matches!(
            self,
            IsolakeError::InvalidInput { .. } | IsolakeError::SingularInput(_)
        )
    }
}

/// Convenience type for `Result<T, IsolakeError>`.
pub type IsolakeResult<T> = Result<T, IsolakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(IsolakeError::invalid_input("humidity", 1.2, "outside [0, 1]").is_trial_recoverable());
        assert!(IsolakeError::SingularInput("1 - h".to_string()).is_trial_recoverable());
        assert!(!IsolakeError::SamplingError("bad".to_string()).is_trial_recoverable());
        assert!(!IsolakeError::ConvergenceFailure {
            iterations: 100,
            residual_norm: 1.0,
            best_estimate: vec![],
        }
        .is_trial_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = IsolakeError::invalid_input("temperature", -300.0, "at or below absolute zero");
        assert_eq!(
            err.to_string(),
            "Invalid input: temperature=-300 (at or below absolute zero)"
        );
    }
}

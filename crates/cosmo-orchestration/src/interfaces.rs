//! Orchestration interfaces.

use std::time::Duration;

use cosmo_core::solver::SolverError;

use crate::orchestrator::ForwardPass;

/// Trait for reporting batch progress to the user.
pub trait ProgressReporter: Send + Sync {
    /// One more forward pass finished.
    fn report(&self, completed: usize, total: usize);

    /// Report completion.
    fn complete(&self);
}

/// Trait for presenting results to the user.
pub trait ResultPresenter: Send + Sync {
    /// Present a single forward pass.
    fn present_pass(&self, pass: &ForwardPass, duration: Duration, details: bool);

    /// Present the results of a batch.
    fn present_batch(&self, results: &[EvaluationResult]);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Result of one forward pass within a batch.
#[derive(Debug)]
pub struct EvaluationResult {
    /// Position of the parameter set in the batch input.
    pub index: usize,
    /// The objective or the solver failure.
    pub outcome: Result<f64, SolverError>,
    /// Wall time of the pass.
    pub duration: Duration,
}

/// Null progress reporter (does nothing).
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn report(&self, _completed: usize, _total: usize) {}
    fn complete(&self) {}
}

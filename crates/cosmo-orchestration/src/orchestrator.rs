//! Core orchestration: the forward pass and batch evaluation.
//!
//! A forward pass drives one solver session through
//! reset -> configure -> compute -> extract and reduces the temperature
//! spectrum to a scalar. Every solver error propagates unchanged.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use cosmo_core::constants::FIRST_PHYSICAL_MULTIPOLE;
use cosmo_core::params::ParameterSet;
use cosmo_core::settings::{ForwardConfig, OutputSettings, SolverSettings};
use cosmo_core::solver::{CosmologySolver, SolverError, SolverFactory};
use cosmo_core::spectra::Spectra;

use crate::interfaces::{EvaluationResult, ProgressReporter};

/// Everything one forward pass produced.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Retrieved spectra over `0..=lmax`.
    pub spectra: Spectra,
    /// Reduced Hubble parameter.
    pub hubble: f64,
    /// Temperature spectrum from l = 2 on.
    pub temperature: Vec<f64>,
    /// Scalar objective.
    pub objective: f64,
}

/// Placeholder objective: `sum(cl_tt * h)`.
#[must_use]
pub fn placeholder_objective(temperature: &[f64], hubble: f64) -> f64 {
    temperature.iter().map(|cl| cl * hubble).sum()
}

/// Run one forward pass and return all intermediate results.
pub fn forward_pass<S>(
    session: &mut S,
    parameters: &ParameterSet,
    solver: &SolverSettings,
    output: &OutputSettings,
) -> Result<ForwardPass, SolverError>
where
    S: CosmologySolver + ?Sized,
{
    let span = tracing::info_span!("forward_pass", solver = session.name(), lmax = output.lmax);
    let _enter = span.enter();

    session.reset();
    session.configure(parameters)?;
    session.configure(&solver.with_output_directive())?;
    tracing::debug!(parameters = parameters.len(), "configured");

    let start = Instant::now();
    session.compute()?;
    tracing::debug!(elapsed = ?start.elapsed(), "computed");

    let spectra = session.spectra(output.lmax, output.source)?;
    let hubble = session.hubble_parameter()?;
    let temperature = spectra
        .temperature()?
        .get(FIRST_PHYSICAL_MULTIPOLE..)
        .unwrap_or_default()
        .to_vec();
    let objective = placeholder_objective(&temperature, hubble);
    tracing::debug!(hubble, objective, multipoles = spectra.len(), "extracted");

    Ok(ForwardPass {
        spectra,
        hubble,
        temperature,
        objective,
    })
}

/// Run one forward pass and return the scalar objective.
pub fn forward<S>(
    session: &mut S,
    parameters: &ParameterSet,
    solver: &SolverSettings,
    output: &OutputSettings,
) -> Result<f64, SolverError>
where
    S: CosmologySolver + ?Sized,
{
    forward_pass(session, parameters, solver, output).map(|pass| pass.objective)
}

/// A session shared between threads.
///
/// The lock is held for the whole reset-to-extract cycle, so passes from
/// different threads never interleave on the session.
pub struct SharedSession<S> {
    inner: Mutex<S>,
}

impl<S: CosmologySolver> SharedSession<S> {
    /// Wrap a session.
    pub fn new(session: S) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Serialized [`forward_pass`].
    pub fn forward_pass(
        &self,
        parameters: &ParameterSet,
        solver: &SolverSettings,
        output: &OutputSettings,
    ) -> Result<ForwardPass, SolverError> {
        let mut session = self.inner.lock();
        forward_pass(&mut *session, parameters, solver, output)
    }

    /// Serialized [`forward`].
    pub fn forward(
        &self,
        parameters: &ParameterSet,
        solver: &SolverSettings,
        output: &OutputSettings,
    ) -> Result<f64, SolverError> {
        self.forward_pass(parameters, solver, output)
            .map(|pass| pass.objective)
    }

    /// Unwrap the session.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

/// Evaluate many parameter sets in parallel, one solver session per worker.
///
/// Results keep input order. A failing pass does not stop the others.
pub fn evaluate_batch(
    factory: &dyn SolverFactory,
    solver_name: &str,
    parameter_sets: &[ParameterSet],
    config: &ForwardConfig,
    reporter: &dyn ProgressReporter,
) -> Vec<EvaluationResult> {
    let total = parameter_sets.len();
    let completed = AtomicUsize::new(0);
    tracing::info!(total, solver = solver_name, "evaluating batch");

    let results: Vec<EvaluationResult> = parameter_sets
        .par_iter()
        .enumerate()
        .map_init(
            || factory.create(solver_name),
            |session, (index, parameters)| {
                let start = Instant::now();
                let outcome = match session {
                    Ok(session) => forward(session, parameters, &config.solver, &config.output),
                    Err(e) => Err(SolverError::Configuration(format!(
                        "could not create {solver_name} session: {e}"
                    ))),
                };
                if let Err(e) = &outcome {
                    tracing::warn!(index, error = %e, "forward pass failed");
                }
                reporter.report(completed.fetch_add(1, Ordering::Relaxed) + 1, total);
                EvaluationResult {
                    index,
                    outcome,
                    duration: start.elapsed(),
                }
            },
        )
        .collect();

    reporter.complete();
    results
}

/// Aggregate view of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Passes that produced an objective.
    pub succeeded: usize,
    /// Passes that failed.
    pub failed: usize,
    /// Index and value of the lowest objective.
    pub best: (usize, f64),
}

/// Summarize a batch. Fails when no pass succeeded.
pub fn summarize_batch(results: &[EvaluationResult]) -> Result<BatchSummary, SolverError> {
    let succeeded: Vec<(usize, f64)> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok().map(|&value| (r.index, value)))
        .collect();

    let best = succeeded
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| SolverError::Computation("no forward pass in the batch succeeded".into()))?;

    Ok(BatchSummary {
        succeeded: succeeded.len(),
        failed: results.len() - succeeded.len(),
        best,
    })
}

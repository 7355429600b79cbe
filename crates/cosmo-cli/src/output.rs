//! CLI output formatting and JSON reports.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use cosmo_core::params::ParameterSet;
use cosmo_core::settings::ForwardConfig;
use cosmo_orchestration::interfaces::EvaluationResult;
use cosmo_orchestration::orchestrator::ForwardPass;

/// Format an objective value for display.
#[must_use]
pub fn format_objective(value: f64) -> String {
    format!("{value:.10e}")
}

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// JSON report of a single forward pass.
#[derive(Debug, Serialize)]
pub struct PassReport<'a> {
    /// Solver backend name.
    pub solver: &'a str,
    /// Physical parameters of the pass.
    pub parameters: &'a ParameterSet,
    /// Settings used.
    pub config: &'a ForwardConfig,
    /// Reduced Hubble parameter.
    pub hubble: f64,
    /// Scalar objective.
    pub objective: f64,
    /// Wall time in seconds.
    pub seconds: f64,
    /// Temperature spectrum from l = 2 on.
    pub temperature: &'a [f64],
}

impl<'a> PassReport<'a> {
    /// Build a report from a finished pass.
    #[must_use]
    pub fn new(
        solver: &'a str,
        parameters: &'a ParameterSet,
        config: &'a ForwardConfig,
        pass: &'a ForwardPass,
        duration: Duration,
    ) -> Self {
        Self {
            solver,
            parameters,
            config,
            hubble: pass.hubble,
            objective: pass.objective,
            seconds: duration.as_secs_f64(),
            temperature: &pass.temperature,
        }
    }
}

/// One entry of a batch report.
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    /// Position in the batch input.
    pub index: usize,
    /// Objective, when the pass succeeded.
    pub objective: Option<f64>,
    /// Error message, when it failed.
    pub error: Option<String>,
    /// Wall time in seconds.
    pub seconds: f64,
}

/// Batch results as report entries.
#[must_use]
pub fn batch_entries(results: &[EvaluationResult]) -> Vec<BatchEntry> {
    results
        .iter()
        .map(|r| BatchEntry {
            index: r.index,
            objective: r.outcome.as_ref().ok().copied(),
            error: r.outcome.as_ref().err().map(ToString::to_string),
            seconds: r.duration.as_secs_f64(),
        })
        .collect()
}

/// Write any report to a JSON file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> io::Result<()> {
    let mut writer = io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(())
}

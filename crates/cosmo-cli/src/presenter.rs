//! CLI result presenter.

use std::time::Duration;

use cosmo_orchestration::interfaces::{EvaluationResult, ResultPresenter};
use cosmo_orchestration::orchestrator::{summarize_batch, ForwardPass};

use crate::output::{format_duration, format_objective};
use crate::ui::{print_error, print_field, print_header, print_success};

/// CLI result presenter.
pub struct CliResultPresenter {
    verbose: bool,
    quiet: bool,
}

impl CliResultPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl ResultPresenter for CliResultPresenter {
    fn present_pass(&self, pass: &ForwardPass, duration: Duration, details: bool) {
        if self.quiet {
            println!("{}", pass.objective);
            return;
        }

        print_header("Forward pass");
        print_field("objective", &format_objective(pass.objective));
        print_field("duration", &format_duration(duration));

        if details || self.verbose {
            print_field("h", &format!("{:.6}", pass.hubble));
            print_field("lmax", &pass.spectra.lmax().to_string());
            print_field("spectra", &pass.spectra.names().collect::<Vec<_>>().join(", "));
            print_field("reduced terms", &pass.temperature.len().to_string());
        }
    }

    fn present_batch(&self, results: &[EvaluationResult]) {
        if self.quiet {
            for result in results {
                match &result.outcome {
                    Ok(value) => println!("{value}"),
                    Err(_) => println!("NaN"),
                }
            }
            return;
        }

        print_header("Batch results");
        println!("{:-<60}", "");
        for result in results {
            match &result.outcome {
                Ok(value) => println!(
                    "  #{:<6} {:>20} {:>12} [OK]",
                    result.index,
                    format_objective(*value),
                    format_duration(result.duration),
                ),
                Err(e) => {
                    println!(
                        "  #{:<6} {:>20} {:>12} [ERROR]",
                        result.index,
                        "-",
                        format_duration(result.duration),
                    );
                    if self.verbose {
                        println!("           {e}");
                    }
                }
            }
        }
        match summarize_batch(results) {
            Ok(summary) => {
                print_success(&format!(
                    "{}/{} passes succeeded",
                    summary.succeeded,
                    results.len()
                ));
                print_field(
                    "best",
                    &format!("#{} {}", summary.best.0, format_objective(summary.best.1)),
                );
            }
            Err(e) => print_error(&e.to_string()),
        }
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}

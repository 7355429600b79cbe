//! Application entry point and dispatch.

use std::time::Instant;

use anyhow::{Context, Result};

use cosmo_cli::output::{batch_entries, write_report, PassReport};
use cosmo_cli::presenter::CliResultPresenter;
use cosmo_cli::progress::BatchProgressBar;
use cosmo_core::params::ParameterSet;
use cosmo_core::settings::ForwardConfig;
use cosmo_core::solver::{CosmologySolver, SolverFactory};
use cosmo_orchestration::interfaces::ResultPresenter;
use cosmo_orchestration::orchestrator::{evaluate_batch, forward_pass, summarize_batch};
use cosmo_orchestration::registry::DefaultFactory;

use crate::config::AppConfig;

/// Run the application.
///
/// # Errors
///
/// Returns the first solver, configuration, or I/O failure.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        cosmo_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let factory = match &config.class_bin {
        Some(binary) => DefaultFactory::with_class_binary(binary),
        None => DefaultFactory::new(),
    };
    let forward = config.forward_config()?;
    let presenter = CliResultPresenter::new(config.verbose, config.quiet);

    match config.batch_parameters()? {
        Some(sets) => run_batch(config, &factory, &sets, &forward, &presenter),
        None => run_single(config, &factory, &config.parameters()?, &forward, &presenter),
    }
}

fn run_single(
    config: &AppConfig,
    factory: &DefaultFactory,
    parameters: &ParameterSet,
    forward: &ForwardConfig,
    presenter: &CliResultPresenter,
) -> Result<()> {
    let mut session = factory.create(&config.solver)?;
    tracing::info!(solver = session.name(), parameters = parameters.len(), "starting forward pass");

    let start = Instant::now();
    let pass = forward_pass(&mut *session, parameters, &forward.solver, &forward.output)?;
    let duration = start.elapsed();

    presenter.present_pass(&pass, duration, config.details);

    if let Some(path) = &config.output {
        let report = PassReport::new(session.name(), parameters, forward, &pass, duration);
        write_report(path, &report)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(())
}

fn run_batch(
    config: &AppConfig,
    factory: &DefaultFactory,
    sets: &[ParameterSet],
    forward: &ForwardConfig,
    presenter: &CliResultPresenter,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .context("building the worker pool")?;

    let progress = if config.quiet {
        BatchProgressBar::hidden(sets.len())
    } else {
        BatchProgressBar::new(sets.len())
    };
    let results =
        pool.install(|| evaluate_batch(factory, &config.solver, sets, forward, &progress));

    presenter.present_batch(&results);

    if let Some(path) = &config.output {
        write_report(path, &batch_entries(&results))
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    if let Err(e) = summarize_batch(&results) {
        return Err(results
            .into_iter()
            .find_map(|r| r.outcome.err())
            .unwrap_or(e)
            .into());
    }
    Ok(())
}

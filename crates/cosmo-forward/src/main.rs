//! cosmo-forward: one forward pass of a Boltzmann solver.

use std::process::ExitCode;

use cosmo_cli::presenter::CliResultPresenter;
use cosmo_forward_lib::{app, config, errors, logging};
use cosmo_orchestration::interfaces::ResultPresenter;

fn main() -> ExitCode {
    let config = config::AppConfig::parse();
    logging::init(config.verbose);

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliResultPresenter::new(config.verbose, config.quiet).present_error(&format!("{err:#}"));
            ExitCode::from(u8::try_from(errors::exit_code(&err)).unwrap_or(1))
        }
    }
}

//! Application configuration from CLI flags and environment.

use std::path::{Path, PathBuf};

use clap::Parser;

use cosmo_core::params::{ParamValue, ParameterSet};
use cosmo_core::settings::{ForwardConfig, SpectrumSource};
use cosmo_core::solver::SolverError;

/// cosmo-forward: run a Boltzmann solver on cosmological parameters and
/// reduce the lensed temperature spectrum to a scalar.
#[derive(Parser, Debug)]
#[command(name = "cosmo-forward", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Solver backend: analytic or class.
    #[arg(long, default_value = "class", env = "COSMO_SOLVER")]
    pub solver: String,

    /// Path to the CLASS executable.
    #[arg(long, env = "COSMO_CLASS_BIN")]
    pub class_bin: Option<PathBuf>,

    /// JSON object of physical parameters.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Single physical parameter (repeatable).
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub param: Vec<(String, ParamValue)>,

    /// Start from the reference six-parameter Lambda-CDM set.
    #[arg(long)]
    pub lcdm: bool,

    /// JSON array of parameter objects, evaluated in parallel.
    #[arg(long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// Worker threads for batch evaluation (0 = one per core).
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// JSON file with solver and output settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum multipole retrieved.
    #[arg(long)]
    pub lmax: Option<usize>,

    /// Disable lensing in the solver.
    #[arg(long)]
    pub no_lensing: bool,

    /// Maximum wavenumber (1/Mpc) of the matter power spectrum.
    #[arg(long)]
    pub p_k_max: Option<f64>,

    /// Raw solver input layered over the settings (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, ParamValue)>,

    /// Reduce the unlensed spectrum instead of the lensed one.
    #[arg(long)]
    pub raw: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Show detailed information.
    #[arg(short, long)]
    pub details: bool,

    /// Write a JSON report to this file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Quiet mode (only output the objective).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Physical parameters: the reference set, then `--params`, then `--param`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the parameter file cannot be read.
    pub fn parameters(&self) -> Result<ParameterSet, SolverError> {
        let mut parameters = if self.lcdm {
            ParameterSet::lambda_cdm_reference()
        } else {
            ParameterSet::new()
        };
        if let Some(path) = &self.params {
            parameters.merge(&read_json(path)?);
        }
        parameters.extend(self.param.iter().cloned());
        Ok(parameters)
    }

    /// Parameter sets of `--batch`, each layered over [`Self::parameters`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a file cannot be read.
    pub fn batch_parameters(&self) -> Result<Option<Vec<ParameterSet>>, SolverError> {
        let Some(path) = &self.batch else {
            return Ok(None);
        };
        let base = self.parameters()?;
        let sets: Vec<ParameterSet> = read_json(path)?;
        Ok(Some(sets.iter().map(|set| base.merged(set)).collect()))
    }

    /// Settings from `--config` with the individual flags applied on top.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings file cannot be read.
    pub fn forward_config(&self) -> Result<ForwardConfig, SolverError> {
        let mut config = match &self.config {
            Some(path) => ForwardConfig::from_json_file(path)?,
            None => ForwardConfig::default(),
        };
        if let Some(lmax) = self.lmax {
            config.output.lmax = lmax;
        }
        if self.raw {
            config.output.source = SpectrumSource::Raw;
        }
        if self.no_lensing {
            config.solver.lensing = false;
        }
        if let Some(p_k_max) = self.p_k_max {
            config.solver.p_k_max_inv_mpc = p_k_max;
        }
        config.solver.extra.extend(self.set.iter().cloned());
        Ok(config)
    }
}

/// Parse a `KEY=VALUE` pair; numeric values become numbers.
///
/// # Errors
///
/// Returns a message when the `=` or the key is missing.
pub fn parse_key_value(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), ParamValue::parse(value)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SolverError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| SolverError::Configuration(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| SolverError::Configuration(format!("{}: {e}", path.display())))
}

//! Solver and output settings layered on top of the physical parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{keys, DEFAULT_LMAX, DEFAULT_P_K_MAX_INV_MPC, OUTPUT_DIRECTIVE};
use crate::params::ParameterSet;
use crate::solver::SolverError;

/// Solver-level constants merged into every configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Whether the solver computes lensing corrections.
    pub lensing: bool,
    /// Maximum wavenumber (1/Mpc) for the matter power spectrum.
    pub p_k_max_inv_mpc: f64,
    /// Additional raw solver inputs; these override the fields above.
    pub extra: ParameterSet,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            lensing: true,
            p_k_max_inv_mpc: DEFAULT_P_K_MAX_INV_MPC,
            extra: ParameterSet::new(),
        }
    }
}

impl SolverSettings {
    /// Render the settings as solver inputs.
    #[must_use]
    pub fn to_parameters(&self) -> ParameterSet {
        let mut set = ParameterSet::new()
            .with(keys::LENSING, if self.lensing { "yes" } else { "no" })
            .with(keys::P_K_MAX, self.p_k_max_inv_mpc);
        set.merge(&self.extra);
        set
    }

    /// Settings plus the fixed output directive.
    #[must_use]
    pub fn with_output_directive(&self) -> ParameterSet {
        self.to_parameters().with(keys::OUTPUT, OUTPUT_DIRECTIVE)
    }
}

/// Which family of angular spectra to extract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumSource {
    /// Lensing-corrected spectra.
    #[default]
    Lensed,
    /// Unlensed spectra.
    Raw,
}

impl std::fmt::Display for SpectrumSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lensed => f.write_str("lensed"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

/// Output-level constants controlling extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Maximum multipole retrieved (inclusive).
    pub lmax: usize,
    /// Spectrum family to retrieve.
    pub source: SpectrumSource,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            lmax: DEFAULT_LMAX,
            source: SpectrumSource::Lensed,
        }
    }
}

/// Complete forward-pass configuration, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Solver constants.
    pub solver: SolverSettings,
    /// Extraction constants.
    pub output: OutputSettings,
}

impl ForwardConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    ///
    /// An unreadable or malformed file is a configuration error.
    pub fn from_json_file(path: &Path) -> Result<Self, SolverError> {
        let config_error = |e: &dyn std::fmt::Display| {
            SolverError::Configuration(format!("{}: {e}", path.display()))
        };
        let data = std::fs::read_to_string(path).map_err(|e| config_error(&e))?;
        serde_json::from_str(&data).map_err(|e| config_error(&e))
    }
}

//! The cosmology solver interface and its error taxonomy.
//!
//! `CosmologySolver` is the session trait consumed by orchestration. A
//! session is stateful: it accumulates configuration, computes once, and then
//! serves results until it is reset.
//! `SolverFactory` creates fresh sessions by name for parallel workers.

use crate::constants::exit_codes;
use crate::params::ParameterSet;
use crate::settings::SpectrumSource;
use crate::spectra::Spectra;

/// Error type for solver sessions.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The solver rejected an input parameter.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Offending input name (empty when the whole mapping is at fault).
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Configuration could not be assembled (unreadable file, bad format).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The solver failed or did not converge.
    #[error("computation failed: {0}")]
    Computation(String),

    /// Results were requested before a successful compute.
    #[error("no computed results; call compute first")]
    NotComputed,

    /// A multipole beyond what the solver computed was requested.
    #[error("multipole {requested} out of range (solver computed up to l = {available})")]
    MultipoleOutOfRange {
        /// Requested maximum multipole.
        requested: usize,
        /// Highest multipole available.
        available: usize,
    },

    /// A spectrum was not produced by the solver.
    #[error("spectrum {0} not available")]
    MissingSpectrum(String),

    /// The solver output could not be parsed.
    #[error("unexpected solver output: {0}")]
    OutputFormat(String),

    /// I/O failure while talking to the solver.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stage of a forward pass an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reset and configure.
    Configuration,
    /// Compute.
    Computation,
    /// Spectrum and derived-quantity retrieval.
    Extraction,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => f.write_str("configuration"),
            Self::Computation => f.write_str("computation"),
            Self::Extraction => f.write_str("extraction"),
        }
    }
}

impl SolverError {
    /// Convenience constructor for [`SolverError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Which stage this error is attributed to.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidParameter { .. } | Self::Configuration(_) => Stage::Configuration,
            Self::Computation(_) | Self::Io(_) => Stage::Computation,
            Self::NotComputed
            | Self::MultipoleOutOfRange { .. }
            | Self::MissingSpectrum(_)
            | Self::OutputFormat(_) => Stage::Extraction,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidParameter { .. } => exit_codes::ERROR_INVALID_PARAMETER,
            Self::Configuration(_) => exit_codes::ERROR_CONFIG,
            Self::Computation(_) | Self::Io(_) => exit_codes::ERROR_COMPUTATION,
            Self::NotComputed
            | Self::MultipoleOutOfRange { .. }
            | Self::MissingSpectrum(_)
            | Self::OutputFormat(_) => exit_codes::ERROR_EXTRACTION,
        }
    }
}

/// One computation session of an external cosmology solver.
///
/// Implementations are single-owner: callers needing concurrency use one
/// session per worker or serialize the whole reset-to-extract cycle.
pub trait CosmologySolver: Send {
    /// Short name of the solver backend.
    fn name(&self) -> &str;

    /// Discard all configuration and results.
    fn reset(&mut self);

    /// Add inputs to the configuration; later entries replace earlier ones.
    ///
    /// An empty mapping is rejected.
    fn configure(&mut self, parameters: &ParameterSet) -> Result<(), SolverError>;

    /// Run every stage required by the configured outputs. Blocking.
    fn compute(&mut self) -> Result<(), SolverError>;

    /// Lensed spectra for `0..=lmax`.
    fn lensed_spectra(&self, lmax: usize) -> Result<Spectra, SolverError>;

    /// Unlensed spectra for `0..=lmax`.
    fn raw_spectra(&self, lmax: usize) -> Result<Spectra, SolverError>;

    /// Reduced Hubble parameter `h` of the computed cosmology.
    fn hubble_parameter(&self) -> Result<f64, SolverError>;

    /// Spectra of the requested family.
    fn spectra(&self, lmax: usize, source: SpectrumSource) -> Result<Spectra, SolverError> {
        match source {
            SpectrumSource::Lensed => self.lensed_spectra(lmax),
            SpectrumSource::Raw => self.raw_spectra(lmax),
        }
    }
}

impl<S: CosmologySolver + ?Sized> CosmologySolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn configure(&mut self, parameters: &ParameterSet) -> Result<(), SolverError> {
        (**self).configure(parameters)
    }

    fn compute(&mut self) -> Result<(), SolverError> {
        (**self).compute()
    }

    fn lensed_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        (**self).lensed_spectra(lmax)
    }

    fn raw_spectra(&self, lmax: usize) -> Result<Spectra, SolverError> {
        (**self).raw_spectra(lmax)
    }

    fn hubble_parameter(&self) -> Result<f64, SolverError> {
        (**self).hubble_parameter()
    }
}

/// Factory trait for creating solver sessions.
pub trait SolverFactory: Send + Sync {
    /// Create a fresh session for the named backend.
    fn create(&self, name: &str) -> Result<Box<dyn CosmologySolver>, SolverError>;

    /// List all available backend names.
    fn available(&self) -> Vec<&str>;
}

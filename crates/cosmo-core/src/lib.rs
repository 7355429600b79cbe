//! # cosmo-core
//!
//! Core types for driving a cosmology solver: parameter sets, solver and
//! output settings, angular spectra, the `CosmologySolver` session trait,
//! and an in-process analytic solver.

pub mod analytic;
pub mod constants;
pub mod params;
pub mod settings;
pub mod solver;
pub mod spectra;

// Re-exports
pub use analytic::AnalyticSolver;
pub use constants::{exit_codes, keys, DEFAULT_LMAX, DEFAULT_P_K_MAX_INV_MPC, OUTPUT_DIRECTIVE};
pub use params::{ParamValue, ParameterSet};
pub use settings::{ForwardConfig, OutputSettings, SolverSettings, SpectrumSource};
pub use solver::{CosmologySolver, SolverError, SolverFactory, Stage};
pub use spectra::Spectra;

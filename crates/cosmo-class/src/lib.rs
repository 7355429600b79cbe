//! # cosmo-class
//!
//! A `CosmologySolver` session that drives the CLASS Boltzmann code through
//! its command-line program: `.ini` rendering, process execution, and
//! parsing of the C_l and background tables it writes.

pub mod ini;
pub mod solver;
pub mod table;

pub use solver::{ClassSolver, CLASS_BIN_ENV, DEFAULT_CLASS_BIN};
pub use table::Table;

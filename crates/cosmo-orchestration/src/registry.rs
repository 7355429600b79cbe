//! Solver factory and backend selection.

use std::path::PathBuf;

use cosmo_class::ClassSolver;
use cosmo_core::analytic::AnalyticSolver;
use cosmo_core::solver::{CosmologySolver, SolverError, SolverFactory};

/// Default factory: the in-process analytic solver and the CLASS executable.
pub struct DefaultFactory {
    class_binary: Option<PathBuf>,
}

impl DefaultFactory {
    /// Create a factory; CLASS sessions locate the executable from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self { class_binary: None }
    }

    /// Create a factory whose CLASS sessions run the given executable.
    #[must_use]
    pub fn with_class_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            class_binary: Some(binary.into()),
        }
    }

    fn create_solver(&self, name: &str) -> Result<Box<dyn CosmologySolver>, SolverError> {
        match name {
            "analytic" => Ok(Box::new(AnalyticSolver::new())),
            "class" => Ok(Box::new(match &self.class_binary {
                Some(binary) => ClassSolver::new(binary.clone()),
                None => ClassSolver::from_env(),
            })),
            _ => Err(SolverError::Configuration(format!("unknown solver: {name}"))),
        }
    }
}

impl Default for DefaultFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverFactory for DefaultFactory {
    fn create(&self, name: &str) -> Result<Box<dyn CosmologySolver>, SolverError> {
        let session = self.create_solver(name)?;
        tracing::debug!(solver = name, "created session");
        Ok(session)
    }

    fn available(&self) -> Vec<&str> {
        vec!["analytic", "class"]
    }
}

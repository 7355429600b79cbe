//! # cosmo-orchestration
//!
//! Forward pass orchestration, serialized shared sessions, solver
//! selection, and parallel batch evaluation.

pub mod interfaces;
pub mod orchestrator;
pub mod registry;

pub use interfaces::{EvaluationResult, ProgressReporter, ResultPresenter};
pub use orchestrator::{
    evaluate_batch, forward, forward_pass, placeholder_objective, summarize_batch, BatchSummary,
    ForwardPass, SharedSession,
};
pub use registry::DefaultFactory;

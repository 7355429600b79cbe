//! Error handling and exit codes.

use cosmo_core::constants::exit_codes;
use cosmo_core::solver::SolverError;

/// Exit code for an application error: the code of the underlying solver
/// error, or the generic code when there is none.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SolverError>())
        .map_or(exit_codes::ERROR_GENERIC, SolverError::exit_code)
}

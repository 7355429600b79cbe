//! Integration test harness for the cosmoforward workspace.
//!
//! The tests live under `tests/`; this crate only exists to host them.

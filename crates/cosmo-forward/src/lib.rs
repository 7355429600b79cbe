//! cosmo-forward library: application logic for the forward-pass driver.

pub mod app;
pub mod config;
pub mod errors;
pub mod logging;

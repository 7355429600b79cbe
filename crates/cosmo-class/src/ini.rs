//! Rendering of CLASS `.ini` input files.

use std::fmt::Write as _;

use cosmo_core::params::ParameterSet;

/// Inputs the driver owns; caller values for these are replaced.
pub const RESERVED: [&str; 5] = ["root", "overwrite_root", "write_background", "format", "headers"];

/// Render the configuration plus the driver's output directives.
#[must_use]
pub fn render(config: &ParameterSet, root: &str) -> String {
    let mut out = String::new();
    for (name, value) in config.iter().filter(|(name, _)| !RESERVED.contains(name)) {
        let _ = writeln!(out, "{name} = {value}");
    }
    let _ = writeln!(out, "root = {root}");
    out.push_str("overwrite_root = yes\n");
    out.push_str("write_background = yes\n");
    out.push_str("format = class\n");
    out.push_str("headers = yes\n");
    out
}

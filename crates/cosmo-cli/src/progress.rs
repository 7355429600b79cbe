//! Batch progress display.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use cosmo_orchestration::interfaces::ProgressReporter;

/// Progress bar advanced once per finished forward pass.
pub struct BatchProgressBar {
    bar: ProgressBar,
}

impl BatchProgressBar {
    /// Create a bar for `total` passes, drawn to stderr.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self::with_target(total, ProgressDrawTarget::stderr())
    }

    /// Create a bar that never draws.
    #[must_use]
    pub fn hidden(total: usize) -> Self {
        Self::with_target(total, ProgressDrawTarget::hidden())
    }

    fn with_target(total: usize, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} passes (eta {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(200));
        Self { bar }
    }

    /// Passes reported so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressReporter for BatchProgressBar {
    fn report(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn complete(&self) {
        self.bar.finish_and_clear();
    }
}

//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// All three methods write to stderr and are suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            eprintln!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.ctx.warn(message);
    }
}

/// Reporter that drives a spinner: steps replace the spinner message and
/// success finishes it.
pub struct SpinnerReporter<'a> {
    pb: &'a indicatif::ProgressBar,
}

impl<'a> SpinnerReporter<'a> {
    #[must_use]
    pub fn new(pb: &'a indicatif::ProgressBar) -> Self {
        Self { pb }
    }
}

impl ProgressReporter for SpinnerReporter<'_> {
    fn step(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn success(&self, message: &str) {
        crate::output::progress::finish_ok(self.pb, message);
    }

    fn warn(&self, message: &str) {
        self.pb.suspend(|| eprintln!("  {} {message}", "⚠".yellow()));
    }
}

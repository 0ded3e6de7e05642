//! `TerminalReporter`, the presentation-layer implementation of `ProgressReporter`.
//!
//! Copies the stylesheet and quiet flag out of an `OutputContext` so the
//! reporter can be shared with the background log tail task.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, Styles};

/// Terminal progress reporter.
///
/// - `say()` prints the line as-is (staging log output, separators)
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// Everything is suppressed when quiet.
pub struct TerminalReporter {
    styles: Styles,
    quiet: bool,
}

impl TerminalReporter {
    /// Create a reporter styled like the given output context.
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self {
            styles: ctx.styles,
            quiet: ctx.quiet,
        }
    }
}

impl ProgressReporter for TerminalReporter {
    fn say(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn step(&self, message: &str) {
        if !self.quiet {
            println!("  {} {message}", "→".style(self.styles.step));
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            println!("  {} {message}", "✓".style(self.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        if !self.quiet {
            println!("  {} {message}", "!".style(self.styles.warning));
        }
    }
}

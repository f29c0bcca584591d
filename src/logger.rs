//! Diagnostic logging, gated on the `loggingActive` setting.

use colored::*;

/// Prints a diagnostic line when logging is enabled. Environment-probe
/// failures and skipped regenerations are reported only through here.
pub fn log(active: bool, message: &str) {
    if active {
        println!("{} {}", "[ccrun]".dimmed(), message);
    }
}

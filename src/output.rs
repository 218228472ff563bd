//! Colored progress output
//!
//! Uses owo-colors for terminal colors. Progress goes to stdout, warnings
//! to stderr.

use owo_colors::OwoColorize;

/// Width of the separator printed around each source.
pub const RULE_WIDTH: usize = 75;

/// Print an action header (blue, bold)
/// Example: "==> Getting extra source packages"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print an action with a source counter
/// Example: "(1/2) Extra source: cfe"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    println!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message.bold()
    );
}

/// Print a labelled value, labels right-aligned
/// Example: "    work dir: /opt/conda-bld/llvm_1/work"
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:>10}: {}", label.cyan(), value);
}

/// Print a detail line (dimmed)
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a separator line
pub fn rule() {
    println!("{}", "-".repeat(RULE_WIDTH).dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use rust_decimal::Decimal;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print total line (bold)
pub fn total(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().bold());
}

/// Print plain output (no color, for data/JSON)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Variance cell: green above baseline, red below, dimmed when undefined.
pub fn variance_cell(variance: Option<Decimal>, width: usize) -> String {
    match variance {
        Some(v) => {
            let cell = format!("{:>width$}", format!("{:.2}%", v), width = width);
            if v.is_sign_positive() && !v.is_zero() {
                cell.green().to_string()
            } else if v.is_sign_negative() && !v.is_zero() {
                cell.red().to_string()
            } else {
                cell
            }
        }
        None => format!("{:>width$}", "n/a", width = width).dimmed().to_string(),
    }
}

//! Parsing of raw edit strings into engine requests
//!
//! `id=1600` replaces a value, `id=+10%` / `id=-5%` / `id=10%` scale it.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::application::services::Edit;
use crate::cli::error::CliError;

fn edit_regex() -> &'static Regex {
    static EDIT_REGEX: OnceLock<Regex> = OnceLock::new();
    EDIT_REGEX.get_or_init(|| {
        Regex::new(r"^\s*([^=\s]+)\s*=\s*([+-]?\d+(?:\.\d+)?)\s*(%)?\s*$")
            .expect("edit pattern is a valid regex")
    })
}

/// Parse one `id=value` or `id=±pct%` edit.
pub fn parse_edit(input: &str) -> Result<Edit, CliError> {
    let invalid = |reason: &str| CliError::InvalidEdit {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let caps = edit_regex()
        .captures(input)
        .ok_or_else(|| invalid("expected id=value or id=+pct%"))?;

    let id = caps[1].to_string();
    let amount = Decimal::from_str(caps[2].trim_start_matches('+'))
        .map_err(|e| invalid(&e.to_string()))?;

    Ok(match caps.get(3) {
        Some(_) => Edit::percent(id, amount),
        None => Edit::absolute(id, amount),
    })
}

/// Parse all edits, rejecting the batch on the first malformed one.
pub fn parse_edits(inputs: &[String]) -> Result<Vec<Edit>, CliError> {
    inputs.iter().map(|s| parse_edit(s)).collect()
}

//! Rendering of allocation reports as text

use rust_decimal::Decimal;

use crate::application::services::AllocationReport;

const INDENT: usize = 2;
const NUMBER_WIDTH: usize = 12;

/// Plain variance cell, right aligned.
pub fn plain_variance(variance: Option<Decimal>, width: usize) -> String {
    match variance {
        Some(v) => format!("{:>width$}", format!("{:.2}%", v), width = width),
        None => format!("{:>width$}", "n/a", width = width),
    }
}

/// Table lines: header, one line per row in pre-order, then the grand total.
///
/// Internal nodes are marked with `▶`, labels are indented by depth.
pub fn table_lines(
    report: &AllocationReport,
    variance_cell: impl Fn(Option<Decimal>, usize) -> String,
) -> Vec<String> {
    let labels: Vec<String> = report
        .rows
        .iter()
        .map(|row| {
            let marker = if row.has_children { "▶ " } else { "" };
            format!("{}{}{}", " ".repeat(row.depth * INDENT), marker, row.label)
        })
        .collect();
    let label_width = labels
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once("Grand Total".len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(report.rows.len() + 2);
    lines.push(format!(
        "{:<lw$}  {:>nw$}  {:>nw$}  {:>nw$}",
        "Label",
        "Value",
        "Baseline",
        "Variance",
        lw = label_width,
        nw = NUMBER_WIDTH
    ));
    for (row, label) in report.rows.iter().zip(&labels) {
        let pad = label_width.saturating_sub(label.chars().count());
        lines.push(format!(
            "{}{}  {:>nw$}  {:>nw$}  {}",
            label,
            " ".repeat(pad),
            format!("{:.2}", row.value),
            format!("{:.2}", row.baseline),
            variance_cell(row.variance, NUMBER_WIDTH),
            nw = NUMBER_WIDTH
        ));
    }
    lines.push(format!(
        "{:<lw$}  {:>nw$}",
        "Grand Total",
        format!("{:.2}", report.grand_total),
        lw = label_width,
        nw = NUMBER_WIDTH
    ));
    lines
}

//! Text rendering for the diagnostic log and the machine-readable run summary.
//!
//! Matrices are printed one row per line with right-aligned, fixed-precision columns.
//! Exact zeros are printed as a bare `0`, which keeps triangular factors and sparse
//! results easy to scan.

use crate::checks::CheckReport;
use faer::MatRef;
use serde::Serialize;

/// Width of one printed matrix column.
const COLUMN_WIDTH: usize = 11;
/// Digits printed after the decimal point.
const PRECISION: usize = 4;

/// Renders `m` as text, one row per line, each line terminated by `\n`.
pub fn format_matrix(m: MatRef<'_, f64>) -> String {
    let mut out = String::with_capacity(m.nrows() * (m.ncols() * COLUMN_WIDTH + 1));
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            let value = m[(i, j)];
            let cell = if value == 0.0 {
                format!("{:>width$}", "0", width = COLUMN_WIDTH)
            } else {
                format!(
                    "{:>width$.prec$}",
                    value,
                    width = COLUMN_WIDTH,
                    prec = PRECISION
                )
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out
}

/// Renders a slice as a column vector, in the same layout as [`format_matrix`].
pub fn format_column(values: &[f64]) -> String {
    let column = faer::Mat::from_fn(values.len(), 1, |i, _| values[i]);
    format_matrix(column.as_ref())
}

/// One row of the CSV run summary.
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryRecord {
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

impl From<&CheckReport> for SummaryRecord {
    fn from(report: &CheckReport) -> Self {
        Self {
            check: report.check.name().to_string(),
            passed: report.outcome.is_passed(),
            detail: report.outcome.detail().to_string(),
        }
    }
}

/// Writes one CSV row per executed check, with a header line.
pub fn write_summary<W: std::io::Write>(
    writer: W,
    reports: &[CheckReport],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for report in reports {
        writer.serialize(SummaryRecord::from(report))?;
    }
    writer.flush()?;
    Ok(())
}

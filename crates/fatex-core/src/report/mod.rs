//! Report emission: per-invoice spreadsheets, the aggregate upload
//! pair, and the error report.

mod spreadsheet;
mod upload;

pub use spreadsheet::{build_report_rows, write_invoice_report, ReportRow, REPORT_COLUMNS};
pub use upload::{write_error_report, UploadManifest, UploadWriter};

use crate::error::ReportError;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

//! Per-invoice spreadsheet emission in the fixed upload template.

use std::path::Path;

use serde::Serialize;

use super::Result;
use crate::invoice::rules::amounts::format_turkish_amount;
use crate::invoice::rules::vat::calculate_gross;
use crate::models::invoice::InvoiceRecord;
use crate::transactions::TransactionBook;

/// Column headers of the upload template. The spelling, including
/// DESCTRIPTION, is fixed by the receiving system.
pub const REPORT_COLUMNS: [&str; 7] = [
    "PLAKA",
    "RENTAL VEHICLE BRAND AND MODEL",
    "toplam ft.tutari",
    "GROSS",
    "DATE",
    "DESCTRIPTION",
    "INVOICE",
];

/// One row of the upload template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub plate: String,
    pub vehicle: String,
    pub net: String,
    pub gross: String,
    pub date: String,
    pub description: String,
    pub invoice: String,
}

/// Build report rows for an invoice.
///
/// With matching transaction rows, one report row is emitted per
/// transaction (plate and vehicle enriched, gross derived from the
/// row's rent total and the PDF VAT rate). Without them a single row
/// carries the PDF-extracted amounts. Financial figures always come
/// from the PDF-sourced rate and are rendered as extracted, flagged
/// discrepancies included.
pub fn build_report_rows(
    record: &InvoiceRecord,
    transactions: Option<&TransactionBook>,
) -> Vec<ReportRow> {
    let date = record
        .invoice_date
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_default();
    let description = record.product_code.display().to_string();
    let invoice = record.invoice_number.clone().unwrap_or_default();

    let matched: Vec<_> = match (transactions, record.invoice_number.as_deref()) {
        (Some(book), Some(number)) => book.rows_for_invoice(number),
        _ => Vec::new(),
    };

    if matched.is_empty() {
        return vec![ReportRow {
            plate: String::new(),
            vehicle: String::new(),
            net: format_turkish_amount(record.net_amount),
            gross: format_turkish_amount(record.reconciliation.computed_gross),
            date,
            description,
            invoice,
        }];
    }

    matched
        .into_iter()
        .map(|row| ReportRow {
            plate: row.plate.clone(),
            vehicle: row.vehicle.clone(),
            net: format_turkish_amount(row.rent_total),
            gross: format_turkish_amount(calculate_gross(row.rent_total, record.vat_rate)),
            date: date.clone(),
            description: description.clone(),
            invoice: invoice.clone(),
        })
        .collect()
}

/// Write rows to a CSV file with the template headers.
pub fn write_invoice_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        writer.write_record([
            &row.plate,
            &row.vehicle,
            &row.net,
            &row.gross,
            &row.date,
            &row.description,
            &row.invoice,
        ])?;
    }

    writer.flush().map_err(std::io::Error::from)?;
    Ok(())
}

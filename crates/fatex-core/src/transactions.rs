//! Transaction file loading and invoice enrichment.
//!
//! The transaction file is a CSV export whose headers drift between
//! deliveries, so columns are discovered by keyword rather than by
//! exact name. Transaction rows only ever enrich the report; financial
//! fields extracted from the PDF are never overridden.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TransactionError;
use crate::invoice::rules::amounts::parse_turkish_amount;

/// Result type for transaction operations.
pub type Result<T> = std::result::Result<T, TransactionError>;

/// A single row from the transaction file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Vehicle plate.
    pub plate: String,

    /// Vehicle brand and model.
    pub vehicle: String,

    /// Total rent amount for the row (net).
    pub rent_total: Decimal,

    /// Invoice number the row belongs to, when the file carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

/// Loaded transaction file with rows indexed for invoice matching.
#[derive(Debug, Clone, Default)]
pub struct TransactionBook {
    rows: Vec<TransactionRow>,
    /// Whether the source file carried an invoice-number column.
    has_invoice_column: bool,
}

/// Discovered positions of the columns of interest.
struct ColumnMap {
    plate: usize,
    vehicle: usize,
    rent_total: usize,
    invoice: Option<usize>,
}

impl ColumnMap {
    /// Locate columns by header keyword.
    fn discover(headers: &csv::StringRecord) -> Result<Self> {
        let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();

        let find = |keywords: &[&str]| {
            upper
                .iter()
                .position(|h| keywords.iter().all(|k| h.contains(k)))
        };

        let plate = find(&["PLATE"])
            .or_else(|| find(&["PLAKA"]))
            .ok_or_else(|| TransactionError::MissingColumn("plate".to_string()))?;

        let vehicle = find(&["BRAND"])
            .or_else(|| find(&["MODEL"]))
            .ok_or_else(|| TransactionError::MissingColumn("vehicle brand".to_string()))?;

        let rent_total = find(&["RENT", "TOTAL"])
            .or_else(|| find(&["TUTAR"]))
            .ok_or_else(|| TransactionError::MissingColumn("rent total".to_string()))?;

        let invoice = find(&["INVOICE"]).or_else(|| find(&["FATURA"]));

        Ok(Self {
            plate,
            vehicle,
            rent_total,
            invoice,
        })
    }
}

impl TransactionBook {
    /// Load a transaction CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| TransactionError::Read(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| TransactionError::Read(e.to_string()))?
            .clone();
        let columns = ColumnMap::discover(&headers)?;

        if columns.invoice.is_none() {
            warn!("Transaction file has no invoice column; rows cannot be matched to invoices");
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TransactionError::Read(e.to_string()))?;

            let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();

            let rent_raw = cell(columns.rent_total);
            if rent_raw.is_empty() {
                // Trailing summary/blank rows are common in these exports
                continue;
            }
            let rent_total =
                parse_turkish_amount(&rent_raw).ok_or_else(|| TransactionError::Parse {
                    column: "rent total".to_string(),
                    value: rent_raw,
                })?;

            rows.push(TransactionRow {
                plate: cell(columns.plate),
                vehicle: cell(columns.vehicle),
                rent_total,
                invoice_number: columns
                    .invoice
                    .map(|idx| cell(idx))
                    .filter(|v| !v.is_empty()),
            });
        }

        debug!("Loaded {} transaction rows from {}", rows.len(), path.display());

        Ok(Self {
            has_invoice_column: columns.invoice.is_some(),
            rows,
        })
    }

    /// All rows in file order.
    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    /// Whether rows can be matched to invoices at all.
    pub fn has_invoice_column(&self) -> bool {
        self.has_invoice_column
    }

    /// Rows belonging to the given invoice number.
    pub fn rows_for_invoice(&self, invoice_number: &str) -> Vec<&TransactionRow> {
        self.rows
            .iter()
            .filter(|r| r.invoice_number.as_deref() == Some(invoice_number))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::str::FromStr;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_match() {
        let file = write_csv(
            "PLATE NO,VEHICLE BRAND,RENT TOTAL,INVOICE\n\
             34-KVN-771,MERCEDES-BENZ A 200 SEDAN,\"36.885,00\",PFS2025000001235\n\
             06-ABC-123,FORD FOCUS,\"12.500,00\",PFS2025000001236\n",
        );

        let book = TransactionBook::load(file.path()).unwrap();
        assert_eq!(book.rows().len(), 2);
        assert!(book.has_invoice_column());

        let matched = book.rows_for_invoice("PFS2025000001235");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].plate, "34-KVN-771");
        assert_eq!(
            matched[0].rent_total,
            Decimal::from_str("36885.00").unwrap()
        );

        assert!(book.rows_for_invoice("PFS0000000000000").is_empty());
    }

    #[test]
    fn test_header_drift() {
        // Turkish headers from an alternate export
        let file = write_csv(
            "PLAKA,MARKA MODEL,TOPLAM FT.TUTARI\n\
             34-KVN-771,RENAULT CLIO,\"9.000,00\"\n",
        );

        let book = TransactionBook::load(file.path()).unwrap();
        assert_eq!(book.rows().len(), 1);
        assert!(!book.has_invoice_column());
        assert!(book.rows()[0].invoice_number.is_none());
    }

    #[test]
    fn test_missing_required_column() {
        let file = write_csv("SOMETHING,ELSE\n1,2\n");
        let err = TransactionBook::load(file.path()).unwrap_err();
        assert!(matches!(err, TransactionError::MissingColumn(c) if c == "plate"));
    }

    #[test]
    fn test_blank_rent_rows_skipped() {
        let file = write_csv(
            "PLATE,BRAND,RENT TOTAL\n\
             34-KVN-771,FIAT EGEA,\"5.000,00\"\n\
             ,,\n",
        );

        let book = TransactionBook::load(file.path()).unwrap();
        assert_eq!(book.rows().len(), 1);
    }

    #[test]
    fn test_unparseable_rent_fails() {
        let file = write_csv("PLATE,BRAND,RENT TOTAL\nX,Y,abc\n");
        let err = TransactionBook::load(file.path()).unwrap_err();
        assert!(matches!(err, TransactionError::Parse { .. }));
    }
}

//! Aggregate upload pair and error report emission.
//!
//! The upload pair is a CSV (one row per invoice) plus a companion
//! manifest with a proprietary extension (`.fatx`, XML inside) that
//! the receiving system uses to validate the batch.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Result;
use crate::models::invoice::InvoiceRecord;

/// Companion manifest describing the upload batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "uploadManifest")]
pub struct UploadManifest {
    /// Manifest format version.
    #[serde(rename = "@version")]
    pub version: String,

    /// RFC 3339 timestamp of batch generation.
    pub generated_at: String,

    /// Currency of all amounts in the batch.
    pub currency: String,

    /// Number of invoices in the upload CSV.
    pub invoice_count: usize,

    /// Number of invoices flagged with a reconciliation discrepancy.
    pub discrepancy_count: usize,

    /// Sum of net amounts.
    pub total_net: String,

    /// Sum of computed gross amounts.
    pub total_gross: String,
}

/// Writes the aggregate upload pair.
pub struct UploadWriter {
    csv_path: PathBuf,
    manifest_path: PathBuf,
    currency: String,
}

impl UploadWriter {
    /// Create a writer emitting `<stem>.csv` and `<stem>.fatx` in the
    /// given directory.
    pub fn new(output_dir: &Path, stem: &str, currency: impl Into<String>) -> Self {
        Self {
            csv_path: output_dir.join(format!("{}.csv", stem)),
            manifest_path: output_dir.join(format!("{}.fatx", stem)),
            currency: currency.into(),
        }
    }

    /// Path of the upload CSV.
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Path of the companion manifest.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Write both files for the given records.
    pub fn write(&self, records: &[InvoiceRecord]) -> Result<()> {
        self.write_csv(records)?;
        self.write_manifest(records)?;
        Ok(())
    }

    fn write_csv(&self, records: &[InvoiceRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.csv_path)?;

        writer.write_record([
            "source",
            "invoice_number",
            "invoice_date",
            "product_code",
            "net_amount",
            "vat_rate",
            "computed_gross",
            "stated_gross",
            "discrepancy",
        ])?;

        for record in records {
            writer.write_record([
                record.source.as_str(),
                record.invoice_number.as_deref().unwrap_or(""),
                &record
                    .invoice_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                record.product_code.display(),
                &record.net_amount.to_string(),
                &record.vat_rate.to_string(),
                &record.reconciliation.computed_gross.to_string(),
                &record
                    .reconciliation
                    .stated_gross
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                if record.reconciliation.discrepancy {
                    "true"
                } else {
                    "false"
                },
            ])?;
        }

        writer.flush().map_err(std::io::Error::from)?;
        Ok(())
    }

    fn write_manifest(&self, records: &[InvoiceRecord]) -> Result<()> {
        use crate::error::ReportError;
        use rust_decimal::Decimal;

        let total_net: Decimal = records.iter().map(|r| r.net_amount).sum();
        let total_gross: Decimal = records
            .iter()
            .map(|r| r.reconciliation.computed_gross)
            .sum();

        let manifest = UploadManifest {
            version: "1".to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            currency: self.currency.clone(),
            invoice_count: records.len(),
            discrepancy_count: records
                .iter()
                .filter(|r| r.reconciliation.discrepancy)
                .count(),
            total_net: total_net.to_string(),
            total_gross: total_gross.to_string(),
        };

        let xml = quick_xml::se::to_string(&manifest)
            .map_err(|e| ReportError::Manifest(e.to_string()))?;

        std::fs::write(&self.manifest_path, xml).map_err(ReportError::Io)?;
        Ok(())
    }
}

/// Write the per-invoice error report: one row per failed file.
pub fn write_error_report(path: &Path, failures: &[(String, String)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["source", "error"])?;
    for (source, error) in failures {
        writer.write_record([source, error])?;
    }

    writer.flush().map_err(std::io::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::models::invoice::{ProductCode, Reconciliation, SourceKind};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(source: &str, discrepancy: bool) -> InvoiceRecord {
        InvoiceRecord {
            source: source.to_string(),
            invoice_number: Some("PFS2025000001235".to_string()),
            invoice_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            product_code: ProductCode::Leasing,
            net_amount: dec("1000.00"),
            vat_rate: dec("0.20"),
            reconciliation: Reconciliation {
                computed_gross: dec("1200.00"),
                stated_gross: Some(if discrepancy { dec("1150.00") } else { dec("1200.00") }),
                difference: if discrepancy { dec("-50.00") } else { Decimal::ZERO },
                discrepancy,
            },
            source_kind: SourceKind::TextPdf,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_upload_pair() {
        let dir = tempfile::tempdir().unwrap();
        let writer = UploadWriter::new(dir.path(), "upload", "TRY");

        let records = vec![record("a.pdf", false), record("b.pdf", true)];
        writer.write(&records).unwrap();

        let csv_content = std::fs::read_to_string(writer.csv_path()).unwrap();
        let lines: Vec<&str> = csv_content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("a.pdf"));
        assert!(lines[1].ends_with("false"));
        assert!(lines[2].contains("b.pdf"));
        assert!(lines[2].ends_with("true"));
        // Discrepant values are preserved, not corrected
        assert!(lines[2].contains("1150.00"));

        let manifest = std::fs::read_to_string(writer.manifest_path()).unwrap();
        assert!(manifest.contains("<invoice_count>2</invoice_count>"));
        assert!(manifest.contains("<discrepancy_count>1</discrepancy_count>"));
        assert!(manifest.contains("<total_net>2000.00</total_net>"));
        assert!(manifest.contains("<total_gross>2400.00</total_gross>"));
        assert!(manifest.contains("<currency>TRY</currency>"));
    }

    #[test]
    fn test_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");

        write_error_report(
            &path,
            &[("bad.pdf".to_string(), "missing required field: net amount".to_string())],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("source,error\n"));
        assert!(content.contains("bad.pdf"));
        assert!(content.contains("net amount"));
    }
}

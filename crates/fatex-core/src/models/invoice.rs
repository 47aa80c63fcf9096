//! Invoice record model for Partner Fillo leasing invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fully extracted and reconciled invoice.
///
/// One record is produced per PDF and owned independently; records are
/// immutable after extraction apart from transaction enrichment, which
/// only appends report columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Source file name, for per-invoice reporting.
    pub source: String,

    /// Invoice number (e.g. "PFS2025000001235").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Invoice issue date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Product code derived from the last-page trigger text.
    pub product_code: ProductCode,

    /// Net amount (pre-tax subtotal), always PDF-sourced.
    pub net_amount: Decimal,

    /// VAT rate as a decimal fraction (e.g. 0.20), always PDF-sourced.
    pub vat_rate: Decimal,

    /// Reconciliation of computed versus stated gross.
    pub reconciliation: Reconciliation,

    /// How the text was acquired.
    pub source_kind: SourceKind,

    /// Non-fatal issues noticed during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Classification label derived from invoice trigger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCode {
    /// "Line-1" trigger present: vehicle leasing.
    Leasing,
    /// "Line-2" trigger present: general expenses.
    GenExp,
    /// Neither trigger found.
    Unknown,
}

impl Default for ProductCode {
    fn default() -> Self {
        Self::Unknown
    }
}

impl ProductCode {
    /// Label used in the report template.
    pub fn display(&self) -> &'static str {
        match self {
            ProductCode::Leasing => "Leasing",
            ProductCode::GenExp => "GEN. EXP",
            ProductCode::Unknown => "UNKNOWN",
        }
    }
}

/// Outcome of comparing the computed gross against the PDF-stated total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reconciliation {
    /// net × (1 + vat_rate), quantized to 2 decimal places.
    pub computed_gross: Decimal,

    /// Payable total as stated on the PDF, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stated_gross: Option<Decimal>,

    /// stated − computed; zero when no stated total exists.
    pub difference: Decimal,

    /// True when the difference exceeds both tolerances.
    pub discrepancy: bool,
}

/// How the invoice text was acquired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Text-based PDF (native text extraction).
    TextPdf,
    /// Scanned PDF, text recovered via the external OCR service.
    OcrPdf,
    /// Rule extraction supplemented by the LLM fallback.
    LlmAssisted,
    /// Unknown source.
    #[default]
    Unknown,
}

impl InvoiceRecord {
    /// Validate the record and return any issues found.
    ///
    /// These are review-level observations, not errors: a record with
    /// issues is still emitted so a human can inspect it.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.invoice_number.is_none() {
            issues.push("Missing invoice number".to_string());
        }

        if self.invoice_date.is_none() {
            issues.push("Missing invoice date".to_string());
        }

        if self.product_code == ProductCode::Unknown {
            issues.push("Product code could not be determined".to_string());
        }

        if self.net_amount <= Decimal::ZERO {
            issues.push("Net amount is not positive".to_string());
        }

        if self.reconciliation.discrepancy {
            issues.push(format!(
                "Stated total {} differs from computed gross {}",
                self.reconciliation
                    .stated_gross
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                self.reconciliation.computed_gross
            ));
        }

        issues
    }
}

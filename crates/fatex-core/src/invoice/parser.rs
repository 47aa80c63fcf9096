//! Rule-based invoice parser for the Partner Fillo format.

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::llm::SummaryFields;
use crate::models::invoice::{InvoiceRecord, ProductCode, SourceKind};
use crate::reconcile::Reconciler;

use super::rules::{
    amounts::{extract_net_amount, extract_stated_total},
    dates::extract_invoice_date,
    patterns::{INVOICE_NUMBER, INVOICE_NUMBER_STANDALONE},
    product::extract_product_code,
    vat::extract_vat_rate,
};
use super::Result;

/// Result of invoice extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted and reconciled invoice record.
    pub record: InvoiceRecord,
    /// Raw text the record was extracted from.
    pub raw_text: String,
    /// Extraction warnings (also carried on the record).
    pub warnings: Vec<String>,
}

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse an invoice from its full text and last-page text.
    fn parse(&self, source: &str, full_text: &str, last_page_text: &str)
        -> Result<ExtractionResult>;
}

/// Rule-based parser for Partner Fillo invoice text.
pub struct InvoiceTextParser {
    reconciler: Reconciler,
    /// Fail extraction when no product code trigger is found.
    require_product_code: bool,
}

impl InvoiceTextParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            reconciler: Reconciler::new(),
            require_product_code: false,
        }
    }

    /// Use a specific reconciler (tolerances from configuration).
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Treat a missing product code as an extraction failure.
    pub fn with_required_product_code(mut self, required: bool) -> Self {
        self.require_product_code = required;
        self
    }

    fn extract_invoice_number(&self, text: &str) -> Option<String> {
        // Labeled pattern first, then the bare PFS number
        if let Some(caps) = INVOICE_NUMBER.captures(text) {
            return Some(caps[1].trim().to_string());
        }

        if let Some(caps) = INVOICE_NUMBER_STANDALONE.captures(text) {
            return Some(caps[1].to_string());
        }

        None
    }

    /// Parse invoice text, optionally filling gaps from LLM summary
    /// fields. PDF-sourced values always win; summary values are used
    /// only where the rules found nothing.
    pub fn parse_with_summary(
        &self,
        source: &str,
        full_text: &str,
        last_page_text: &str,
        summary: Option<&SummaryFields>,
    ) -> Result<ExtractionResult> {
        if full_text.trim().is_empty() {
            return Err(ExtractionError::NoData);
        }

        let mut warnings = Vec::new();
        let mut llm_assisted = false;

        info!("Parsing invoice from {} characters of text", full_text.len());

        // Invoice number
        let mut invoice_number = self.extract_invoice_number(full_text);
        if invoice_number.is_none() {
            if let Some(number) = summary.and_then(|s| s.invoice_number.clone()) {
                invoice_number = Some(number);
                llm_assisted = true;
            } else {
                warnings.push("Could not extract invoice number".to_string());
            }
        }

        // Invoice date
        let mut invoice_date = extract_invoice_date(full_text).map(|m| m.value);
        if invoice_date.is_none() {
            if let Some(date) = summary.and_then(|s| s.parsed_date()) {
                invoice_date = Some(date);
                llm_assisted = true;
            } else {
                warnings.push("Could not extract invoice date".to_string());
            }
        }

        // Net amount: hard-required and strictly PDF-sourced. An
        // unparseable value after the label propagates as Parse.
        let net_amount = extract_net_amount(full_text)?
            .map(|m| m.value)
            .ok_or_else(|| ExtractionError::MissingField("net amount".to_string()))?;

        // VAT rate: rules first, LLM fill as a last resort
        let vat_rate = match extract_vat_rate(full_text) {
            Some(m) => m.value,
            None => {
                let rate = summary
                    .and_then(|s| s.vat_rate())
                    .ok_or_else(|| ExtractionError::MissingField("VAT rate".to_string()))?;
                warnings.push("VAT rate taken from LLM summary, not found on PDF".to_string());
                llm_assisted = true;
                rate
            }
        };

        // Stated payable total (optional; missing or unparseable means
        // no reconciliation, recorded as a warning)
        let stated_gross = match extract_stated_total(full_text) {
            Ok(Some(m)) => Some(m.value),
            Ok(None) => {
                warnings.push("No stated payable total found".to_string());
                None
            }
            Err(e) => {
                warnings.push(format!("Stated payable total unusable: {}", e));
                None
            }
        };

        // Product code from the last page triggers
        let product = extract_product_code(last_page_text);
        if product.ambiguous {
            warnings.push("Ambiguous product code triggers on last page".to_string());
        }
        if product.code == ProductCode::Unknown {
            if self.require_product_code {
                return Err(ExtractionError::MissingField("product code".to_string()));
            }
            warnings.push("No product code trigger found".to_string());
        }

        let reconciliation = self.reconciler.reconcile(net_amount, vat_rate, stated_gross);

        let record = InvoiceRecord {
            source: source.to_string(),
            invoice_number,
            invoice_date,
            product_code: product.code,
            net_amount,
            vat_rate,
            reconciliation,
            source_kind: if llm_assisted {
                SourceKind::LlmAssisted
            } else {
                SourceKind::Unknown
            },
            warnings: warnings.clone(),
        };

        debug!(
            "Extracted invoice {:?}: net {}, rate {}, gross {} (discrepancy: {})",
            record.invoice_number,
            record.net_amount,
            record.vat_rate,
            record.reconciliation.computed_gross,
            record.reconciliation.discrepancy
        );

        Ok(ExtractionResult {
            record,
            raw_text: full_text.to_string(),
            warnings,
        })
    }
}

impl Default for InvoiceTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for InvoiceTextParser {
    fn parse(
        &self,
        source: &str,
        full_text: &str,
        last_page_text: &str,
    ) -> Result<ExtractionResult> {
        self.parse_with_summary(source, full_text, last_page_text, None)
    }
}

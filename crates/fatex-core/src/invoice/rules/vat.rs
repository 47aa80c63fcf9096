//! VAT rate extraction and gross calculation.

use rust_decimal::Decimal;

use super::amounts::quantize;
use super::patterns::VAT_RATE;
use super::{ExtractionMatch, FieldExtractor};

/// VAT rate extractor for the "Hesaplanan KDV (%NN)" label.
pub struct VatRateExtractor;

impl VatRateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VatRateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VatRateExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in VAT_RATE.captures_iter(text) {
            let percent: i64 = match caps[1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            // Percentage as a decimal fraction: 20 -> 0.20
            let rate = Decimal::new(percent, 2);
            let full_match = caps.get(0).unwrap();
            results.push(
                ExtractionMatch::new(rate, 0.95, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            );
        }

        results
    }
}

/// Extract the VAT rate from invoice text as a decimal fraction.
pub fn extract_vat_rate(text: &str) -> Option<ExtractionMatch<Decimal>> {
    VatRateExtractor::new().extract(text)
}

/// Gross amount: net × (1 + rate), quantized to 2 decimal places.
pub fn calculate_gross(net: Decimal, rate: Decimal) -> Decimal {
    quantize(net * (Decimal::ONE + rate))
}

//! Invoice date extraction.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, INVOICE_DATE, LABELED_DATE};
use super::{ExtractionMatch, FieldExtractor};

/// Date extractor for the DD-MM-YYYY / DD.MM.YYYY formats used on
/// Turkish invoices.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    ExtractionMatch::new(date, 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Extract the invoice date, preferring the "Fatura Tarihi" label,
/// then a bare "Tarih" label, then any date in the text.
pub fn extract_invoice_date(text: &str) -> Option<ExtractionMatch<NaiveDate>> {
    let extractor = DateExtractor::new();

    if let Some(caps) = INVOICE_DATE.captures(text) {
        if let Some(date) = extractor.extract(&caps[1]) {
            return Some(ExtractionMatch::new(date.value, 0.95, &caps[1]));
        }
    }

    if let Some(caps) = LABELED_DATE.captures(text) {
        if let Some(date) = extractor.extract(&caps[1]) {
            return Some(ExtractionMatch::new(date.value, 0.9, &caps[1]));
        }
    }

    extractor.extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_date_dmy_dashes() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("01-06-2025").unwrap();
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_extract_date_dmy_dots() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("15.01.2024").unwrap();
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_invalid_date_skipped() {
        let extractor = DateExtractor::new();
        assert!(extractor.extract("32-13-2024").is_none());
    }

    #[test]
    fn test_extract_invoice_date_labeled() {
        let text = "Fatura No: PFS2025000001235\nFatura Tarihi: 01-06-2025\nTarih: 05-06-2025";
        let result = extract_invoice_date(text).unwrap();
        // "Fatura Tarihi" wins over the bare "Tarih" label
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_extract_invoice_date_bare_label() {
        let text = "Tarih: 05.06.2025";
        let result = extract_invoice_date(text).unwrap();
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
    }

    #[test]
    fn test_extract_invoice_date_unlabeled_fallback() {
        let text = "düzenleme 12.03.2025 sayfa 1";
        let result = extract_invoice_date(text).unwrap();
        assert_eq!(result.value, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
    }
}

//! Amount extraction and Turkish-locale number parsing.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::{NET_AMOUNT, STATED_TOTAL};
use super::ExtractionMatch;
use crate::error::ExtractionError;
use crate::invoice::Result;

/// Quantize an amount to 2 decimal places, half-up.
pub fn quantize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a Turkish-formatted amount (dots for thousands, comma for
/// decimal): "1.234,56" -> 1234.56, "36.885,00" -> 36885.00.
///
/// A lone dot followed by exactly two digits is read as a decimal
/// point, so OCR output in international format still parses.
pub fn parse_turkish_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if let Some(pos) = cleaned.rfind('.') {
        if cleaned.len() - pos == 3 && cleaned.matches('.').count() == 1 {
            cleaned
        } else {
            cleaned.replace('.', "")
        }
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).ok().map(quantize)
}

/// Format an amount in Turkish style (1.234,56).
pub fn format_turkish_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let (sign, digits) = integer_part
        .strip_prefix('-')
        .map(|d| ("-", d))
        .unwrap_or(("", integer_part));

    let chars: Vec<char> = digits.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}

/// Extract the labeled net amount (Malzeme/Hizmet Toplam Tutarı).
///
/// `Ok(None)` means the label is absent; a label whose adjacent value
/// does not parse as a number is an `ExtractionError::Parse`.
pub fn extract_net_amount(text: &str) -> Result<Option<ExtractionMatch<Decimal>>> {
    extract_labeled_amount(text, &NET_AMOUNT, "net amount")
}

/// Extract the payable total stated on the PDF.
pub fn extract_stated_total(text: &str) -> Result<Option<ExtractionMatch<Decimal>>> {
    extract_labeled_amount(text, &STATED_TOTAL, "stated total")
}

fn extract_labeled_amount(
    text: &str,
    pattern: &regex::Regex,
    field: &str,
) -> Result<Option<ExtractionMatch<Decimal>>> {
    let Some(caps) = pattern.captures(text) else {
        return Ok(None);
    };

    let raw = &caps[1];
    let amount = parse_turkish_amount(raw).ok_or_else(|| ExtractionError::Parse {
        field: field.to_string(),
        value: raw.to_string(),
    })?;
    let full_match = caps.get(0).unwrap();

    Ok(Some(
        ExtractionMatch::new(amount, 0.95, full_match.as_str())
            .with_position(full_match.start(), full_match.end()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_turkish_amount() {
        assert_eq!(parse_turkish_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_turkish_amount("36.885,00"), Some(dec("36885.00")));
        assert_eq!(parse_turkish_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_turkish_amount("1000"), Some(dec("1000.00")));
        assert_eq!(parse_turkish_amount("12.345.678,90"), Some(dec("12345678.90")));
    }

    #[test]
    fn test_parse_international_decimal_dot() {
        // single dot with two trailing digits reads as a decimal point
        assert_eq!(parse_turkish_amount("1234.56"), Some(dec("1234.56")));
        // multiple dots without a comma are thousands separators
        assert_eq!(parse_turkish_amount("1.234.567"), Some(dec("1234567.00")));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(parse_turkish_amount(""), None);
        assert_eq!(parse_turkish_amount("TL"), None);
        assert_eq!(parse_turkish_amount(",."), None);
    }

    #[test]
    fn test_format_turkish_amount() {
        assert_eq!(format_turkish_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_turkish_amount(dec("12345678.90")), "12.345.678,90");
        assert_eq!(format_turkish_amount(dec("0.5")), "0,50");
        assert_eq!(format_turkish_amount(dec("-1234.5")), "-1.234,50");
    }

    #[test]
    fn test_extract_net_amount() {
        let text = "Malzeme/Hizmet Toplam Tutarı: 36.885,00 TL";
        let result = extract_net_amount(text).unwrap().unwrap();
        assert_eq!(result.value, dec("36885.00"));
    }

    #[test]
    fn test_extract_net_amount_ocr_spelling() {
        // OCR renders the dotted ı as a plain n
        let text = "Malzeme/Hizmet Toplam Tutan: 1000";
        let result = extract_net_amount(text).unwrap().unwrap();
        assert_eq!(result.value, dec("1000.00"));
    }

    #[test]
    fn test_extract_stated_total() {
        let text = "Ödenecek Tutar: 1.200,00 TL";
        let result = extract_stated_total(text).unwrap().unwrap();
        assert_eq!(result.value, dec("1200.00"));
    }

    #[test]
    fn test_extract_stated_total_alternate_label() {
        let text = "Vergiler Dahil Toplam Tutar 44.262,00 TL";
        let result = extract_stated_total(text).unwrap().unwrap();
        assert_eq!(result.value, dec("44262.00"));
    }

    #[test]
    fn test_missing_labels() {
        assert!(extract_net_amount("no labels here").unwrap().is_none());
        assert!(extract_stated_total("no labels here").unwrap().is_none());
    }

    #[test]
    fn test_matched_label_with_garbage_value_is_parse_error() {
        let err = extract_net_amount("Malzeme/Hizmet Toplam Tutarı: ,.,").unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Parse { field, value } if field == "net amount" && value == ",.,"
        ));

        let err = extract_stated_total("Ödenecek Tutar: ...").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }
}

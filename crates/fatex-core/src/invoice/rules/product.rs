//! Product code classification from last-page trigger text.

use super::patterns::{LINE1_TRIGGER, LINE2_TRIGGER};
use crate::models::invoice::ProductCode;

/// Result of the trigger scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCodeMatch {
    /// Assigned product code.
    pub code: ProductCode,
    /// True when both triggers were present on the page.
    pub ambiguous: bool,
}

/// Scan last-page text for the Line-1 / Line-2 triggers.
///
/// Line-1 maps to Leasing, Line-2 to GEN. EXP. When both triggers
/// appear the one occurring earlier on the page wins and the match is
/// flagged ambiguous so the caller can record a warning.
pub fn extract_product_code(last_page_text: &str) -> ProductCodeMatch {
    let line1 = LINE1_TRIGGER.find(last_page_text).map(|m| m.start());
    let line2 = LINE2_TRIGGER.find(last_page_text).map(|m| m.start());

    match (line1, line2) {
        (Some(_), None) => ProductCodeMatch {
            code: ProductCode::Leasing,
            ambiguous: false,
        },
        (None, Some(_)) => ProductCodeMatch {
            code: ProductCode::GenExp,
            ambiguous: false,
        },
        (Some(p1), Some(p2)) => ProductCodeMatch {
            code: if p1 <= p2 {
                ProductCode::Leasing
            } else {
                ProductCode::GenExp
            },
            ambiguous: true,
        },
        (None, None) => ProductCodeMatch {
            code: ProductCode::Unknown,
            ambiguous: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line1_only() {
        let result = extract_product_code("araç kiralama bedeli (Line-1)");
        assert_eq!(result.code, ProductCode::Leasing);
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_line2_only() {
        let result = extract_product_code("masraf kalemi (Line-2)");
        assert_eq!(result.code, ProductCode::GenExp);
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_spaced_uppercase_variant() {
        let result = extract_product_code("last page: LINE 1 leasing info");
        assert_eq!(result.code, ProductCode::Leasing);

        let result = extract_product_code("Text with LINE 2 on the final page.");
        assert_eq!(result.code, ProductCode::GenExp);
    }

    #[test]
    fn test_neither_trigger() {
        let result = extract_product_code("nothing relevant here");
        assert_eq!(result.code, ProductCode::Unknown);
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_both_triggers_earlier_wins() {
        let result = extract_product_code("(Line-2) something (Line-1)");
        assert_eq!(result.code, ProductCode::GenExp);
        assert!(result.ambiguous);

        let result = extract_product_code("(Line-1) something (Line-2)");
        assert_eq!(result.code, ProductCode::Leasing);
        assert!(result.ambiguous);
    }

    #[test]
    fn test_trigger_needs_word_boundary() {
        // "Line-10" is not a Line-1 trigger
        let result = extract_product_code("see item Line-10");
        assert_eq!(result.code, ProductCode::Unknown);
    }
}

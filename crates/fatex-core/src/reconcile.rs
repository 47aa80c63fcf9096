//! Reconciliation of computed versus PDF-stated gross amounts.

use rust_decimal::Decimal;
use tracing::debug;

use crate::invoice::rules::vat::calculate_gross;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::Reconciliation;

/// Compares the computed gross against the stated payable total.
///
/// A difference within either the absolute or the relative tolerance
/// clears the flag. Reconciliation never fails; it only populates the
/// record for human review.
#[derive(Debug, Clone)]
pub struct Reconciler {
    tolerance_abs: Decimal,
    tolerance_rel: Decimal,
}

impl Reconciler {
    /// Create a reconciler with the default tolerances.
    pub fn new() -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            tolerance_abs: defaults.tolerance_abs,
            tolerance_rel: defaults.tolerance_rel,
        }
    }

    /// Create a reconciler from the extraction configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            tolerance_abs: config.tolerance_abs,
            tolerance_rel: config.tolerance_rel,
        }
    }

    /// Override both tolerances.
    pub fn with_tolerances(mut self, abs: Decimal, rel: Decimal) -> Self {
        self.tolerance_abs = abs;
        self.tolerance_rel = rel;
        self
    }

    /// Compute gross from net and rate and compare to the stated total.
    pub fn reconcile(
        &self,
        net: Decimal,
        vat_rate: Decimal,
        stated_gross: Option<Decimal>,
    ) -> Reconciliation {
        let computed_gross = calculate_gross(net, vat_rate);

        let Some(stated) = stated_gross else {
            return Reconciliation {
                computed_gross,
                stated_gross: None,
                difference: Decimal::ZERO,
                discrepancy: false,
            };
        };

        let difference = stated - computed_gross;
        let within_abs = difference.abs() <= self.tolerance_abs;
        let within_rel = difference.abs() <= (computed_gross * self.tolerance_rel).abs();
        let discrepancy = !within_abs && !within_rel;

        if discrepancy {
            debug!(
                "Discrepancy: computed {} vs stated {} (diff {})",
                computed_gross, stated, difference
            );
        }

        Reconciliation {
            computed_gross,
            stated_gross: Some(stated),
            difference,
            discrepancy,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_matching_totals() {
        let result = Reconciler::new().reconcile(dec("1000"), dec("0.20"), Some(dec("1200")));

        assert_eq!(result.computed_gross, dec("1200.00"));
        assert_eq!(result.stated_gross, Some(dec("1200")));
        assert_eq!(result.difference, dec("0.00"));
        assert!(!result.discrepancy);
    }

    #[test]
    fn test_discrepancy_flagged() {
        let result = Reconciler::new().reconcile(dec("1000"), dec("0.20"), Some(dec("1150")));

        assert_eq!(result.computed_gross, dec("1200.00"));
        assert_eq!(result.stated_gross, Some(dec("1150")));
        assert_eq!(result.difference, dec("-50.00"));
        assert!(result.discrepancy);
    }

    #[test]
    fn test_within_absolute_tolerance() {
        let result = Reconciler::new().reconcile(dec("1000"), dec("0.20"), Some(dec("1200.03")));
        assert!(!result.discrepancy);
    }

    #[test]
    fn test_within_relative_tolerance() {
        // 0.1% of 1,200,000 is 1,200; a 500 difference passes
        let result =
            Reconciler::new().reconcile(dec("1000000"), dec("0.20"), Some(dec("1200500")));
        assert!(!result.discrepancy);
    }

    #[test]
    fn test_no_stated_total() {
        let result = Reconciler::new().reconcile(dec("1000"), dec("0.20"), None);

        assert_eq!(result.computed_gross, dec("1200.00"));
        assert!(result.stated_gross.is_none());
        assert!(!result.discrepancy);
    }

    #[test]
    fn test_custom_tolerances() {
        let strict = Reconciler::new().with_tolerances(Decimal::ZERO, Decimal::ZERO);
        let result = strict.reconcile(dec("1000"), dec("0.20"), Some(dec("1200.01")));
        assert!(result.discrepancy);

        let lax = Reconciler::new().with_tolerances(dec("100"), Decimal::ZERO);
        let result = lax.reconcile(dec("1000"), dec("0.20"), Some(dec("1250")));
        assert!(!result.discrepancy);
    }
}

use miqat_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cost components a package or booking is priced from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Ticket,
    Hotel,
    Transport,
    Visa,
    Food,
    Ziyarat,
}

/// Passengers on a quote or booking, by fare class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PassengerMix {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl PassengerMix {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.adults) + u64::from(self.children) + u64::from(self.infants)
    }

    /// Infants travel on a lap and do not consume a seat.
    pub fn seats(&self) -> u64 {
        u64::from(self.adults) + u64::from(self.children)
    }
}

/// Per-person prices in minor currency units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaxPrice {
    #[serde(default)]
    pub adult_minor: i64,
    #[serde(default)]
    pub child_minor: i64,
    #[serde(default)]
    pub infant_minor: i64,
}

impl PaxPrice {
    pub fn flat(amount_minor: i64) -> Self {
        Self {
            adult_minor: amount_minor,
            child_minor: amount_minor,
            infant_minor: amount_minor,
        }
    }

    /// `None` when the amount does not fit in `i64`.
    pub fn amount_for(&self, mix: &PassengerMix) -> Option<i64> {
        let adults = self.adult_minor.checked_mul(i64::from(mix.adults))?;
        let children = self.child_minor.checked_mul(i64::from(mix.children))?;
        let infants = self.infant_minor.checked_mul(i64::from(mix.infants))?;
        adults.checked_add(children)?.checked_add(infants)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceComponent {
    pub kind: ComponentKind,
    pub price: PaxPrice,
}

/// Markup and tax applied on top of component sums.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingRules {
    #[serde(default)]
    pub markup_percent: f64,
    #[serde(default)]
    pub tax_percent: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            markup_percent: 0.0,
            tax_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub components: BTreeMap<ComponentKind, i64>,
    pub subtotal_minor: i64,
    pub markup_percent: f64,
    pub markup_minor: i64,
    pub tax_percent: f64,
    pub tax_minor: i64,
    pub total_minor: i64,
}

/// Rolls component amounts up into a priced total
pub struct PricingEngine {
    rules: PricingRules,
}

impl PricingEngine {
    pub fn new(rules: PricingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Sums `lines` per component, then applies markup to the subtotal and tax
    /// to subtotal plus markup. `markup_percent` and `tax_percent` override the
    /// configured rules when given.
    pub fn rollup<I>(
        &self,
        lines: I,
        markup_percent: Option<f64>,
        tax_percent: Option<f64>,
    ) -> CoreResult<PriceBreakdown>
    where
        I: IntoIterator<Item = (ComponentKind, i64)>,
    {
        let mut components: BTreeMap<ComponentKind, i64> = BTreeMap::new();
        for (kind, amount) in lines {
            let entry = components.entry(kind).or_insert(0);
            *entry = entry.checked_add(amount).ok_or_else(|| overflow("component sum"))?;
        }
        let subtotal_minor = components
            .values()
            .try_fold(0i64, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| overflow("subtotal"))?;

        let markup_percent = markup_percent.unwrap_or(self.rules.markup_percent);
        let tax_percent = tax_percent.unwrap_or(self.rules.tax_percent);
        let markup_minor =
            checked_percent_of(subtotal_minor, markup_percent).ok_or_else(|| overflow("markup"))?;
        let taxable_minor = subtotal_minor
            .checked_add(markup_minor)
            .ok_or_else(|| overflow("taxable amount"))?;
        let tax_minor =
            checked_percent_of(taxable_minor, tax_percent).ok_or_else(|| overflow("tax"))?;
        let total_minor = taxable_minor
            .checked_add(tax_minor)
            .ok_or_else(|| overflow("total"))?;

        Ok(PriceBreakdown {
            components,
            subtotal_minor,
            markup_percent,
            markup_minor,
            tax_percent,
            tax_minor,
            total_minor,
        })
    }
}

pub(crate) fn overflow(what: &str) -> CoreError {
    CoreError::ValidationError(format!("{} exceeds the supported amount range", what))
}

/// Percentages are resolved to ten-thousandths of a percent before any money
/// arithmetic.
const PERCENT_SCALE: i128 = 10_000;

/// `percent` percent of `amount`, rounded half up (away from zero) to the
/// minor unit. `None` on overflow or a non-finite percentage.
pub fn checked_percent_of(amount_minor: i64, percent: f64) -> Option<i64> {
    if !percent.is_finite() {
        return None;
    }
    let scaled = (percent * PERCENT_SCALE as f64).round();
    if scaled.abs() >= i64::MAX as f64 {
        return None;
    }
    let product = i128::from(amount_minor).checked_mul(scaled as i128)?;
    let divisor = 100 * PERCENT_SCALE;
    let rounded = (product.abs() + divisor / 2) / divisor;
    i64::try_from(product.signum() * rounded).ok()
}

/// Saturating form of [`checked_percent_of`].
pub fn percent_of(amount_minor: i64, percent: f64) -> i64 {
    checked_percent_of(amount_minor, percent).unwrap_or(if (amount_minor < 0) == (percent < 0.0) {
        i64::MAX
    } else {
        i64::MIN
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pax_price_multiplies_by_class() {
        let price = PaxPrice {
            adult_minor: 10_000,
            child_minor: 7_500,
            infant_minor: 1_000,
        };
        assert_eq!(price.amount_for(&PassengerMix::new(2, 1, 1)), Some(28_500));
    }

    #[test]
    fn test_pax_price_overflow_is_none() {
        let price = PaxPrice::flat(i64::MAX / 2);
        assert_eq!(price.amount_for(&PassengerMix::new(3, 0, 0)), None);
        assert_eq!(PassengerMix::new(u32::MAX, u32::MAX, u32::MAX).total(), 3 * u64::from(u32::MAX));
    }

    #[test]
    fn test_rollup_applies_markup_then_tax() {
        let engine = PricingEngine::new(PricingRules {
            markup_percent: 10.0,
            tax_percent: 5.0,
        });
        let breakdown = engine.rollup(
            vec![
                (ComponentKind::Ticket, 50_000),
                (ComponentKind::Hotel, 30_000),
                (ComponentKind::Ticket, 20_000),
            ],
            None,
            None,
        )
        .unwrap();
        assert_eq!(breakdown.components[&ComponentKind::Ticket], 70_000);
        assert_eq!(breakdown.subtotal_minor, 100_000);
        assert_eq!(breakdown.markup_minor, 10_000);
        assert_eq!(breakdown.tax_minor, 5_500);
        assert_eq!(breakdown.total_minor, 115_500);
    }

    #[test]
    fn test_overrides_replace_configured_rules() {
        let engine = PricingEngine::new(PricingRules {
            markup_percent: 10.0,
            tax_percent: 5.0,
        });
        let breakdown = engine.rollup(vec![(ComponentKind::Visa, 1_000)], Some(0.0), Some(0.0)).unwrap();
        assert_eq!(breakdown.total_minor, 1_000);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent_of(1_005, 10.0), 101);
        assert_eq!(percent_of(1_004, 10.0), 100);
        assert_eq!(percent_of(0, 17.5), 0);
    }

    #[test]
    fn test_fractional_percent_rounds_half_up() {
        assert_eq!(percent_of(1_500, 2.3), 35);
        for amount in [3_500, 5_500, 6_500, 10_500] {
            // Exact halves: amount * 2.3 / 100 ends in .5
            assert_eq!(percent_of(amount, 2.3), (amount * 23 + 500) / 1_000);
        }
        assert_eq!(percent_of(-1_500, 2.3), -35);
        assert_eq!(percent_of(1_000, 0.0001), 0);
        assert_eq!(checked_percent_of(1_000, f64::NAN), None);
    }

    #[test]
    fn test_rollup_overflow_is_validation_error() {
        let engine = PricingEngine::new(PricingRules::default());
        let err = engine
            .rollup(
                vec![(ComponentKind::Ticket, i64::MAX), (ComponentKind::Hotel, 1)],
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = engine
            .rollup(vec![(ComponentKind::Ticket, i64::MAX)], Some(50.0), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}

//! Pure money arithmetic for bundles, carts, coupons and donations.
//!
//! Nothing here touches the database. Rounding to cents happens only in
//! [`bundle_discounted_price`], [`coupon_discount`] and percentage donations;
//! every other value is exact.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{bundle, product, CartLine};
use crate::errors::ServiceError;

/// Bundles sell at 80% of the sum of their parts
pub const BUNDLE_PRICE_FACTOR: Decimal = dec!(0.80);

const HUNDRED: Decimal = dec!(100);

/// Rounds to cents, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn bundle_discounted_price(original_price: Decimal) -> Decimal {
    round_money(original_price * BUNDLE_PRICE_FACTOR)
}

/// Source of unit prices for cart lines
pub trait PriceCatalog {
    fn product(&self, id: Uuid) -> Option<&product::Model>;
    fn bundle(&self, id: Uuid) -> Option<&bundle::Model>;
}

/// Products and bundles loaded up front for one pricing pass
#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    products: HashMap<Uuid, product::Model>,
    bundles: HashMap<Uuid, bundle::Model>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&mut self, product: product::Model) {
        self.products.insert(product.id, product);
    }

    pub fn insert_bundle(&mut self, bundle: bundle::Model) {
        self.bundles.insert(bundle.id, bundle);
    }
}

impl PriceCatalog for CatalogSnapshot {
    fn product(&self, id: Uuid) -> Option<&product::Model> {
        self.products.get(&id)
    }

    fn bundle(&self, id: Uuid) -> Option<&bundle::Model> {
        self.bundles.get(&id)
    }
}

/// `(unit_price - discount) * quantity` for products, `total_price * quantity` for bundles
pub fn cart_line_total<P: PriceCatalog + ?Sized>(
    line: &CartLine,
    catalog: &P,
) -> Result<Decimal, ServiceError> {
    match *line {
        CartLine::Product { id, quantity } => catalog
            .product(id)
            .map(|p| p.effective_unit_price() * Decimal::from(quantity))
            .ok_or_else(|| {
                ServiceError::InvalidState(format!("Cart references missing product {}", id))
            }),
        CartLine::Bundle { id, quantity } => catalog
            .bundle(id)
            .map(|b| b.total_price * Decimal::from(quantity))
            .ok_or_else(|| {
                ServiceError::InvalidState(format!("Cart references missing bundle {}", id))
            }),
    }
}

pub fn cart_total<P: PriceCatalog + ?Sized>(
    lines: &[CartLine],
    catalog: &P,
) -> Result<Decimal, ServiceError> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| Ok(acc + cart_line_total(line, catalog)?))
}

/// `total * percent / 100`, rounded to cents and capped at `total`
pub fn coupon_discount(total: Decimal, percent: Decimal) -> Decimal {
    let raw = round_money(total * percent / HUNDRED);
    raw.max(Decimal::ZERO).min(total)
}

/// How the caller asked to donate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DonationRequest {
    Fixed(Decimal),
    Percentage(Decimal),
    None,
}

impl DonationRequest {
    /// A fixed amount wins over a percentage when both are supplied
    pub fn from_parts(amount: Option<Decimal>, percentage: Option<Decimal>) -> Self {
        match (amount, percentage) {
            (Some(amount), _) => DonationRequest::Fixed(amount),
            (None, Some(pct)) => DonationRequest::Percentage(pct),
            (None, None) => DonationRequest::None,
        }
    }
}

/// Donation computed for a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Donation {
    pub amount: Decimal,
    pub percentage: Option<Decimal>,
}

/// Computes the donation against the pre-discount cart total.
/// Percentage donations are rounded to cents like coupon discounts.
pub fn donation_amount(
    cart_total: Decimal,
    request: DonationRequest,
) -> Result<Donation, ServiceError> {
    match request {
        DonationRequest::Fixed(amount) => {
            if amount < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Donation amount cannot be negative".to_string(),
                ));
            }
            if round_money(amount) != amount {
                return Err(ServiceError::InvalidInput(
                    "Donation amount must be whole cents".to_string(),
                ));
            }
            Ok(Donation {
                amount,
                percentage: None,
            })
        }
        DonationRequest::Percentage(pct) => {
            if pct < Decimal::ZERO || pct > HUNDRED {
                return Err(ServiceError::InvalidInput(
                    "Donation percentage must be between 0 and 100".to_string(),
                ));
            }
            // Charged and stored amounts must agree
            Ok(Donation {
                amount: round_money(cart_total * pct / HUNDRED),
                percentage: Some(pct),
            })
        }
        DonationRequest::None => Ok(Donation {
            amount: Decimal::ZERO,
            percentage: None,
        }),
    }
}

/// What the payment method is charged; the donation is added, not discounted
pub fn charge_total(cart_total: Decimal, discount: Decimal, donation: Decimal) -> Decimal {
    cart_total - discount + donation
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn product(unit_price: Decimal, discount: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Popcorn".into(),
            description: None,
            unit_price,
            discount,
            inventory_quantity: 100,
            is_available: true,
            created_at: Utc::now(),
        }
    }

    fn bundle(total_price: Decimal) -> bundle::Model {
        bundle::Model {
            id: Uuid::new_v4(),
            name: "Movie Night".into(),
            description: None,
            original_price: total_price / BUNDLE_PRICE_FACTOR,
            total_price,
            is_available: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bundle_price_is_eighty_percent_rounded() {
        assert_eq!(bundle_discounted_price(dec!(35.00)), dec!(28.00));
        assert_eq!(bundle_discounted_price(dec!(10.01)), dec!(8.01));
        assert_eq!(bundle_discounted_price(dec!(12.3456)), dec!(9.88));
        assert_eq!(bundle_discounted_price(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn cart_total_sums_products_and_bundles() {
        let soda = product(dec!(4.50), dec!(0.50));
        let combo = bundle(dec!(28.00));
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_product(soda.clone());
        catalog.insert_bundle(combo.clone());

        let lines = vec![
            CartLine::Product {
                id: soda.id,
                quantity: 3,
            },
            CartLine::Bundle {
                id: combo.id,
                quantity: 2,
            },
        ];

        assert_eq!(cart_total(&lines, &catalog).unwrap(), dec!(68.00));
    }

    #[test]
    fn missing_catalog_entry_is_invalid_state() {
        let catalog = CatalogSnapshot::new();
        let line = CartLine::Bundle {
            id: Uuid::new_v4(),
            quantity: 1,
        };
        assert_matches!(
            cart_line_total(&line, &catalog),
            Err(ServiceError::InvalidState(_))
        );
        assert_matches!(cart_total(&[line], &catalog), Err(ServiceError::InvalidState(_)));
    }

    #[test]
    fn coupon_discount_is_capped_at_total() {
        assert_eq!(coupon_discount(dec!(100.00), dec!(20)), dec!(20.00));
        assert_eq!(coupon_discount(dec!(100.00), dec!(100)), dec!(100.00));
        assert_eq!(coupon_discount(dec!(40.00), dec!(150)), dec!(40.00));
        assert_eq!(coupon_discount(dec!(10.00), dec!(33.333)), dec!(3.33));
    }

    #[test]
    fn fixed_donation_keeps_no_percentage() {
        let donation =
            donation_amount(dec!(100.00), DonationRequest::Fixed(dec!(5.00))).unwrap();
        assert_eq!(donation.amount, dec!(5.00));
        assert_eq!(donation.percentage, None);
    }

    #[test]
    fn percentage_donation_uses_given_total() {
        let donation =
            donation_amount(dec!(100.00), DonationRequest::Percentage(dec!(2.5))).unwrap();
        assert_eq!(donation.amount, dec!(2.50));
        assert_eq!(donation.percentage, Some(dec!(2.5)));

        let full = donation_amount(dec!(50.00), DonationRequest::Percentage(dec!(100))).unwrap();
        assert_eq!(full.amount, dec!(50.00));
    }

    #[test]
    fn percentage_donation_is_rounded_to_cents() {
        let donation =
            donation_amount(dec!(10.01), DonationRequest::Percentage(dec!(33.3333))).unwrap();
        assert_eq!(donation.amount, dec!(3.34));
        assert_eq!(donation.percentage, Some(dec!(33.3333)));

        let half = donation_amount(dec!(0.25), DonationRequest::Percentage(dec!(10))).unwrap();
        assert_eq!(half.amount, dec!(0.03));
    }

    #[test]
    fn invalid_donations_are_rejected() {
        assert_matches!(
            donation_amount(dec!(10), DonationRequest::Fixed(dec!(-1))),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            donation_amount(dec!(10), DonationRequest::Fixed(dec!(1.005))),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            donation_amount(dec!(10), DonationRequest::Percentage(dec!(100.01))),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            donation_amount(dec!(10), DonationRequest::Percentage(dec!(-0.5))),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn fixed_amount_wins_over_percentage() {
        assert_eq!(
            DonationRequest::from_parts(Some(dec!(1)), Some(dec!(10))),
            DonationRequest::Fixed(dec!(1))
        );
        assert_eq!(DonationRequest::from_parts(None, None), DonationRequest::None);
    }

    #[test]
    fn charge_adds_donation_after_discount() {
        let total = dec!(100.00);
        let discount = coupon_discount(total, dec!(20));
        let donation = donation_amount(total, DonationRequest::Percentage(dec!(5)))
            .unwrap()
            .amount;
        assert_eq!(charge_total(total, discount, donation), dec!(85.00));
    }
}

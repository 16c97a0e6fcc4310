//! Price, tax and shipping calculation for print orders.
//!
//! All functions here are pure. Money is kept as [`Decimal`] and every
//! figure handed back to callers is rounded to two places, half away from
//! zero.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::models::Dimensions;

pub const TAX_RATE: Decimal = dec!(0.16);
pub const DEFAULT_UNIT_PRICE: Decimal = dec!(0.06);
/// Largest number of pieces accepted on one order.
pub const MAX_QUANTITY: u32 = 10_000;

const SHIPPING_BASE: Decimal = dec!(5.00);
const SHIPPING_LARGE_SURCHARGE: Decimal = dec!(3.00);
const SHIPPING_PER_EXTRA_UNIT: Decimal = dec!(2.00);
const LARGE_VOLUME_CM3: Decimal = dec!(1000);

/// Woods with a known price per square centimetre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Material {
    Pine,
    Oak,
    Cedar,
    Mahogany,
    Walnut,
}

impl Material {
    /// Matches English names and the Spanish names used by the storefront,
    /// ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pine" | "pino" => Some(Material::Pine),
            "oak" | "roble" => Some(Material::Oak),
            "cedar" | "cedro" => Some(Material::Cedar),
            "mahogany" | "caoba" => Some(Material::Mahogany),
            "walnut" | "nogal" => Some(Material::Walnut),
            _ => None,
        }
    }

    pub fn unit_price(self) -> Decimal {
        match self {
            Material::Pine => dec!(0.05),
            Material::Oak => dec!(0.08),
            Material::Cedar => dec!(0.07),
            Material::Mahogany => dec!(0.10),
            Material::Walnut => dec!(0.09),
        }
    }
}

/// Price per cm² for a free-text material; unknown materials use the default rate.
pub fn unit_price_for(material_type: &str) -> Decimal {
    Material::from_name(material_type)
        .map(Material::unit_price)
        .unwrap_or(DEFAULT_UNIT_PRICE)
}

/// Fractional discount applied to the whole order for a given quantity.
pub fn volume_discount(quantity: u32) -> Decimal {
    match quantity {
        q if q >= 10 => dec!(0.15),
        q if q >= 5 => dec!(0.10),
        q if q >= 3 => dec!(0.05),
        _ => Decimal::ZERO,
    }
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unrounded price of a single piece.
pub fn unit_base_price(dimensions: &Dimensions, material_type: &str) -> Result<Decimal, ServiceError> {
    checked(dimensions.area()?.checked_mul(unit_price_for(material_type)))
}

/// Order total before tax and shipping.
pub fn compute_price(
    dimensions: &Dimensions,
    quantity: u32,
    material_type: &str,
) -> Result<Decimal, ServiceError> {
    let gross = checked(unit_base_price(dimensions, material_type)?.checked_mul(Decimal::from(quantity)))?;
    let discounted = checked(gross.checked_mul(Decimal::ONE - volume_discount(quantity)))?;
    Ok(round_money(discounted))
}

pub fn compute_tax(total: Decimal) -> Decimal {
    round_money(total * TAX_RATE)
}

pub fn compute_shipping(dimensions: &Dimensions, quantity: u32) -> Result<Decimal, ServiceError> {
    let mut cost = SHIPPING_BASE;
    if dimensions.volume()? > LARGE_VOLUME_CM3 {
        cost += SHIPPING_LARGE_SURCHARGE;
    }
    if quantity > 1 {
        cost += SHIPPING_PER_EXTRA_UNIT * Decimal::from(quantity - 1);
    }
    Ok(round_money(cost))
}

fn checked(amount: Option<Decimal>) -> Result<Decimal, ServiceError> {
    amount.ok_or_else(|| ServiceError::ValidationError("order is too large to price".into()))
}

/// Full breakdown stored on an order at submission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceBreakdown {
    /// Price of one piece before discount (area x unit price).
    pub base_price: Decimal,
    pub discount_rate: Decimal,
    /// Discounted order total before tax and shipping.
    pub total_price: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    /// What the customer pays: total + tax + shipping.
    pub grand_total: Decimal,
}

pub fn quote(
    dimensions: &Dimensions,
    quantity: u32,
    material_type: &str,
) -> Result<PriceBreakdown, ServiceError> {
    let total_price = compute_price(dimensions, quantity, material_type)?;
    let tax_amount = compute_tax(total_price);
    let shipping_cost = compute_shipping(dimensions, quantity)?;
    Ok(PriceBreakdown {
        base_price: round_money(unit_base_price(dimensions, material_type)?),
        discount_rate: volume_discount(quantity),
        total_price,
        tax_amount,
        shipping_cost,
        grand_total: total_price + tax_amount + shipping_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dims(width: f64, height: f64, depth: f64) -> Dimensions {
        Dimensions::new(width, height, depth).unwrap()
    }

    #[rstest]
    #[case("pine", dec!(0.05))]
    #[case("Pino", dec!(0.05))]
    #[case("oak", dec!(0.08))]
    #[case("roble", dec!(0.08))]
    #[case(" cedar ", dec!(0.07))]
    #[case("cedro", dec!(0.07))]
    #[case("mahogany", dec!(0.10))]
    #[case("caoba", dec!(0.10))]
    #[case("WALNUT", dec!(0.09))]
    #[case("nogal", dec!(0.09))]
    #[case("bamboo", dec!(0.06))]
    #[case("", dec!(0.06))]
    fn unit_prices(#[case] material: &str, #[case] expected: Decimal) {
        assert_eq!(unit_price_for(material), expected);
    }

    #[rstest]
    #[case(1, dec!(0))]
    #[case(2, dec!(0))]
    #[case(3, dec!(0.05))]
    #[case(4, dec!(0.05))]
    #[case(5, dec!(0.10))]
    #[case(9, dec!(0.10))]
    #[case(10, dec!(0.15))]
    #[case(250, dec!(0.15))]
    fn discount_tiers(#[case] quantity: u32, #[case] expected: Decimal) {
        assert_eq!(volume_discount(quantity), expected);
    }

    #[test]
    fn single_pine_piece() {
        let d = dims(10.0, 10.0, 1.0);
        assert_eq!(compute_price(&d, 1, "pino").unwrap(), dec!(5.00));
        assert_eq!(compute_tax(dec!(5.00)), dec!(0.80));
        assert_eq!(compute_shipping(&d, 1).unwrap(), dec!(5.00));
    }

    #[test]
    fn large_oak_batch() {
        let d = dims(20.0, 30.0, 2.0);
        // 600 cm² * 0.08 = 48 per piece, 5 pieces at 10% off
        assert_eq!(compute_price(&d, 5, "oak").unwrap(), dec!(216.00));
        assert_eq!(compute_tax(dec!(216.00)), dec!(34.56));
        // volume 1200 > 1000, four extra units
        assert_eq!(compute_shipping(&d, 5).unwrap(), dec!(16.00));
    }

    #[test]
    fn unknown_material_uses_default_rate() {
        let d = dims(10.0, 10.0, 1.0);
        assert_eq!(compute_price(&d, 1, "unknown").unwrap(), dec!(6.00));
    }

    #[test]
    fn volume_exactly_at_threshold_has_no_surcharge() {
        assert_eq!(compute_shipping(&dims(10.0, 10.0, 10.0), 1).unwrap(), dec!(5.00));
        assert_eq!(compute_shipping(&dims(10.0, 10.0, 10.01), 1).unwrap(), dec!(8.00));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(0.124)), dec!(0.12));
        // 0.5 cm² pine = 0.025
        assert_eq!(compute_price(&dims(0.5, 1.0, 1.0), 1, "pine").unwrap(), dec!(0.03));
    }

    #[test]
    fn quote_adds_up() {
        let q = quote(&dims(20.0, 30.0, 2.0), 5, "oak").unwrap();
        assert_eq!(q.base_price, dec!(48.00));
        assert_eq!(q.discount_rate, dec!(0.10));
        assert_eq!(q.grand_total, dec!(266.56));
    }

    #[test]
    fn largest_order_still_prices() {
        let side = crate::models::MAX_SIDE_CM;
        let q = quote(&dims(side, side, side), MAX_QUANTITY, "mahogany").unwrap();
        // 1e6 cm² x 0.10 x 10 000 pieces at 15% off
        assert_eq!(q.total_price, dec!(850000000.00));
    }

    #[test]
    fn unchecked_dimensions_fail_instead_of_overflowing() {
        let huge = Dimensions {
            width: 1e15,
            height: 1e15,
            depth: 1.0,
        };
        assert!(matches!(
            quote(&huge, 1, "oak"),
            Err(ServiceError::ValidationError(_))
        ));
    }
}

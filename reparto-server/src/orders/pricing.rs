//! Money calculation for order pricing
//!
//! All arithmetic is done using `Decimal` internally, then converted to `f64`
//! for storage and serialization. Rates come from `platform_settings` with
//! hard-coded fallbacks when a key is missing or unparsable.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::ItemCustomization;
use sqlx::SqlitePool;

use crate::db::repository::settings;

/// Rounding precision for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per menu item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i64 = 999;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{} must be a finite number, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
///
/// Input values should be pre-validated via `require_finite()` at the boundary.
/// If NaN/Infinity somehow reaches here, logs an error and returns ZERO
/// to avoid silent data corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp with max input ≤ 1_000_000 (validated at boundary)
        // is always within f64 representable range (~1.8e308)
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Platform pricing rates, loaded from `platform_settings`.
#[derive(Debug, Clone, Copy)]
pub struct PricingRates {
    pub tax_rate: f64,
    pub delivery_fee: f64,
    pub minimum_order_amount: f64,
}

impl PricingRates {
    /// Load current rates, falling back to the seeded defaults per key.
    pub async fn load(pool: &SqlitePool) -> AppResult<Self> {
        Ok(Self {
            tax_rate: settings::get_f64(pool, settings::KEY_TAX_RATE, settings::DEFAULT_TAX_RATE)
                .await?,
            delivery_fee: settings::get_f64(
                pool,
                settings::KEY_DELIVERY_FEE,
                settings::DEFAULT_DELIVERY_FEE,
            )
            .await?,
            minimum_order_amount: settings::get_f64(
                pool,
                settings::KEY_MINIMUM_ORDER_AMOUNT,
                settings::DEFAULT_MINIMUM_ORDER_AMOUNT,
            )
            .await?,
        })
    }
}

impl Default for PricingRates {
    fn default() -> Self {
        Self {
            tax_rate: settings::DEFAULT_TAX_RATE,
            delivery_fee: settings::DEFAULT_DELIVERY_FEE,
            minimum_order_amount: settings::DEFAULT_MINIMUM_ORDER_AMOUNT,
        }
    }
}

/// Validate one requested order line before pricing.
///
/// `unit_price` is the menu price resolved server-side, never client input;
/// this still guards against corrupt catalog rows.
pub fn validate_line(
    unit_price: f64,
    quantity: i64,
    customizations: &[ItemCustomization],
) -> AppResult<()> {
    require_finite(unit_price, "price")?;
    if unit_price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("price must be non-negative, got {}", unit_price),
        ));
    }
    if unit_price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!(
                "price exceeds maximum allowed ({}), got {}",
                MAX_PRICE, unit_price
            ),
        ));
    }

    if quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("quantity must be positive, got {}", quantity),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, quantity
            ),
        ));
    }

    for c in customizations {
        require_finite(c.price_modifier, "customization price_modifier")?;
        if c.price_modifier.abs() > MAX_PRICE {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!(
                    "customization price_modifier exceeds maximum allowed, got {}",
                    c.price_modifier
                ),
            ));
        }
    }

    Ok(())
}

/// Per-line total: (unit price + customization modifiers) × quantity,
/// clamped to non-negative and rounded to 2 decimal places.
pub fn line_total(unit_price: f64, quantity: i64, customizations: &[ItemCustomization]) -> f64 {
    let modifiers: Decimal = customizations
        .iter()
        .map(|c| to_decimal(c.price_modifier))
        .sum();
    let unit = (to_decimal(unit_price) + modifiers).max(Decimal::ZERO);

    to_f64(unit * Decimal::from(quantity))
}

/// Computed monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
}

/// Sum line totals into the order breakdown.
///
/// Each line total is already rounded to 2dp, so the subtotal is an exact sum.
/// Tax is `subtotal × tax_rate` rounded once; the grand total is then an exact
/// sum of three 2dp values, keeping `subtotal + tax + fee == total` checkable
/// without tolerance.
pub fn order_totals(line_totals: &[f64], rates: &PricingRates) -> OrderTotals {
    let subtotal: Decimal = line_totals.iter().copied().map(to_decimal).sum();
    let tax = (subtotal * to_decimal(rates.tax_rate))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    let fee = to_decimal(rates.delivery_fee);
    let total = subtotal + tax + fee;

    OrderTotals {
        subtotal: to_f64(subtotal),
        tax_amount: to_f64(tax),
        delivery_fee: to_f64(fee),
        total_amount: to_f64(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customization(name: &str, modifier: f64) -> ItemCustomization {
        ItemCustomization {
            name: name.to_string(),
            price_modifier: modifier,
        }
    }

    #[test]
    fn test_two_item_cart_totals() {
        // $10 × 2 + $5 × 1 at 8% tax with a $3 fee
        let lines = [line_total(10.0, 2, &[]), line_total(5.0, 1, &[])];
        let rates = PricingRates {
            tax_rate: 0.08,
            delivery_fee: 3.0,
            minimum_order_amount: 0.0,
        };
        let totals = order_totals(&lines, &rates);

        assert!(money_eq(totals.subtotal, 25.0));
        assert!(money_eq(totals.tax_amount, 2.0));
        assert!(money_eq(totals.delivery_fee, 3.0));
        assert!(money_eq(totals.total_amount, 30.0));
    }

    #[test]
    fn test_default_rates_round_half_up() {
        // 25 × 0.085 = 2.125, rounds away from zero to 2.13
        let lines = [line_total(12.5, 2, &[])];
        let totals = order_totals(&lines, &PricingRates::default());

        assert!(money_eq(totals.subtotal, 25.0));
        assert!(money_eq(totals.tax_amount, 2.13));
        assert!(money_eq(totals.delivery_fee, 5.0));
        assert!(money_eq(totals.total_amount, 32.13));
    }

    #[test]
    fn test_customization_modifiers_price_per_unit() {
        // ($8.50 + $1.25 + $0.75) × 3 = $31.50
        let extras = [customization("extra cheese", 1.25), customization("bacon", 0.75)];
        assert!(money_eq(line_total(8.5, 3, &extras), 31.5));
    }

    #[test]
    fn test_negative_modifier_clamps_at_zero() {
        let discount = [customization("coupon", -10.0)];
        assert!(money_eq(line_total(4.0, 2, &discount), 0.0));
    }

    #[test]
    fn test_totals_identity_holds_after_rounding() {
        let lines = [
            line_total(3.33, 3, &[]),
            line_total(0.10, 7, &[customization("x", 0.01)]),
        ];
        let rates = PricingRates::default();
        let totals = order_totals(&lines, &rates);

        let sum: f64 = lines.iter().sum();
        assert!(money_eq(totals.subtotal, sum));
        assert!(money_eq(
            totals.subtotal + totals.tax_amount + totals.delivery_fee,
            totals.total_amount
        ));
    }

    #[test]
    fn test_validate_line_rejects_bad_quantities() {
        assert!(validate_line(5.0, 0, &[]).is_err());
        assert!(validate_line(5.0, -1, &[]).is_err());
        assert!(validate_line(5.0, MAX_QUANTITY + 1, &[]).is_err());
        assert!(validate_line(5.0, MAX_QUANTITY, &[]).is_ok());
    }

    #[test]
    fn test_validate_line_rejects_bad_prices() {
        assert!(validate_line(-0.01, 1, &[]).is_err());
        assert!(validate_line(f64::NAN, 1, &[]).is_err());
        assert!(validate_line(f64::INFINITY, 1, &[]).is_err());
        assert!(validate_line(MAX_PRICE + 1.0, 1, &[]).is_err());
        assert!(validate_line(0.0, 1, &[]).is_ok());
    }

    #[test]
    fn test_validate_line_rejects_bad_modifiers() {
        let nan = [customization("bad", f64::NAN)];
        assert!(validate_line(5.0, 1, &nan).is_err());

        let huge = [customization("bad", MAX_PRICE + 1.0)];
        assert!(validate_line(5.0, 1, &huge).is_err());

        let fine = [customization("ok", -1.0)];
        assert!(validate_line(5.0, 1, &fine).is_ok());
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(10.0, 10.0));
        assert!(money_eq(10.0, 10.009));
        assert!(!money_eq(10.0, 10.01));
    }
}

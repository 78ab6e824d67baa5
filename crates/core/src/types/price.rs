//! Money formatting on top of `rust_decimal`.
//!
//! The backend prices everything in a single store currency, so a price is just
//! a [`Decimal`]. Formatting is the only thing the frontends need.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Default currency symbol when none is configured.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Format an amount as a display price, e.g. `$1,234.50` or `-$3.00`.
///
/// Amounts are rounded half-away-from-zero to two decimal places and the
/// integer part is grouped in thousands.
#[must_use]
pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("{sign}{symbol}{}.{fraction}", group_thousands(whole))
}

/// Insert a comma between every group of three digits.
fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Express `part` as a whole-number percentage of `whole`, rounded down.
///
/// Used for "20% off" badges when a product carries a discount price.
/// Returns `None` when `whole` is not positive or `part` is not below it.
#[must_use]
pub fn percent_off(whole: Decimal, part: Decimal) -> Option<u32> {
    if whole <= Decimal::ZERO || part >= whole || part < Decimal::ZERO {
        return None;
    }
    let pct = ((whole - part) / whole * Decimal::ONE_HUNDRED).floor();
    pct.to_u32().filter(|p| *p > 0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_format_money_pads_cents() {
        assert_eq!(format_money(dec!(5), "$"), "$5.00");
        assert_eq!(format_money(dec!(19.9), "$"), "$19.90");
    }

    #[test]
    fn test_format_money_groups_thousands() {
        assert_eq!(format_money(dec!(1234.5), "$"), "$1,234.50");
        assert_eq!(format_money(dec!(1234567.891), "€"), "€1,234,567.89");
        assert_eq!(format_money(dec!(999), "$"), "$999.00");
    }

    #[test]
    fn test_format_money_rounds_half_away_from_zero() {
        assert_eq!(format_money(dec!(2.005), "$"), "$2.01");
        assert_eq!(format_money(dec!(-2.005), "$"), "-$2.01");
    }

    #[test]
    fn test_format_money_negative_zero_has_no_sign() {
        assert_eq!(format_money(dec!(-0.001), "$"), "$0.00");
    }

    #[test]
    fn test_percent_off() {
        assert_eq!(percent_off(dec!(100), dec!(80)), Some(20));
        assert_eq!(percent_off(dec!(30), dec!(20)), Some(33));
        assert_eq!(percent_off(dec!(100), dec!(100)), None);
        assert_eq!(percent_off(dec!(0), dec!(0)), None);
        assert_eq!(percent_off(dec!(100), dec!(99.9)), None);
    }
}

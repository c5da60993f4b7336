//! Decimal money amounts and discount math.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Rub,
    Usd,
    Eur,
}

impl Currency {
    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Rub => "RUB",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Rub => "₽",
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUB" | "RUR" => Ok(Self::Rub),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// An amount paired with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (roubles, not kopecks).
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self {
            amount: self.amount * Decimal::from(quantity),
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} {}",
            self.amount.round_dp(2),
            self.currency.symbol()
        )
    }
}

/// Whole-percent discount from `original` down to `reduced`.
///
/// Returns `None` unless `original > reduced > 0`. Halves round away from zero,
/// so 1000 → 875 is 13%.
///
/// ```
/// use ampere_core::discount_percent;
/// use rust_decimal::Decimal;
///
/// assert_eq!(discount_percent(Decimal::from(1000), Decimal::from(750)), Some(25));
/// assert_eq!(discount_percent(Decimal::from(100), Decimal::from(100)), None);
/// ```
#[must_use]
pub fn discount_percent(original: Decimal, reduced: Decimal) -> Option<u8> {
    if reduced <= Decimal::ZERO || original <= reduced {
        return None;
    }

    let percent = ((original - reduced) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    percent.to_u8().filter(|p| *p > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_discount_percent_rounds_half_up() {
        assert_eq!(discount_percent(dec("1000"), dec("875")), Some(13));
        assert_eq!(discount_percent(dec("59990"), dec("49990")), Some(17));
    }

    #[test]
    fn test_discount_percent_requires_real_reduction() {
        assert_eq!(discount_percent(dec("100"), dec("120")), None);
        assert_eq!(discount_percent(dec("100"), dec("0")), None);
        assert_eq!(discount_percent(dec("0"), dec("0")), None);
        // Less than half a percent rounds to zero and is not reported
        assert_eq!(discount_percent(dec("1000"), dec("999")), None);
    }

    #[test]
    fn test_currency_parse_and_display() {
        assert_eq!(Currency::from_str("rur").unwrap(), Currency::Rub);
        assert_eq!(Currency::from_str(" usd ").unwrap(), Currency::Usd);
        assert!(Currency::from_str("JPY").is_err());
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(serde_json::to_string(&Currency::Rub).unwrap(), "\"RUB\"");
    }

    #[test]
    fn test_money_times_and_display() {
        let unit = Money::new(dec("1499.50"), Currency::Rub);
        let line = unit.times(3);
        assert_eq!(line.amount, dec("4498.50"));
        assert_eq!(line.to_string(), "4498.50 ₽");
    }
}

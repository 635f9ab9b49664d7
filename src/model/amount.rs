//! Amount type for handling monetary values in Brazilian notation.
//!
//! This module provides the `Amount` type which wraps `Decimal` and knows how to render it the
//! way a cashier's spreadsheet expects: a decimal comma, optionally a `R$` prefix and `.` as the
//! thousands separator.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;

/// Represents how an amount should be written to a `String`.
///
/// # Examples
///  - `AmountFormat{ symbol: true, thousands: true }` -> `R$ 1.500,00`
///  - `AmountFormat{ symbol: false, thousands: true }` -> `1.500,00`
///  - `AmountFormat{ symbol: false, thousands: false }` -> `1500,00`
///  - `AmountFormat{ symbol: true, thousands: false }` -> `R$ 1500,00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether the `R$` currency symbol is written.
    symbol: bool,
    /// Whether `.` is written as a thousands separator.
    thousands: bool,
}

impl AmountFormat {
    pub const fn new(symbol: bool, thousands: bool) -> Self {
        Self { symbol, thousands }
    }
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has the currency symbol and thousands separators: e.g. `R$ 1.500,00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat::new(true, true);

/// The format typed into a spreadsheet cell: e.g. `1500,00`. A sheet with a pt-BR locale reads
/// this as a number when values are entered as if typed by a user.
pub const CELL_FORMAT: AmountFormat = AmountFormat::new(false, false);

/// The currency symbol for the Brazilian real.
pub(crate) const CURRENCY_SYMBOL: &str = "R$";

/// Represents a monetary amount in reais.
///
/// Formatting is not significant for equality; two amounts are equal when their values are.
///
/// # Examples
///
/// ```
/// # use caixa_express::model::{Amount, AmountFormat};
/// # use rust_decimal::{Decimal, RoundingStrategy};
/// let amount = Amount::new(Decimal::new(150050, 2));
/// assert_eq!(amount.to_string(), "R$ 1.500,50");
/// assert_eq!(amount.format(AmountFormat::new(false, false)), "1500,50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount::new(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Renders the amount, rounded half away from zero to centavos, using `format`.
    pub fn format(&self, format: AmountFormat) -> String {
        let rounded = self
            .value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let num = rounded.abs();

        // Format with US separators first, then swap them for Brazilian ones.
        let us = if format.thousands {
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        } else {
            format!("{num:.2}")
        };
        let br: String = us
            .chars()
            .map(|c| match c {
                ',' => '.',
                '.' => ',',
                other => other,
            })
            .collect();

        if format.symbol {
            format!("{sign}{CURRENCY_SYMBOL} {br}")
        } else {
            format!("{sign}{br}")
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(DEFAULT_FORMAT))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_default_format() {
        assert_eq!(amount("50").to_string(), "R$ 50,00");
        assert_eq!(amount("1500.5").to_string(), "R$ 1.500,50");
    }

    #[test]
    fn test_display_large_amount() {
        assert_eq!(amount("1234567.89").to_string(), "R$ 1.234.567,89");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(amount("-12.30").to_string(), "-R$ 12,30");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Amount::ZERO.to_string(), "R$ 0,00");
    }

    #[test]
    fn test_cell_format() {
        assert_eq!(amount("15.5").format(CELL_FORMAT), "15,50");
        assert_eq!(amount("1500").format(CELL_FORMAT), "1500,00");
        assert_eq!(amount("0").format(CELL_FORMAT), "0,00");
    }

    #[test]
    fn test_format_rounds_to_centavos() {
        assert_eq!(amount("10.004").format(CELL_FORMAT), "10,00");
        assert_eq!(amount("10.005").format(CELL_FORMAT), "10,01");
        assert_eq!(amount("10.015").format(CELL_FORMAT), "10,02");
        assert_eq!(amount("0.125").format(CELL_FORMAT), "0,13");
        assert_eq!(amount("-10.005").to_string(), "-R$ 10,01");
    }

    #[test]
    fn test_symbol_without_thousands() {
        let format = AmountFormat::new(true, false);
        assert_eq!(amount("2500").format(format), "R$ 2500,00");
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(amount("10.50"), amount("10.5"));
        assert!(amount("3") < amount("5"));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&amount("50")).unwrap();
        assert_eq!(json, "\"R$ 50,00\"");
    }
}

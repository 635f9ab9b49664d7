//! Parses the free text typed into a money field.
//!
//! Cashiers type amounts the way they would on a calculator: `R$ 10,50`, `1 200`, or a quick sum
//! such as `10+5,50`. The text is normalized and then read as a sum of decimal literals. Nothing
//! else is evaluated: `2*3` or any other expression is rejected, and a rejected field is zero.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use crate::model::amount::CURRENCY_SYMBOL;

/// Parses a money field into a `Decimal`. Empty, non-numeric or otherwise invalid text yields
/// zero; this function never fails.
pub fn parse_value(text: &str) -> Decimal {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    match sum_of_literals(&normalized) {
        Some(value) => value,
        None => {
            trace!("Unable to read '{text}' as a sum of numbers, using zero");
            Decimal::ZERO
        }
    }
}

/// Removes the currency symbol and all whitespace, and turns the decimal comma into a point.
fn normalize(text: &str) -> String {
    text.replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Reads `expr` as `literal ('+' literal)*`. Returns `None` if anything else is present or if
/// the sum overflows.
fn sum_of_literals(expr: &str) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    let mut rest = expr;
    loop {
        let (term, tail) = literal(rest)?;
        total = total.checked_add(term)?;
        if tail.is_empty() {
            return Some(total);
        }
        rest = tail.strip_prefix('+')?;
    }
}

/// Reads one signed decimal literal from the front of `s`, e.g. `-5`, `10`, `5.50` or `.5`.
/// Returns the value and the remainder of `s`.
fn literal(s: &str) -> Option<(Decimal, &str)> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(after) => (true, after),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let number = &unsigned[..end];
    if !number.bytes().any(|b| b.is_ascii_digit()) || number.matches('.').count() > 1 {
        return None;
    }

    // Spell out the integer part of ".5" and drop the bare point of "5." before parsing.
    let trimmed = number.strip_suffix('.').unwrap_or(number);
    let value = match trimmed.strip_prefix('.') {
        Some(fraction) => Decimal::from_str(&format!("0.{fraction}")).ok()?,
        None => Decimal::from_str(trimmed).ok()?,
    };
    let value = if negative { -value } else { value };
    Some((value, &unsigned[end..]))
}

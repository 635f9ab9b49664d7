//! The raw fields typed into one line of the entry form, and the conversion of a batch of them
//! into `TransactionRow`s.

use crate::model::value::parse_value;
use crate::model::{PaymentMethod, TransactionRow};
use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// The number of entry lines submitted together.
pub const BATCH_SIZE: usize = 8;

/// Written in place of the plate when none was typed.
pub const PLACEHOLDER_PLATE: &str = "S/P";

/// The text of one line of the entry form, exactly as typed.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Entry {
    pub plate: String,
    pub quantity: String,
    pub value: String,
    pub fee: String,
    pub addition: String,
    pub exited: String,
    #[serde(deserialize_with = "method_or_default")]
    pub method: PaymentMethod,
}

impl Entry {
    /// An entry is sent when it has a plate or a value. A field holding only whitespace counts as
    /// empty.
    pub fn is_filled(&self) -> bool {
        !self.plate.trim().is_empty() || !self.value.trim().is_empty()
    }

    /// Converts this entry into a row stamped with `now`.
    pub fn to_row<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TransactionRow {
        let plate = self.plate.trim();
        TransactionRow {
            date: now.date_naive(),
            time: now.time().with_nanosecond(0).unwrap_or_else(|| now.time()),
            quantity: parse_quantity(&self.quantity),
            value: parse_value(&self.value).into(),
            fee: parse_value(&self.fee).into(),
            addition: parse_value(&self.addition).into(),
            exited: parse_value(&self.exited).into(),
            method: self.method,
            plate: if plate.is_empty() {
                PLACEHOLDER_PLATE.to_string()
            } else {
                plate.to_uppercase()
            },
        }
    }
}

/// An empty payment method field means the default method.
fn method_or_default<'de, D>(deserializer: D) -> Result<PaymentMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(PaymentMethod::default());
    }
    text.parse().map_err(serde::de::Error::custom)
}

/// Reads the quantity field. Text made only of digits is read as an integer; anything else,
/// including an empty field or a number too large for a `u64`, is read as 1.
pub fn parse_quantity(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    text.parse().unwrap_or(1)
}

/// Converts a batch of entries into rows, keeping their order and skipping the entries that
/// have neither a plate nor a value. Every row is stamped with the same `now`.
///
/// An empty result means there is nothing to write.
pub fn format_batch<Tz: TimeZone>(entries: &[Entry], now: &DateTime<Tz>) -> Vec<TransactionRow> {
    let rows: Vec<TransactionRow> = entries
        .iter()
        .filter(|entry| entry.is_filled())
        .map(|entry| entry.to_row(now))
        .collect();
    debug!(
        "Formatted {} of {} entries into rows",
        rows.len(),
        entries.len()
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use chrono::{NaiveDate, NaiveTime};
    use chrono_tz::America::Sao_Paulo;
    use rust_decimal::Decimal;

    fn now() -> DateTime<chrono_tz::Tz> {
        Sao_Paulo.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap()
    }

    fn empty_batch() -> Vec<Entry> {
        vec![Entry::default(); BATCH_SIZE]
    }

    #[test]
    fn test_single_plate_without_value() {
        let mut entries = empty_batch();
        entries[2].plate = "ABC1234".to_string();

        let rows = format_batch(&entries, &now());

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.plate(), "ABC1234");
        assert_eq!(row.quantity(), 1);
        assert_eq!(row.value(), Amount::ZERO);
        assert_eq!(row.fee(), Amount::ZERO);
        assert_eq!(row.addition(), Amount::ZERO);
        assert_eq!(row.exited(), Amount::ZERO);
        assert_eq!(row.method(), PaymentMethod::Pix);
    }

    #[test]
    fn test_empty_batch_has_no_rows() {
        assert!(format_batch(&empty_batch(), &now()).is_empty());
    }

    #[test]
    fn test_blank_fields_do_not_count() {
        let mut entries = empty_batch();
        entries[0].plate = "   ".to_string();
        entries[1].fee = "5".to_string();
        entries[2].quantity = "3".to_string();
        assert!(format_batch(&entries, &now()).is_empty());
    }

    #[test]
    fn test_whitespace_only_entry_is_not_filled() {
        let mut entry = Entry::default();
        entry.plate = " \t ".to_string();
        entry.value = "  ".to_string();
        assert!(!entry.is_filled());

        entry.value = " 0 ".to_string();
        assert!(entry.is_filled());
    }

    #[test]
    fn test_value_without_plate_uses_placeholder() {
        let mut entries = empty_batch();
        entries[5].value = "10+5,50".to_string();
        entries[5].method = PaymentMethod::Dinheiro;

        let rows = format_batch(&entries, &now());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plate(), PLACEHOLDER_PLATE);
        assert_eq!(rows[0].value().value(), Decimal::new(1550, 2));
        assert_eq!(rows[0].method(), PaymentMethod::Dinheiro);
    }

    #[test]
    fn test_plate_is_upper_cased() {
        let mut entries = empty_batch();
        entries[0].plate = " abc1d23 ".to_string();
        let rows = format_batch(&entries, &now());
        assert_eq!(rows[0].plate(), "ABC1D23");
    }

    #[test]
    fn test_order_is_kept() {
        let mut entries = empty_batch();
        entries[6].plate = "ZZZ9999".to_string();
        entries[1].plate = "AAA1111".to_string();
        entries[3].value = "7".to_string();

        let plates: Vec<String> = format_batch(&entries, &now())
            .iter()
            .map(|row| row.plate().to_string())
            .collect();

        assert_eq!(plates, vec!["AAA1111", PLACEHOLDER_PLATE, "ZZZ9999"]);
    }

    #[test]
    fn test_all_money_fields_are_parsed() {
        let entry = Entry {
            plate: "XYZ0A12".to_string(),
            quantity: "2".to_string(),
            value: "R$ 100,00".to_string(),
            fee: "3,50".to_string(),
            addition: "1+1".to_string(),
            exited: "oops".to_string(),
            method: PaymentMethod::Credito,
        };
        let row = entry.to_row(&now());
        assert_eq!(row.quantity(), 2);
        assert_eq!(row.value().value(), Decimal::new(100, 0));
        assert_eq!(row.fee().value(), Decimal::new(350, 2));
        assert_eq!(row.addition().value(), Decimal::new(2, 0));
        assert_eq!(row.exited(), Amount::ZERO);
    }

    #[test]
    fn test_timestamp_is_split() {
        let mut entries = empty_batch();
        entries[0].plate = "ABC1234".to_string();
        let rows = format_batch(&entries, &now());
        assert_eq!(
            rows[0].date(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
        assert_eq!(rows[0].time(), NaiveTime::from_hms_opt(14, 5, 9).unwrap());
    }

    #[test]
    fn test_time_is_truncated_to_seconds() {
        let precise = now().with_nanosecond(750_000_000).unwrap();
        let mut entry = Entry::default();
        entry.plate = "ABC1234".to_string();
        let row = entry.to_row(&precise);
        assert_eq!(row.time().nanosecond(), 0);
        assert_eq!(row.time().second(), 9);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("7"), 7);
        assert_eq!(parse_quantity("abc"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("2.5"), 1);
        assert_eq!(parse_quantity("-3"), 1);
        assert_eq!(parse_quantity(" 12 "), 12);
        assert_eq!(parse_quantity("99999999999"), 99_999_999_999);
        assert_eq!(parse_quantity("18446744073709551615"), u64::MAX);
        assert_eq!(parse_quantity("18446744073709551616"), 1);
        assert_eq!(parse_quantity("0"), 0);
    }

    #[test]
    fn test_deserialize_csv_entry() {
        let data = "plate,quantity,value,fee,addition,exited,method\n\
                    abc1234,2,\"10,50\",,,,Débito\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let entries: Vec<Entry> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].plate, "abc1234");
        assert_eq!(entries[0].value, "10,50");
        assert_eq!(entries[0].method, PaymentMethod::Debito);
    }

    #[test]
    fn test_deserialize_empty_method_is_pix() {
        let data = "plate,method\nabc1234,\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let entries: Vec<Entry> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(entries[0].method, PaymentMethod::Pix);
    }
}

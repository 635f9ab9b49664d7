use crate::model::amount::CELL_FORMAT;
use crate::model::Amount;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// The date format written to the first column, e.g. `19/10/2026`.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// The time format written to the second column, e.g. `14:05:09`.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// The number of columns written for each row, `A` through `I`.
pub const ROW_WIDTH: usize = 9;

/// How the customer paid.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum PaymentMethod {
    #[default]
    Pix,
    Dinheiro,
    #[serde(rename = "Débito")]
    Debito,
    #[serde(rename = "Crédito")]
    Credito,
}

serde_plain::derive_display_from_serialize!(PaymentMethod);
serde_plain::derive_fromstr_from_deserialize!(PaymentMethod);

impl PaymentMethod {
    /// All payment methods in the order they are offered to the cashier.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Pix,
        PaymentMethod::Dinheiro,
        PaymentMethod::Debito,
        PaymentMethod::Credito,
    ];
}

/// One payment record, as written to a row of the day's worksheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRow {
    pub(crate) date: NaiveDate,
    pub(crate) time: NaiveTime,
    pub(crate) quantity: u64,
    pub(crate) value: Amount,
    pub(crate) fee: Amount,
    pub(crate) addition: Amount,
    pub(crate) exited: Amount,
    pub(crate) method: PaymentMethod,
    pub(crate) plate: String,
}

impl TransactionRow {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn addition(&self) -> Amount {
        self.addition
    }

    pub fn exited(&self) -> Amount {
        self.exited
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    /// The cells of this row in column order:
    /// `[date, time, quantity, value, fee, addition, exited, method, plate]`.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.format(DATE_FORMAT).to_string(),
            self.time.format(TIME_FORMAT).to_string(),
            self.quantity.to_string(),
            self.value.format(CELL_FORMAT),
            self.fee.format(CELL_FORMAT),
            self.addition.format(CELL_FORMAT),
            self.exited.format(CELL_FORMAT),
            self.method.to_string(),
            self.plate.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Pix.to_string(), "Pix");
        assert_eq!(PaymentMethod::Dinheiro.to_string(), "Dinheiro");
        assert_eq!(PaymentMethod::Debito.to_string(), "Débito");
        assert_eq!(PaymentMethod::Credito.to_string(), "Crédito");
    }

    #[test]
    fn test_payment_method_from_label() {
        assert_eq!(
            "Crédito".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Credito
        );
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_to_cells() {
        let row = TransactionRow {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            time: NaiveTime::from_hms_opt(8, 5, 3).unwrap(),
            quantity: 2,
            value: Amount::new(Decimal::new(1550, 2)),
            fee: Amount::new(Decimal::new(2, 0)),
            addition: Amount::ZERO,
            exited: Amount::new(Decimal::new(125075, 2)),
            method: PaymentMethod::Debito,
            plate: "ABC1D23".to_string(),
        };
        let cells = row.to_cells();
        assert_eq!(cells.len(), ROW_WIDTH);
        assert_eq!(
            cells,
            vec![
                "19/10/2026",
                "08:05:03",
                "2",
                "15,50",
                "2,00",
                "0,00",
                "1250,75",
                "Débito",
                "ABC1D23",
            ]
        );
    }
}

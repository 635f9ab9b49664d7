use serde::Serialize;

/// The zero-based index of the quantity column (`C`).
pub const QUANTITY_COLUMN: usize = 2;

/// What has been recorded on the day's worksheet so far. Shown to the cashier; never written.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DayTotals {
    /// The number of rows below the header, one per vehicle.
    pub(crate) vehicles: usize,
    /// The sum of the quantity column, i.e. the number of boletos paid.
    pub(crate) boletos: u64,
}

impl DayTotals {
    /// Computes the totals from all values of a worksheet. The first `header_rows` rows are the
    /// template's header and are skipped. Quantity cells that are not a plain non-negative
    /// integer are not counted.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>], header_rows: usize) -> Self {
        let data = rows.get(header_rows..).unwrap_or_default();
        let boletos = data
            .iter()
            .filter_map(|row| row.get(QUANTITY_COLUMN))
            .filter_map(|cell| parse_count(cell.as_ref()))
            .fold(0u64, u64::saturating_add);
        Self {
            vehicles: data.len(),
            boletos,
        }
    }

    pub fn vehicles(&self) -> usize {
        self.vehicles
    }

    pub fn boletos(&self) -> u64 {
        self.boletos
    }
}

fn parse_count(cell: &str) -> Option<u64> {
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse().ok()
}

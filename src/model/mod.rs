//! Types that represent the core data model, such as `Entry` and `TransactionRow`.
mod amount;
mod entry;
mod row;
mod totals;
mod value;

pub use amount::{Amount, AmountFormat, CELL_FORMAT};
pub use entry::{format_batch, parse_quantity, Entry, BATCH_SIZE, PLACEHOLDER_PLATE};
pub use row::{PaymentMethod, TransactionRow, DATE_FORMAT, ROW_WIDTH, TIME_FORMAT};
pub use totals::{DayTotals, QUANTITY_COLUMN};
pub use value::parse_value;

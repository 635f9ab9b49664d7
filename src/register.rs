//! The cash register: reads the day's totals and writes batches of entries to the day's
//! worksheet.

use crate::api::{self, Mode, Sheet, Worksheet};
use crate::error::Res;
use crate::locator;
use crate::model::{format_batch, DayTotals, Entry, TransactionRow};
use crate::{Config, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

/// The 1-based column holding the plate (`I`). Every written row has a plate, so the length of
/// this column is the number of rows in use.
pub(crate) const PLATE_COLUMN: usize = 9;

/// Connects the configured spreadsheet with the entries typed by the cashier.
pub(crate) struct Register {
    sheet: Box<dyn Sheet + Send>,
    config: Config,
}

/// The outcome of a submission.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Submission {
    /// The title of the worksheet written to, or `None` when nothing was written.
    worksheet: Option<String>,
    /// The 1-based row number of the first written row.
    first_row: Option<usize>,
    /// The rows written, in order.
    rows: Vec<TransactionRow>,
}

impl Submission {
    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }

    pub fn first_row(&self) -> Option<usize> {
        self.first_row
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    /// The number of rows written.
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// The totals of the day's worksheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Today {
    date: NaiveDate,
    worksheet: String,
    #[serde(flatten)]
    totals: DayTotals,
}

impl Today {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn totals(&self) -> DayTotals {
        self.totals
    }
}

impl Register {
    /// Opens the spreadsheet named in `config`.
    pub(crate) async fn new(config: Config, mode: Mode) -> Result<Self> {
        let sheet = api::sheet(&config, mode).await?;
        Ok(Self::with_sheet(config, sheet))
    }

    pub(crate) fn with_sheet(config: Config, sheet: Box<dyn Sheet + Send>) -> Self {
        Self { sheet, config }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Finds or creates the worksheet for `today`.
    async fn worksheet(&mut self, today: NaiveDate) -> Res<Worksheet> {
        locator::open_today(
            self.sheet.as_mut(),
            self.config.template(),
            self.config.insert_index(),
            today,
        )
        .await
    }

    /// Reads the totals of the day's worksheet, creating the worksheet if needed.
    pub(crate) async fn today(&mut self) -> Res<Today> {
        let date = self.config.now().date_naive();
        let worksheet = self.worksheet(date).await?;
        let rows = self.sheet.get(&worksheet).await?;
        let totals = DayTotals::from_rows(&rows, self.config.header_rows());
        debug!(
            "Worksheet '{}' has {} vehicles and {} boletos",
            worksheet.title(),
            totals.vehicles(),
            totals.boletos()
        );
        Ok(Today {
            date,
            worksheet: worksheet.title().to_string(),
            totals,
        })
    }

    /// Writes the filled entries of `entries` to the day's worksheet, below any rows already
    /// there and never inside the header. When no entry is filled nothing is written and the
    /// spreadsheet is not contacted.
    pub(crate) async fn submit(&mut self, entries: &[Entry]) -> Res<Submission> {
        let now = self.config.now();
        let rows = format_batch(entries, &now);
        if rows.is_empty() {
            debug!("No filled entries, nothing to write");
            return Ok(Submission {
                worksheet: None,
                first_row: None,
                rows,
            });
        }

        let worksheet = self.worksheet(now.date_naive()).await?;
        let existing = self.sheet.column(&worksheet, PLATE_COLUMN).await?.len();
        let row = insertion_row(existing, self.config.first_data_row());
        debug!(
            "Worksheet '{}' has {existing} rows in use, inserting at row {row}",
            worksheet.title()
        );

        let cells: Vec<Vec<String>> = rows.iter().map(TransactionRow::to_cells).collect();
        self.sheet.insert_rows(&worksheet, row, &cells).await?;
        info!(
            "Wrote {} rows to worksheet '{}' starting at row {row}",
            rows.len(),
            worksheet.title()
        );

        Ok(Submission {
            worksheet: Some(worksheet.title().to_string()),
            first_row: Some(row),
            rows,
        })
    }
}

/// The 1-based row where new rows go: just after the `existing` rows in use, but never above
/// `first_data_row`.
pub(crate) fn insertion_row(existing: usize, first_data_row: usize) -> usize {
    (existing + 1).max(first_data_row)
}

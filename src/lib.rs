//! caixa-express records batches of cashier payment entries into a Google spreadsheet, one
//! worksheet per day.
//!
//! The worksheet for the current date, named like `19-10-2026`, is created on first use by
//! duplicating a template worksheet. Each batch holds up to eight entries; the filled ones become
//! rows that are inserted below the rows already on the worksheet and never inside the template's
//! header rows.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
mod locator;
pub mod model;
mod register;
mod server;
mod utils;


pub use api::{Mode, Worksheet, TEST_MODE_ENV};
pub use config::{Config, SpreadsheetRef, SERVICE_ACCOUNT_ENV};
pub use error::{Error, ErrorType, Result};
pub use locator::{worksheet_title, WORKSHEET_TITLE_FORMAT};
pub use register::{Submission, Today};

//! The spreadsheet collaborator. `Sheet` is the small set of operations the register needs from a
//! spreadsheet service. `GoogleSheet` implements it against the Google Sheets and Drive APIs and
//! `TestSheet` implements it in memory.

mod credentials;
mod sheet;
mod test_sheet;

use crate::error::{ErrorType, IntoResult, Res};
use crate::{Config, Result};
use serde::Serialize;
use tracing::debug;

pub(crate) use credentials::{Credentials, TokenProvider};
pub(crate) use sheet::GoogleSheet;
pub(crate) use test_sheet::TestSheet;
#[cfg(test)]
pub(crate) use test_sheet::TestSheetState;

// OAuth scopes required for the service account. Drive access is required to find a spreadsheet
// by its document name.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// The environment variable that, when set and non-empty, makes the program use an in-memory
/// spreadsheet instead of Google Sheets.
pub const TEST_MODE_ENV: &str = "CAIXA_IN_TEST_MODE";

/// Whether to talk to Google or to the in-memory test sheet.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// Returns `Mode::Test` if `CAIXA_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// One tab of the spreadsheet document.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Worksheet {
    id: i64,
    title: String,
    index: u32,
}

impl Worksheet {
    pub fn new(id: i64, title: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            title: title.into(),
            index,
        }
    }

    /// The numeric sheet id, which is stable across renames.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The position of the tab in the document.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// An A1 range on this worksheet, e.g. `'19-10-2026'!A7`.
    pub(crate) fn range(&self, cells: &str) -> String {
        format!("'{}'!{cells}", self.title.replace('\'', "''"))
    }
}

/// The operations needed from a spreadsheet service. Rows and columns are 1-based, as in the
/// spreadsheet's own A1 notation.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Finds a worksheet by its title. Returns `None` if there is no such worksheet.
    async fn worksheet(&mut self, title: &str) -> Res<Option<Worksheet>>;

    /// Copies the worksheet `source_id` into a new worksheet named `title` at position `index`.
    async fn duplicate(&mut self, source_id: i64, index: u32, title: &str) -> Res<Worksheet>;

    /// Gets all values of a worksheet, one `Vec` per row. Trailing empty rows and cells are not
    /// returned.
    async fn get(&mut self, worksheet: &Worksheet) -> Res<Vec<Vec<String>>>;

    /// Gets the values of one column, from row 1 down to its last non-empty cell.
    async fn column(&mut self, worksheet: &Worksheet, column: usize) -> Res<Vec<String>>;

    /// Inserts new rows holding `rows` so that the first of them becomes row number `row`.
    async fn insert_rows(&mut self, worksheet: &Worksheet, row: usize, rows: &[Vec<String>])
        -> Res<()>;
}

/// Creates the `Sheet` for the spreadsheet named in `config`.
///
/// # Errors
/// - `ErrorType::Auth` if the service-account key cannot be loaded.
/// - `ErrorType::Sheet` if the spreadsheet cannot be found or opened.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    debug!("Opening spreadsheet {} in {mode:?} mode", config.spreadsheet());
    match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(config.credentials())
                .await
                .pub_result(ErrorType::Auth)?;
            let sheet = GoogleSheet::open(config.spreadsheet(), token_provider)
                .await
                .pub_result(ErrorType::Sheet)?;
            Ok(Box::new(sheet))
        }
        Mode::Test => Ok(Box::new(TestSheet::new(config.spreadsheet().key()))),
    }
}

/// The A1 letters of a 1-based column number, e.g. `1` -> `A`, `9` -> `I`, `28` -> `AB`.
pub(crate) fn column_letters(column: usize) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

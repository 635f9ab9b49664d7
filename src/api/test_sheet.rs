//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{Sheet, Worksheet};
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{LazyLock, Mutex};

/// The title of the template worksheet in the seed data.
const SEED_TEMPLATE: &str = "MODELO";

/// The in-memory spreadsheets, keyed by the spreadsheet id or name from the config. Keeping them
/// in a global lets separately constructed `TestSheet`s see each other's writes, the same way two
/// clients of one Google document would.
static STATE: LazyLock<Mutex<HashMap<String, TestSheetState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// The contents of one in-memory spreadsheet document.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    /// The worksheets in tab order.
    pub(crate) worksheets: Vec<TestWorksheet>,
}

impl TestSheetState {
    /// Finds a worksheet by title.
    pub(crate) fn find(&self, title: &str) -> Option<&TestWorksheet> {
        self.worksheets.iter().find(|ws| ws.title == title)
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut TestWorksheet> {
        self.worksheets.iter_mut().find(|ws| ws.id == id)
    }

    fn handle(&self, position: usize) -> Option<Worksheet> {
        self.worksheets
            .get(position)
            .map(|ws| Worksheet::new(ws.id, &ws.title, position as u32))
    }
}

/// One worksheet of an in-memory spreadsheet.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct TestWorksheet {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) rows: Vec<Vec<String>>,
}

/// An implementation of the `Sheet` trait that does not use Google sheets. Its data lives in
/// memory and, the first time a spreadsheet key is used, is seeded with a template worksheet.
pub(crate) struct TestSheet {
    key: String,
}

impl TestSheet {
    /// Create a new `TestSheet` for the spreadsheet identified by `key`.
    pub(crate) fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if let Ok(mut state) = STATE.lock() {
            state.entry(key.clone()).or_insert_with(default_state);
        }
        Self { key }
    }

    /// Returns a copy of the current contents of this spreadsheet.
    #[cfg(test)]
    pub(crate) fn get_state(&self) -> TestSheetState {
        self.with_state(|state| Ok(state.clone())).unwrap()
    }

    /// Replaces the contents of this spreadsheet.
    #[cfg(test)]
    pub(crate) fn set_state(&self, new_state: TestSheetState) {
        self.with_state(|state| {
            *state = new_state;
            Ok(())
        })
        .unwrap()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> Res<T>) -> Res<T> {
        let mut all = STATE
            .lock()
            .map_err(|_| anyhow::anyhow!("The test sheet state is poisoned"))?;
        let state = all
            .get_mut(&self.key)
            .with_context(|| format!("Spreadsheet '{}' not found", self.key))?;
        f(state)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn worksheet(&mut self, title: &str) -> Res<Option<Worksheet>> {
        self.with_state(|state| {
            let position = state.worksheets.iter().position(|ws| ws.title == title);
            Ok(position.and_then(|p| state.handle(p)))
        })
    }

    async fn duplicate(&mut self, source_id: i64, index: u32, title: &str) -> Res<Worksheet> {
        self.with_state(|state| {
            if state.find(title).is_some() {
                bail!("A sheet with the name \"{title}\" already exists");
            }
            let source = state
                .worksheets
                .iter()
                .find(|ws| ws.id == source_id)
                .with_context(|| format!("No worksheet with id {source_id}"))?;
            let copy = TestWorksheet {
                id: state.worksheets.iter().map(|ws| ws.id).max().unwrap_or(0) + 1,
                title: title.to_string(),
                rows: source.rows.clone(),
            };
            let position = (index as usize).min(state.worksheets.len());
            state.worksheets.insert(position, copy);
            state
                .handle(position)
                .context("The duplicated worksheet is missing")
        })
    }

    async fn get(&mut self, worksheet: &Worksheet) -> Res<Vec<Vec<String>>> {
        self.with_state(|state| {
            state
                .find(worksheet.title())
                .map(|ws| ws.rows.clone())
                .with_context(|| format!("Sheet '{}' not found", worksheet.title()))
        })
    }

    async fn column(&mut self, worksheet: &Worksheet, column: usize) -> Res<Vec<String>> {
        self.with_state(|state| {
            let ws = state
                .find(worksheet.title())
                .with_context(|| format!("Sheet '{}' not found", worksheet.title()))?;
            let mut values: Vec<String> = ws
                .rows
                .iter()
                .map(|row| row.get(column - 1).cloned().unwrap_or_default())
                .collect();
            // Like the API, stop at the last non-empty cell.
            while values.last().is_some_and(|v| v.is_empty()) {
                values.pop();
            }
            Ok(values)
        })
    }

    async fn insert_rows(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        rows: &[Vec<String>],
    ) -> Res<()> {
        self.with_state(|state| {
            let ws = state
                .find_mut(worksheet.id())
                .with_context(|| format!("Sheet '{}' not found", worksheet.title()))?;
            let start = row.saturating_sub(1);
            if ws.rows.len() < start {
                ws.rows.resize(start, Vec::new());
            }
            ws.rows.splice(start..start, rows.iter().cloned());
            Ok(())
        })
    }
}

/// A document holding only the template worksheet.
fn default_state() -> TestSheetState {
    let rows = load_csv(TEMPLATE_DATA).unwrap_or_default();
    TestSheetState {
        worksheets: vec![TestWorksheet {
            id: 0,
            title: SEED_TEMPLATE.to_string(),
            rows,
        }],
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed template: six header rows, the last of which names the columns.
const TEMPLATE_DATA: &str = r##"CAIXA EXPRESS
Data,
Veículos,
Boletos,
,
DATA,HORA,QTD,VALOR,TAXA,ADD,SAIU,FORMA,PLACA
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_sheet() -> TestSheet {
        TestSheet::new(Uuid::new_v4().to_string())
    }

    #[test]
    fn test_seed_has_six_header_rows() {
        let rows = load_csv(TEMPLATE_DATA).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].len(), 9);
    }

    #[tokio::test]
    async fn test_worksheet_lookup() {
        let mut sheet = new_sheet();
        let template = sheet.worksheet(SEED_TEMPLATE).await.unwrap().unwrap();
        assert_eq!(template.id(), 0);
        assert!(sheet.worksheet("01-01-2000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate() {
        let mut sheet = new_sheet();
        let ws = sheet.duplicate(0, 1, "19-10-2026").await.unwrap();
        assert_eq!(ws.index(), 1);
        assert_ne!(ws.id(), 0);
        assert_eq!(sheet.get(&ws).await.unwrap().len(), 6);
        assert!(sheet.duplicate(0, 1, "19-10-2026").await.is_err());
    }

    #[tokio::test]
    async fn test_insert_rows_pads_and_shifts() {
        let mut sheet = new_sheet();
        let ws = sheet.duplicate(0, 1, "19-10-2026").await.unwrap();
        let first = vec![vec!["a".to_string()]];
        let second = vec![vec!["b".to_string()]];

        sheet.insert_rows(&ws, 9, &first).await.unwrap();
        sheet.insert_rows(&ws, 7, &second).await.unwrap();

        let rows = sheet.get(&ws).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[6], second[0]);
        assert!(rows[7].is_empty());
        assert_eq!(rows[9], first[0]);
    }

    #[tokio::test]
    async fn test_column_trims_trailing_empty_cells() {
        let mut sheet = new_sheet();
        let ws = sheet.worksheet(SEED_TEMPLATE).await.unwrap().unwrap();
        let column = sheet.column(&ws, 9).await.unwrap();
        assert_eq!(column, vec!["", "", "", "", "", "PLACA"]);
        let column = sheet.column(&ws, 1).await.unwrap();
        assert_eq!(column.len(), 6);
    }

    #[tokio::test]
    async fn test_state_is_shared_by_key() {
        let key = Uuid::new_v4().to_string();
        let mut a = TestSheet::new(&key);
        a.duplicate(0, 1, "19-10-2026").await.unwrap();
        let b = TestSheet::new(&key);
        assert!(b.get_state().find("19-10-2026").is_some());
    }
}

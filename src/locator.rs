//! Finds the worksheet for a given day, creating it from the template worksheet on first use.

use crate::api::{Sheet, Worksheet};
use crate::error::Res;
use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info};

/// The title format of daily worksheets, e.g. `19-10-2026`.
pub const WORKSHEET_TITLE_FORMAT: &str = "%d-%m-%Y";

/// The title of the worksheet that holds the data for `date`.
pub fn worksheet_title(date: NaiveDate) -> String {
    date.format(WORKSHEET_TITLE_FORMAT).to_string()
}

/// Returns the worksheet named after `today`. If there is none, the worksheet titled `template`
/// is duplicated, given today's title and placed at tab position `insert_index`.
///
/// # Errors
/// - The template worksheet does not exist.
/// - Any call to the spreadsheet service fails. Nothing is retried.
pub(crate) async fn open_today(
    sheet: &mut (dyn Sheet + Send),
    template: &str,
    insert_index: u32,
    today: NaiveDate,
) -> Res<Worksheet> {
    let title = worksheet_title(today);
    if let Some(worksheet) = sheet.worksheet(&title).await? {
        debug!("Found worksheet '{title}'");
        return Ok(worksheet);
    }

    let template_ws = sheet
        .worksheet(template)
        .await?
        .with_context(|| format!("The template worksheet '{template}' does not exist"))?;

    let worksheet = sheet
        .duplicate(template_ws.id(), insert_index, &title)
        .await
        .with_context(|| format!("Unable to create worksheet '{title}' from '{template}'"))?;
    info!(
        "Created worksheet '{}' from template '{template}' at position {}",
        worksheet.title(),
        worksheet.index()
    );
    Ok(worksheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_worksheet_title() {
        assert_eq!(worksheet_title(date()), "19-10-2026");
        let new_year = NaiveDate::from_ymd_opt(2027, 1, 2).unwrap();
        assert_eq!(worksheet_title(new_year), "02-01-2027");
    }

    #[tokio::test]
    async fn test_open_today_creates_once() {
        let mut sheet = TestSheet::new(Uuid::new_v4().to_string());

        let first = open_today(&mut sheet, "MODELO", 1, date()).await.unwrap();
        let second = open_today(&mut sheet, "MODELO", 1, date()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.title(), "19-10-2026");
        assert_eq!(first.index(), 1);

        let state = sheet.get_state();
        let titles: Vec<&str> = state.worksheets.iter().map(|ws| ws.title.as_str()).collect();
        assert_eq!(titles, vec!["MODELO", "19-10-2026"]);
    }

    #[tokio::test]
    async fn test_new_worksheet_copies_template() {
        let mut sheet = TestSheet::new(Uuid::new_v4().to_string());
        let ws = open_today(&mut sheet, "MODELO", 1, date()).await.unwrap();
        let template = sheet.worksheet("MODELO").await.unwrap().unwrap();
        assert_eq!(
            sheet.get(&ws).await.unwrap(),
            sheet.get(&template).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_each_day_gets_its_own_worksheet() {
        let mut sheet = TestSheet::new(Uuid::new_v4().to_string());
        let next_day = date().succ_opt().unwrap();
        open_today(&mut sheet, "MODELO", 1, date()).await.unwrap();
        open_today(&mut sheet, "MODELO", 1, next_day).await.unwrap();

        let state = sheet.get_state();
        let titles: Vec<&str> = state.worksheets.iter().map(|ws| ws.title.as_str()).collect();
        // The newest day goes to the insert position, ahead of older days.
        assert_eq!(titles, vec!["MODELO", "20-10-2026", "19-10-2026"]);
    }

    #[tokio::test]
    async fn test_missing_template() {
        let mut sheet = TestSheet::new(Uuid::new_v4().to_string());
        let err = open_today(&mut sheet, "TEMPLATE", 1, date())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TEMPLATE"));
        assert_eq!(sheet.get_state().worksheets.len(), 1);
    }
}

//! Implements the `Sheet` trait using the `sheets::Client` for cell values, and plain requests to
//! the Sheets and Drive REST APIs for the structural operations the client does not cover
//! (listing worksheets, duplicating a worksheet, inserting rows and finding a document by name).

use crate::api::{column_letters, Sheet, TokenProvider, Worksheet};
use crate::config::SpreadsheetRef;
use crate::error::Res;
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::{debug, trace};
use url::Url;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Implements the `Sheet` trait against one Google spreadsheet document. It takes a
/// `TokenProvider` from which it gets a fresh access token before each call.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSheet {
    /// Opens the spreadsheet by id, or finds it by its document name through the Drive API.
    pub(crate) async fn open(
        spreadsheet: &SpreadsheetRef,
        token_provider: TokenProvider,
    ) -> Res<Self> {
        let client = create_sheets_client(&token_provider).await?;
        let http = reqwest::Client::new();
        let spreadsheet_id = match spreadsheet {
            SpreadsheetRef::Id(id) => id.clone(),
            SpreadsheetRef::Name(name) => find_by_name(&http, &token_provider, name).await?,
        };
        debug!("Using spreadsheet {spreadsheet_id}");
        Ok(Self {
            spreadsheet_id,
            token_provider,
            client,
            http,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&self.token_provider).await?;
        Ok(())
    }

    /// Lists the worksheets of the document.
    async fn worksheets(&mut self) -> Res<Vec<Worksheet>> {
        let token = self.token_provider.token().await?;
        let url = Url::parse_with_params(
            &format!("{SHEETS_API}/{}", self.spreadsheet_id),
            &[("fields", "sheets.properties(sheetId,title,index)")],
        )?;
        let request = self.http.get(url).bearer_auth(token);
        let body: SpreadsheetBody = send(request, "Google Sheets API get").await?;
        Ok(body
            .sheets
            .into_iter()
            .map(|s| s.properties.into())
            .collect())
    }

    /// Sends a `batchUpdate` with the given structural requests.
    async fn batch_update(&mut self, requests: serde_json::Value) -> Res<BatchUpdateBody> {
        let token = self.token_provider.token().await?;
        let url = format!("{SHEETS_API}/{}:batchUpdate", self.spreadsheet_id);
        let request = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "requests": requests }));
        send(request, "Google Sheets API batchUpdate").await
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn worksheet(&mut self, title: &str) -> Res<Option<Worksheet>> {
        trace!("worksheet for {title}");
        let worksheets = self
            .worksheets()
            .await
            .context("Failed to list the worksheets")?;
        Ok(worksheets.into_iter().find(|ws| ws.title() == title))
    }

    async fn duplicate(&mut self, source_id: i64, index: u32, title: &str) -> Res<Worksheet> {
        trace!("duplicate {source_id} as {title} at {index}");
        let body = self
            .batch_update(json!([{
                "duplicateSheet": {
                    "sourceSheetId": source_id,
                    "insertSheetIndex": index,
                    "newSheetName": title,
                }
            }]))
            .await
            .with_context(|| format!("Failed to create the worksheet {title}"))?;
        let properties = body
            .replies
            .into_iter()
            .find_map(|reply| reply.duplicate_sheet)
            .map(|reply| reply.properties)
            .context("Google Sheets API response is missing the duplicated sheet")?;
        Ok(properties.into())
    }

    async fn get(&mut self, worksheet: &Worksheet) -> Res<Vec<Vec<String>>> {
        trace!("get for {}", worksheet.title());
        self.refresh_client().await?;
        let range = worksheet.range("A:ZZ"); // Get all columns
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {} sheet data", worksheet.title()))?;
        Ok(response.body.values)
    }

    async fn column(&mut self, worksheet: &Worksheet, column: usize) -> Res<Vec<String>> {
        trace!("column {column} for {}", worksheet.title());
        self.refresh_client().await?;
        let letters = column_letters(column);
        let range = worksheet.range(&format!("{letters}:{letters}"));
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Columns,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| {
                format!("Failed to fetch column {letters} of {}", worksheet.title())
            })?;
        Ok(response.body.values.into_iter().next().unwrap_or_default())
    }

    async fn insert_rows(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        rows: &[Vec<String>],
    ) -> Res<()> {
        trace!("insert {} rows at {row} of {}", rows.len(), worksheet.title());
        if rows.is_empty() {
            return Ok(());
        }

        // Make room first so that nothing below the insertion point is overwritten.
        self.batch_update(insert_rows_request(worksheet, row, rows.len()))
            .await
            .with_context(|| format!("Failed to insert rows into {}", worksheet.title()))?;

        self.refresh_client().await?;
        let request = write_rows_request(worksheet, row, rows);
        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to write rows into {}", worksheet.title()))?;
        Ok(())
    }
}

/// Finds the id of the spreadsheet document called `name` among the files visible to the
/// service account. If several share the name, the first one returned by Drive is used.
async fn find_by_name(http: &reqwest::Client, tokens: &TokenProvider, name: &str) -> Res<String> {
    let query = drive_query(name);
    let url = Url::parse_with_params(
        DRIVE_FILES_API,
        &[("q", query.as_str()), ("fields", "files(id,name)")],
    )?;
    let request = http.get(url).bearer_auth(tokens.token().await?);
    let body: FileListBody = send(request, "Google Drive API files list").await?;
    if body.files.len() > 1 {
        debug!(
            "Found {} spreadsheets named '{name}', using the first",
            body.files.len()
        );
    }
    match body.files.into_iter().next() {
        Some(file) => Ok(file.id),
        None => bail!(
            "No spreadsheet named '{name}' was found. Make sure it is shared with the service \
            account."
        ),
    }
}

/// The `batchUpdate` requests that insert `count` empty rows into `worksheet`, the first of which
/// becomes the 1-based `row`. The new rows take their formatting from the row above, unless they
/// start the worksheet.
fn insert_rows_request(worksheet: &Worksheet, row: usize, count: usize) -> serde_json::Value {
    let start = row.saturating_sub(1);
    json!([{
        "insertDimension": {
            "range": {
                "sheetId": worksheet.id(),
                "dimension": "ROWS",
                "startIndex": start,
                "endIndex": start + count,
            },
            "inheritFromBefore": start > 0,
        }
    }])
}

/// Writes `rows` starting at column A of the 1-based `row`. Values are entered as if typed, so
/// that `15,50` becomes a number in a pt-BR spreadsheet.
fn write_rows_request(
    worksheet: &Worksheet,
    row: usize,
    rows: &[Vec<String>],
) -> BatchUpdateValuesRequest {
    BatchUpdateValuesRequest {
        data: vec![ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: worksheet.range(&format!("A{row}")),
            values: rows.to_vec(),
        }],
        include_values_in_response: Some(false),
        response_date_time_render_option: None,
        response_value_render_option: None,
        value_input_option: Some(ValueInputOption::UserEntered),
    }
}

/// The Drive `files.list` query matching spreadsheets called `name` that are not in the trash.
fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false")
}

/// Sends `request` and parses a successful JSON response. A non-success status becomes an error
/// that includes the response body.
async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder, api: &str) -> Res<T> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {api}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("{api} failed with status {status}: {body}");
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {api} response"))
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token().await?;

    // The sheets crate requires client_id, client_secret, and redirect_uri, but we don't need
    // them for API calls, only the access token.
    Ok(sheets::Client::new(
        String::new(), // client_id
        String::new(), // client_secret
        String::new(), // redirect_uri
        access_token,
        String::new(), // refresh_token (the service account authenticator refreshes for us)
    ))
}

fn map_client_error(e: sheets::ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetBody {
    #[serde(default)]
    sheets: Vec<SheetBody>,
}

#[derive(Debug, Deserialize)]
struct SheetBody {
    properties: SheetProperties,
}

/// The JSON API omits fields holding their default value, so a zero `sheetId` or `index` may be
/// missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: u32,
}

impl From<SheetProperties> for Worksheet {
    fn from(p: SheetProperties) -> Self {
        Worksheet::new(p.sheet_id, p.title, p.index)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BatchUpdateBody {
    #[serde(default)]
    replies: Vec<ReplyBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
    duplicate_sheet: Option<DuplicateSheetBody>,
}

#[derive(Debug, Deserialize)]
struct DuplicateSheetBody {
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
struct FileListBody {
    #[serde(default)]
    files: Vec<FileBody>,
}

#[derive(Debug, Deserialize)]
struct FileBody {
    id: String,
}

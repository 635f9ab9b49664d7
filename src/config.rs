//! Configuration file handling for the cash register.
//!
//! The configuration file is stored at `$CAIXA_HOME/config.json` and names the spreadsheet, its
//! template worksheet, the timezone that decides what "today" is, and where the service-account
//! key lives.

use crate::api::Credentials;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "caixa";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CREDENTIALS_JSON: &str = "credentials.json";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_TEMPLATE: &str = "MODELO";
const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
const DEFAULT_HEADER_ROWS: usize = 6;
const DEFAULT_INSERT_INDEX: u32 = 1;

/// When set and non-empty, holds the whole service-account key as JSON and takes precedence over
/// the key file.
pub const SERVICE_ACCOUNT_ENV: &str = "CAIXA_SERVICE_ACCOUNT";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CAIXA_HOME` and from there it loads `$CAIXA_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet: SpreadsheetRef,
    timezone: Tz,
}

impl Config {
    /// Creates the home directory, its `.secrets` subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/caixa`
    /// - `spreadsheet` - The URL of the Google Sheet, or the name of the spreadsheet document.
    /// - `key_file` - An optional service-account key file. It is copied to its default location
    ///   in the secrets directory. It can be omitted when the key is provided through
    ///   `CAIXA_SERVICE_ACCOUNT` instead.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub(crate) async fn create(
        dir: impl Into<PathBuf>,
        spreadsheet: &str,
        key_file: Option<&Path>,
    ) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the caixa home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        if let Some(key_file) = key_file {
            utils::copy(key_file, secrets.join(CREDENTIALS_JSON)).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            spreadsheet: spreadsheet.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Self::new(root, config_path, config_file)
    }

    /// This will
    /// - validate that `caixa_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    ///
    /// # Errors
    /// - Returns an `ErrorType::Config` error if any of these steps fail.
    pub async fn load(caixa_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_home(caixa_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_home(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Caixa home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Self::new(root, config_path, config_file)
    }

    fn new(root: PathBuf, config_path: PathBuf, config_file: ConfigFile) -> Res<Self> {
        anyhow::ensure!(
            !config_file.spreadsheet.trim().is_empty(),
            "The spreadsheet is not set in '{}'",
            config_path.display()
        );
        let spreadsheet = SpreadsheetRef::parse(&config_file.spreadsheet)?;
        let timezone: Tz = config_file
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {e}", config_file.timezone))?;
        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet,
            timezone,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn spreadsheet(&self) -> &SpreadsheetRef {
        &self.spreadsheet
    }

    /// The title of the worksheet that is copied to create each day's worksheet.
    pub fn template(&self) -> &str {
        &self.config_file.template
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The number of rows at the top of each worksheet that belong to the template.
    pub fn header_rows(&self) -> usize {
        self.config_file.header_rows
    }

    /// The 1-based number of the first row that may hold data.
    pub fn first_data_row(&self) -> usize {
        self.config_file.header_rows + 1
    }

    /// The tab position given to a newly created daily worksheet.
    pub fn insert_index(&self) -> u32 {
        self.config_file.insert_index
    }

    /// The current instant in the configured timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn credentials_path(&self) -> PathBuf {
        let p = self.config_file.credentials_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Where the service-account key comes from: the `CAIXA_SERVICE_ACCOUNT` secret if it is
    /// set, otherwise the key file.
    pub(crate) fn credentials(&self) -> Credentials {
        match std::env::var(SERVICE_ACCOUNT_ENV) {
            Ok(json) if !json.trim().is_empty() => Credentials::Inline(json),
            _ => Credentials::KeyFile(self.credentials_path()),
        }
    }
}

/// How the spreadsheet document is identified.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SpreadsheetRef {
    /// The id taken from a Google Sheets URL.
    Id(String),
    /// The document's name, looked up through Google Drive.
    Name(String),
}

impl SpreadsheetRef {
    /// Treats `value` as a Google Sheets URL if it looks like one, otherwise as a document name.
    pub(crate) fn parse(value: &str) -> Res<Self> {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            let id = extract_spreadsheet_id(value)
                .context("Failed to extract spreadsheet ID from sheet URL")?;
            Ok(SpreadsheetRef::Id(id.to_string()))
        } else {
            Ok(SpreadsheetRef::Name(value.to_string()))
        }
    }

    /// The id or the name, whichever identifies the document.
    pub fn key(&self) -> &str {
        match self {
            SpreadsheetRef::Id(s) | SpreadsheetRef::Name(s) => s,
        }
    }
}

impl Display for SpreadsheetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadsheetRef::Id(id) => write!(f, "id {id}"),
            SpreadsheetRef::Name(name) => write!(f, "named {name}"),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "caixa",
///   "config_version": 1,
///   "spreadsheet": "sistema_pagamentos",
///   "template": "MODELO",
///   "timezone": "America/Sao_Paulo",
///   "header_rows": 6,
///   "insert_index": 1,
///   "credentials_path": ".secrets/credentials.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "caixa"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL of the Google Sheet, or the name of the spreadsheet document
    spreadsheet: String,

    /// Title of the template worksheet
    template: String,

    /// IANA timezone used to decide the current date, e.g. "America/Sao_Paulo"
    timezone: String,

    /// Number of rows at the top of each worksheet reserved for the template header
    header_rows: usize,

    /// Tab position of newly created daily worksheets
    insert_index: u32,

    /// Path to the service-account key file (optional, relative to the home directory or
    /// absolute). Defaults to $CAIXA_HOME/.secrets/credentials.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            spreadsheet: String::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            header_rows: DEFAULT_HEADER_ROWS,
            insert_index: DEFAULT_INSERT_INDEX,
            credentials_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the credentials path. If None, defaults to .secrets/credentials.json
    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CREDENTIALS_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            if !id.is_empty() {
                return Ok(id);
            }
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file naming `spreadsheet` along with default settings
/// - Copies `key_file`, if given, into its default location in the home directory.
///
/// # Arguments
/// - `caixa_home` - The directory that will be the root of the home directory, e.g. `$HOME/caixa`
/// - `spreadsheet` - The URL of the Google Sheet, e.g.
///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX, or the
///   name of the spreadsheet document, e.g. `sistema_pagamentos`.
/// - `key_file` - The service-account key JSON downloaded from Google Cloud. It can be omitted
///   when the key will be provided through `CAIXA_SERVICE_ACCOUNT` instead.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    caixa_home: &Path,
    spreadsheet: &str,
    key_file: Option<&Path>,
) -> Result<Out<()>> {
    let config = Config::create(caixa_home, spreadsheet, key_file)
        .await
        .context("Unable to create the caixa home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the caixa home directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("caixa");
        let out = init(&home, "sistema_pagamentos", None).await.unwrap();
        assert!(out.message().contains("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join(".secrets").is_dir());
    }

    #[tokio::test]
    async fn test_init_missing_key_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = init(&dir.path().join("caixa"), "x", Some(&missing))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}

//! Service-account credentials and the access tokens obtained with them.
//!
//! The key is taken either from an inline JSON secret (an environment variable holding the whole
//! key file, as hosting platforms usually provide secrets) or from a key file on disk.

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::Context;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use std::path::PathBuf;
use tracing::{debug, trace};
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// Where the service-account key comes from.
#[derive(Clone, Eq, PartialEq)]
pub(crate) enum Credentials {
    /// The JSON contents of a service-account key.
    Inline(String),
    /// The path to a service-account key file.
    KeyFile(PathBuf),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Never print the secret itself.
            Credentials::Inline(_) => f.write_str("Inline(..)"),
            Credentials::KeyFile(path) => write!(f, "KeyFile({})", path.display()),
        }
    }
}

impl Credentials {
    /// Reads and parses the service-account key.
    pub(crate) async fn key(&self) -> Res<ServiceAccountKey> {
        match self {
            Credentials::Inline(json) => yup_oauth2::parse_service_account_key(json)
                .context("Unable to parse the inline service account secret"),
            Credentials::KeyFile(path) => yup_oauth2::read_service_account_key(path)
                .await
                .with_context(|| {
                    format!(
                        "Unable to read the service account key file at {}",
                        path.display()
                    )
                }),
        }
    }
}

/// Provides access tokens for the service account. The authenticator caches the token and
/// refreshes it shortly before it expires.
pub(crate) struct TokenProvider {
    auth: Authenticator<HttpsConnector<HttpConnector>>,
}

impl TokenProvider {
    /// Loads the service-account key and builds the authenticator. This does not contact Google.
    pub(crate) async fn load(credentials: Credentials) -> Res<Self> {
        debug!("Loading service account credentials from {credentials:?}");
        let key = credentials.key().await?;
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("Failed to create the service account authenticator")?;
        Ok(Self { auth })
    }

    /// Returns a valid access token, fetching a new one if needed.
    pub(crate) async fn token(&self) -> Res<String> {
        trace!("Requesting an access token");
        let token = self
            .auth
            .token(OAUTH_SCOPES)
            .await
            .context("Failed to get an access token for the service account")?;
        token
            .token()
            .map(str::to_string)
            .context("The access token response did not contain a token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_inline_secret_that_is_not_json() {
        let credentials = Credentials::Inline("not json".to_string());
        let err = credentials.key().await.unwrap_err();
        assert!(err.to_string().contains("inline service account secret"));
    }

    #[tokio::test]
    async fn test_missing_key_file() {
        let dir = TempDir::new().unwrap();
        let credentials = Credentials::KeyFile(dir.path().join("missing.json"));
        let err = credentials.key().await.unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_debug_hides_inline_secret() {
        let credentials = Credentials::Inline(r#"{"private_key": "secret"}"#.to_string());
        assert_eq!(format!("{credentials:?}"), "Inline(..)");
    }
}

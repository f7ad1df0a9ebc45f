//! OAuth authorisation boundary.
//!
//! The conversion pipeline never performs the OAuth dance itself — it only
//! consumes a ready bearer token through [`crate::remote::DriveClient`].
//! This module is the external collaborator that produces that token:
//! generate the consent URL, exchange an authorisation code, persist the
//! result as JSON, and load it back on later runs.
//!
//! Token refresh is out of scope: a run uses whatever access token is
//! stored, and an expired one surfaces as HTTP 401 job failures.

use crate::error::Sheets2PdfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scopes the pipeline needs: artifact lifecycle in Drive plus spreadsheet
/// metadata reads.
const SCOPES: &str =
    "https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/spreadsheets";

/// OAuth client settings, supplied by the caller (the CLI reads them from
/// the environment).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Where the exchanged token is persisted as JSON.
    pub token_path: PathBuf,
}

/// The persisted token, as returned by the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Produces and stores credentials; see the module docs.
pub struct AuthProvider {
    config: AuthConfig,
    http: reqwest::Client,
}

impl AuthProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The consent URL the user must open in a browser.
    pub fn auth_url(&self) -> String {
        // Url::parse_with_params handles the percent-encoding of the scopes.
        let url = reqwest::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
            ],
        )
        .expect("static auth endpoint URL is valid");
        url.into()
    }

    /// Exchange an authorisation code for a token and persist it.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, Sheets2PdfError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| Sheets2PdfError::Auth {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Sheets2PdfError::Auth {
                detail: format!("token endpoint returned HTTP {status}: {body}"),
            });
        }

        let token: StoredToken = response.json().await.map_err(|e| Sheets2PdfError::Auth {
            detail: format!("unparseable token response: {e}"),
        })?;

        self.store(&token)?;
        tracing::info!(path = %self.config.token_path.display(), "stored OAuth token");
        Ok(token)
    }

    /// Load the persisted token, or `None` when no token has been stored yet.
    pub fn load_stored_token(&self) -> Result<Option<StoredToken>, Sheets2PdfError> {
        let path = &self.config.token_path;
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Sheets2PdfError::TokenStore {
                    path: path.clone(),
                    source: e,
                })
            }
        };
        let token = serde_json::from_slice(&bytes).map_err(|e| Sheets2PdfError::Auth {
            detail: format!("stored token at '{}' is unreadable: {e}", path.display()),
        })?;
        Ok(Some(token))
    }

    fn store(&self, token: &StoredToken) -> Result<(), Sheets2PdfError> {
        let path = &self.config.token_path;
        let json = serde_json::to_vec_pretty(token)
            .map_err(|e| Sheets2PdfError::Internal(format!("token serialisation: {e}")))?;
        std::fs::write(path, json).map_err(|e| Sheets2PdfError::TokenStore {
            path: path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token_path: PathBuf) -> AuthConfig {
        AuthConfig {
            client_id: "client-123.apps.googleusercontent.com".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8000/google/redirect".into(),
            token_path,
        }
    }

    #[test]
    fn auth_url_carries_client_and_scopes() {
        let provider = AuthProvider::new(config(PathBuf::from("/tmp/unused.json")));
        let url = provider.auth_url();
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("client-123.apps.googleusercontent.com"));
        assert!(url.contains("access_type=offline"));
        // Scopes must be percent-encoded, not raw.
        assert!(url.contains("auth%2Fdrive"));
        assert!(url.contains("auth%2Fspreadsheets"));
    }

    #[test]
    fn stored_token_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = AuthProvider::new(config(dir.path().join("token.json")));

        let token = StoredToken {
            access_token: "ya29.abc".into(),
            refresh_token: Some("1//refresh".into()),
            token_type: Some("Bearer".into()),
            expires_in: Some(3599),
            scope: None,
        };
        provider.store(&token).unwrap();

        let loaded = provider.load_stored_token().unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.abc");
        assert_eq!(loaded.refresh_token.as_deref(), Some("1//refresh"));
    }

    #[test]
    fn missing_token_file_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = AuthProvider::new(config(dir.path().join("absent.json")));
        assert!(provider.load_stored_token().unwrap().is_none());
    }

    #[test]
    fn corrupt_token_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"not json").unwrap();
        let provider = AuthProvider::new(config(path));
        let err = provider.load_stored_token().unwrap_err();
        assert!(matches!(err, Sheets2PdfError::Auth { .. }));
    }
}

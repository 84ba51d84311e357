//! Google OAuth access tokens for the Sheets API.
//!
//! A service-account key is turned into a short-lived access token with the
//! JWT-bearer grant: an RS256-signed assertion is posted to the key's
//! `token_uri` and the returned token is cached until shortly before it
//! expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key that token minting needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[redacted]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Reads a key file downloaded from the Google Cloud console.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Credentials`] if the file cannot be read or is
    /// not a service-account key.
    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SheetsError::Credentials {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SheetsError::Credentials {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Credentials used by [`crate::SheetsSink`].
#[derive(Clone)]
pub enum SheetsAuth {
    ServiceAccount(ServiceAccountKey),
    AccessToken(String),
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"[redacted]").finish(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// An access token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn signed_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, SheetsError> {
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: SHEETS_SCOPE.to_owned(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &encoding_key)?)
}

/// Exchanges a signed assertion for an access token at `key.token_uri`.
///
/// # Errors
///
/// - [`SheetsError::Signing`] if the private key is not a valid RSA PEM.
/// - [`SheetsError::TokenExchange`] when the token endpoint rejects the grant.
/// - [`SheetsError::Http`] on transport failures.
pub async fn exchange_token(
    client: &Client,
    key: &ServiceAccountKey,
    now: DateTime<Utc>,
) -> Result<AccessToken, SheetsError> {
    let assertion = signed_assertion(key, now)?;
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        let detail = match serde_json::from_str::<TokenErrorBody>(&text) {
            Ok(body) => match body.error_description {
                Some(description) => format!("{}: {description}", body.error),
                None => body.error,
            },
            Err(_) => text.chars().take(300).collect(),
        };
        return Err(SheetsError::TokenExchange {
            status: status.as_u16(),
            detail,
        });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&text).map_err(|source| SheetsError::Deserialize {
            context: "token response".to_owned(),
            source,
        })?;
    let lifetime = parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    tracing::debug!(
        client_email = %key.client_email,
        expires_in = lifetime,
        "minted Sheets access token"
    );
    Ok(AccessToken {
        token: parsed.access_token,
        expires_at: now + Duration::seconds(lifetime),
    })
}

/// Hands out a valid bearer token, minting a fresh one when needed.
pub(crate) struct TokenSource {
    auth: SheetsAuth,
    cached: Option<AccessToken>,
}

impl TokenSource {
    pub(crate) fn new(auth: SheetsAuth) -> Self {
        Self { auth, cached: None }
    }

    pub(crate) async fn bearer(&mut self, client: &Client) -> Result<String, SheetsError> {
        let key = match &self.auth {
            SheetsAuth::AccessToken(token) => return Ok(token.clone()),
            SheetsAuth::ServiceAccount(key) => key,
        };

        let now = Utc::now();
        if let Some(cached) = &self.cached {
            if cached.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(cached.token.clone());
            }
        }

        let fresh = exchange_token(client, key, now).await?;
        let token = fresh.token.clone();
        self.cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    use super::*;

    fn fixture_key() -> ServiceAccountKey {
        let path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service_account.json");
        ServiceAccountKey::from_file(&path).unwrap()
    }

    #[test]
    fn assertion_carries_scope_audience_and_key_id() {
        let key = fixture_key();
        let now = DateTime::from_timestamp(1_717_200_000, 0).unwrap();

        let jwt = signed_assertion(&key, now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("0123456789abcdef"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_audience(&[key.token_uri.as_str()]);
        let claims = decode::<AssertionClaims>(&jwt, &DecodingKey::from_secret(&[]), &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.iss, "report-writer@cianstat-test.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn malformed_private_key_is_a_signing_error() {
        let mut key = fixture_key();
        key.private_key = "not a pem".to_owned();
        let err = signed_assertion(&key, Utc::now()).unwrap_err();
        assert!(matches!(err, SheetsError::Signing(_)), "got {err:?}");
    }

    #[test]
    fn missing_key_file_is_a_credentials_error() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(matches!(err, SheetsError::Credentials { .. }), "got {err:?}");
    }

    #[test]
    fn key_debug_redacts_private_key() {
        let debug = format!("{:?}", SheetsAuth::ServiceAccount(fixture_key()));
        assert!(!debug.contains("BEGIN PRIVATE KEY"));
        assert!(debug.contains("report-writer@"));
    }
}

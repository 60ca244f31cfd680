//! Bearer tokens for the Google APIs.
//!
//! A [`TokenSource`] comes from, in order: the `STORELOCATOR_ACCESS_TOKEN`
//! value passed in by the caller, or the credentials file. Credentials files
//! may hold a literal `access_token`, be `authorized_user` files (as written
//! by `gcloud auth application-default login`), or be `service_account`
//! keys. Tokens from the last two are cached and refreshed before they
//! expire, so long loads keep a valid token.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::GcpError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth scope covering both BigQuery and Pub/Sub.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Refreshed tokens are replaced this long before Google expires them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// An OAuth2 access token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

/// Parsed credentials file.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(AccessToken),
    AuthorizedUser(AuthorizedUser),
    /// A service-account key; `key_json` is the file content, handed to the
    /// JWT signer as is.
    ServiceAccount {
        client_email: String,
        key_json: String,
    },
}

/// Refresh-token credentials of an end user.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: String,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::AccessToken(token) => f.debug_tuple("AccessToken").field(token).finish(),
            Credentials::AuthorizedUser(user) => f.debug_tuple("AuthorizedUser").field(user).finish(),
            Credentials::ServiceAccount { client_email, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("key_json", &"[redacted]")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    access_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    token_uri: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Read and classify a credentials file.
///
/// # Errors
///
/// - [`GcpError::CredentialsIo`] if the file cannot be read.
/// - [`GcpError::Credentials`] if it is not JSON, has an unknown type, or
///   lacks the fields its type needs.
pub fn load_credentials(path: &Path) -> Result<Credentials, GcpError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| GcpError::CredentialsIo {
        path: display.clone(),
        source: e,
    })?;
    let file: CredentialsFile =
        serde_json::from_str(&content).map_err(|e| GcpError::Credentials {
            path: display.clone(),
            reason: format!("not a JSON credentials file: {e}"),
        })?;

    if let Some(token) = file.access_token.filter(|t| !t.is_empty()) {
        return Ok(Credentials::AccessToken(AccessToken::new(token)));
    }

    let require = |value: Option<String>, kind: &str, field: &str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GcpError::Credentials {
                path: display.clone(),
                reason: format!("{kind} credentials missing `{field}`"),
            })
    };

    match file.kind.as_deref() {
        Some(kind @ "authorized_user") => Ok(Credentials::AuthorizedUser(AuthorizedUser {
            client_id: require(file.client_id, kind, "client_id")?,
            client_secret: require(file.client_secret, kind, "client_secret")?,
            refresh_token: require(file.refresh_token, kind, "refresh_token")?,
            token_uri: file
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
        })),
        Some(kind @ "service_account") => {
            require(file.private_key, kind, "private_key")?;
            Ok(Credentials::ServiceAccount {
                client_email: require(file.client_email, kind, "client_email")?,
                key_json: content,
            })
        }
        Some(other) => Err(GcpError::Credentials {
            path: display,
            reason: format!("unsupported credentials type `{other}`"),
        }),
        None => Err(GcpError::Credentials {
            path: display,
            reason: "missing `type` and `access_token`".to_owned(),
        }),
    }
}

/// Hands out a valid access token for every request.
#[derive(Clone)]
pub struct TokenSource(Arc<Source>);

enum Source {
    Static(AccessToken),
    AuthorizedUser {
        user: AuthorizedUser,
        client: Client,
        cached: Mutex<Option<CachedToken>>,
    },
    ServiceAccount(CustomServiceAccount),
}

struct CachedToken {
    token: AccessToken,
    refresh_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.refresh_at.is_none_or(|at| Instant::now() < at)
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.0.as_ref() {
            Source::Static(_) => "static",
            Source::AuthorizedUser { .. } => "authorized_user",
            Source::ServiceAccount(_) => "service_account",
        };
        f.debug_tuple("TokenSource").field(&kind).finish()
    }
}

impl From<AccessToken> for TokenSource {
    fn from(token: AccessToken) -> Self {
        Self(Arc::new(Source::Static(token)))
    }
}

impl TokenSource {
    /// Build a token source for `credentials`. No token is fetched yet.
    ///
    /// # Errors
    ///
    /// - [`GcpError::Http`] if the refresh client cannot be constructed.
    /// - [`GcpError::TokenProvider`] if a service-account key cannot be
    ///   parsed.
    pub fn from_credentials(credentials: Credentials, timeout_secs: u64) -> Result<Self, GcpError> {
        let source = match credentials {
            Credentials::AccessToken(token) => Source::Static(token),
            Credentials::AuthorizedUser(user) => Source::AuthorizedUser {
                user,
                client: Client::builder()
                    .timeout(Duration::from_secs(timeout_secs))
                    .build()?,
                cached: Mutex::new(None),
            },
            Credentials::ServiceAccount { key_json, .. } => {
                Source::ServiceAccount(CustomServiceAccount::from_json(&key_json)?)
            }
        };
        Ok(Self(Arc::new(source)))
    }

    /// Current access token, refreshed first if it is about to expire.
    ///
    /// # Errors
    ///
    /// - [`GcpError::Api`] if the token endpoint rejects the credentials.
    /// - [`GcpError::TokenProvider`] if service-account token signing or
    ///   exchange fails.
    /// - [`GcpError::Http`], [`GcpError::Deserialize`] for transport and
    ///   response failures.
    pub async fn token(&self) -> Result<AccessToken, GcpError> {
        match self.0.as_ref() {
            Source::Static(token) => Ok(token.clone()),
            Source::ServiceAccount(account) => {
                let token = account.token(&[CLOUD_PLATFORM_SCOPE]).await?;
                Ok(AccessToken::new(token.as_str()))
            }
            Source::AuthorizedUser {
                user,
                client,
                cached,
            } => {
                let mut cached = cached.lock().await;
                if let Some(current) = cached.as_ref().filter(|c| c.is_fresh()) {
                    return Ok(current.token.clone());
                }
                let fresh = refresh_user_token(client, user).await?;
                let token = fresh.token.clone();
                *cached = Some(fresh);
                Ok(token)
            }
        }
    }
}

async fn refresh_user_token(client: &Client, user: &AuthorizedUser) -> Result<CachedToken, GcpError> {
    let response = client
        .post(&user.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GcpError::Api {
            context: "token refresh".to_owned(),
            status: status.as_u16(),
            message: body.trim().to_owned(),
        });
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| GcpError::Deserialize {
        context: "token refresh".to_owned(),
        source: e,
    })?;
    tracing::debug!(expires_in = ?parsed.expires_in, "obtained access token from refresh token");
    Ok(CachedToken {
        token: AccessToken::new(parsed.access_token),
        refresh_at: parsed.expires_in.map(|secs| {
            Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN)
        }),
    })
}

/// Resolve the token source for a run and fetch a first token, so bad
/// credentials fail before any data is sent.
///
/// An explicit `env_token` wins over the credentials file.
///
/// # Errors
///
/// Returns [`GcpError::NoCredentials`] when neither source is available, or
/// any error from [`load_credentials`], [`TokenSource::from_credentials`]
/// or [`TokenSource::token`].
pub async fn resolve_token_source(
    env_token: Option<String>,
    credentials_path: Option<&Path>,
    timeout_secs: u64,
) -> Result<TokenSource, GcpError> {
    if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
        tracing::info!("using access token from environment");
        return Ok(AccessToken::new(token.trim()).into());
    }
    let path = credentials_path.ok_or(GcpError::NoCredentials)?;
    let credentials = load_credentials(path)?;
    tracing::info!(path = %path.display(), ?credentials, "using credentials file");

    let source = TokenSource::from_credentials(credentials, timeout_secs)?;
    source.token().await?;
    Ok(source)
}

//! Authenticated JSON-over-HTTP plumbing shared by the BigQuery and
//! Pub/Sub clients.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;

use crate::auth::TokenSource;
use crate::error::GcpError;
use crate::retry::retry_with_backoff;
use crate::types::GoogleErrorBody;

/// Timeout and retry policy for the Google API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    /// Additional attempts after the first failure, for transient errors only.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub backoff_base_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

pub(crate) struct GcpHttp {
    client: Client,
    tokens: TokenSource,
    options: ClientOptions,
}

impl GcpHttp {
    pub(crate) fn new(tokens: TokenSource, options: ClientOptions) -> Result<Self, GcpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("storelocator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            tokens,
            options,
        })
    }

    /// POST `body` as JSON to `url` with bearer auth, retrying transient
    /// failures, and parse the response body as JSON. An empty 2xx body
    /// parses as `null`.
    ///
    /// # Errors
    ///
    /// - [`GcpError::Api`] for a non-2xx status, with the message from the
    ///   Google error envelope when present.
    /// - [`GcpError::Http`] on network failure.
    /// - [`GcpError::Deserialize`] if a 2xx body is not JSON.
    pub(crate) async fn post_json<B>(
        &self,
        url: &Url,
        body: &B,
        context: &str,
    ) -> Result<serde_json::Value, GcpError>
    where
        B: Serialize + ?Sized + Sync,
    {
        retry_with_backoff(self.options.max_retries, self.options.backoff_base_ms, || {
            self.post_once(url, body, context)
        })
        .await
    }

    async fn post_once<B>(
        &self,
        url: &Url,
        body: &B,
        context: &str,
    ) -> Result<serde_json::Value, GcpError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token.secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GcpError::Api {
                context: context.to_owned(),
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| GcpError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Pull `error.message` out of a Google error envelope, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_owned(),
        Err(_) => body.trim().to_owned(),
    }
}

/// Parse and normalise a base URL so that it ends with exactly one slash
/// and can have path segments appended.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, GcpError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| GcpError::InvalidEndpoint {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(GcpError::InvalidEndpoint {
            url: base_url.to_owned(),
            reason: "URL cannot have path segments".to_owned(),
        });
    }
    Ok(url)
}

/// Append percent-encoded `segments` to `base`.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

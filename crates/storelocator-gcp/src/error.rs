use thiserror::Error;

/// Errors returned by the Google Cloud clients.
#[derive(Debug, Error)]
pub enum GcpError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("{context} failed with HTTP {status}: {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("JSON serialization error for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// `insertAll` accepted the request but rejected some rows.
    #[error("{failed_rows} of {total_rows} rows rejected by BigQuery (first: {first})")]
    InsertErrors {
        failed_rows: usize,
        total_rows: usize,
        first: String,
    },

    /// `publish` returned no message id for the message.
    #[error("Pub/Sub returned no message id for topic {topic}")]
    MissingMessageId { topic: String },

    #[error("failed to read credentials file {path}: {source}")]
    CredentialsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unusable credentials file {path}: {reason}")]
    Credentials { path: String, reason: String },

    /// Service-account key parsing, JWT signing or token exchange failed.
    #[error("service account token error: {0}")]
    TokenProvider(#[from] gcp_auth::Error),

    #[error("no credentials: set STORELOCATOR_ACCESS_TOKEN or configure a credentials file")]
    NoCredentials,

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl GcpError {
    /// `true` for HTTP 409, which create calls treat as "already exists".
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, GcpError::Api { status: 409, .. })
    }
}

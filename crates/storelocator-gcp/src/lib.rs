//! Google Cloud REST clients used as load sinks: BigQuery for the store
//! table and Pub/Sub for batch notifications.

pub mod auth;
pub mod bigquery;
mod client;
pub mod error;
pub mod pubsub;
mod retry;
pub mod types;

pub use auth::{
    load_credentials, resolve_token_source, AccessToken, AuthorizedUser, Credentials, TokenSource,
    CLOUD_PLATFORM_SCOPE,
};
pub use bigquery::{store_table_schema, BigQueryClient, BigQueryTable};
pub use client::ClientOptions;
pub use error::GcpError;
pub use pubsub::{PubSubClient, PubSubTopic};

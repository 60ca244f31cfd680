//! Pub/Sub v1 REST client for batch notifications.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use storelocator_core::{NotificationSink, StoreRecord};

use crate::auth::TokenSource;
use crate::client::{join_segments, parse_base_url, ClientOptions, GcpHttp};
use crate::error::GcpError;
use crate::types::{PublishRequest, PublishResponse, PubsubMessage};

const DEFAULT_BASE_URL: &str = "https://pubsub.googleapis.com/v1/";

/// Client for the Pub/Sub v1 REST API, scoped to one project.
pub struct PubSubClient {
    http: GcpHttp,
    base_url: Url,
    project_id: String,
}

impl PubSubClient {
    /// # Errors
    ///
    /// Returns [`GcpError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        project_id: &str,
        tokens: impl Into<TokenSource>,
        options: ClientOptions,
    ) -> Result<Self, GcpError> {
        Self::with_base_url(project_id, tokens, options, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`GcpError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GcpError::InvalidEndpoint`] if `base_url` is not a
    /// usable URL.
    pub fn with_base_url(
        project_id: &str,
        tokens: impl Into<TokenSource>,
        options: ClientOptions,
        base_url: &str,
    ) -> Result<Self, GcpError> {
        Ok(Self {
            http: GcpHttp::new(tokens.into(), options)?,
            base_url: parse_base_url(base_url)?,
            project_id: project_id.to_owned(),
        })
    }

    /// Publish one message with `payload` as its data and return the
    /// server-assigned message id.
    ///
    /// # Errors
    ///
    /// - [`GcpError::Api`] if the topic does not exist or publishing is
    ///   denied.
    /// - [`GcpError::MissingMessageId`] if the response names no message.
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> Result<String, GcpError> {
        let verb = format!("{topic}:publish");
        let url = join_segments(
            &self.base_url,
            &["projects", &self.project_id, "topics", &verb],
        );
        let body = PublishRequest {
            messages: vec![PubsubMessage {
                data: STANDARD.encode(payload),
            }],
        };

        let value = self.http.post_json(&url, &body, "publish").await?;
        let response: PublishResponse =
            serde_json::from_value(value).map_err(|e| GcpError::Deserialize {
                context: format!("publish(topic={topic})"),
                source: e,
            })?;

        response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| GcpError::MissingMessageId {
                topic: topic.to_owned(),
            })
    }
}

/// A Pub/Sub topic used as the load's notification sink. Each batch is
/// published as one message whose data is the batch's JSON array.
pub struct PubSubTopic {
    client: PubSubClient,
    topic: String,
}

impl PubSubTopic {
    #[must_use]
    pub fn new(client: PubSubClient, topic: &str) -> Self {
        Self {
            client,
            topic: topic.to_owned(),
        }
    }
}

impl NotificationSink for PubSubTopic {
    type Error = GcpError;

    async fn publish(&self, batch: &[StoreRecord]) -> Result<String, GcpError> {
        let payload = serde_json::to_vec(batch).map_err(|e| GcpError::Serialize {
            context: "store batch payload".to_owned(),
            source: e,
        })?;
        tracing::info!(
            topic = %self.topic,
            stores = batch.len(),
            bytes = payload.len(),
            "publishing store batch notification"
        );
        self.client.publish(&self.topic, &payload).await
    }
}

//! Retry policy for Google API calls.
//!
//! BigQuery and Pub/Sub answer throttling with 429 and brief outages with
//! 5xx; both clear up on their own, as do timeouts and refused connections.
//! Those are retried after a growing, jittered pause. Any other failure
//! (bad request, missing topic, rejected rows) is final.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::GcpError;

/// Longest pause between two attempts.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Whether `err` may clear up on its own.
pub(crate) fn is_retriable(err: &GcpError) -> bool {
    match err {
        GcpError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        GcpError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        GcpError::Deserialize { .. }
        | GcpError::Serialize { .. }
        | GcpError::InsertErrors { .. }
        | GcpError::MissingMessageId { .. }
        | GcpError::CredentialsIo { .. }
        | GcpError::Credentials { .. }
        | GcpError::TokenProvider(_)
        | GcpError::NoCredentials
        | GcpError::InvalidEndpoint { .. } => false,
    }
}

/// Call `operation` until it succeeds, fails for good, or `max_retries`
/// retries are spent.
///
/// The first pause is about `backoff_base_ms` and each later one doubles,
/// up to 30 s. Every pause is scaled by a random factor in `0.75..1.25` so
/// concurrent loaders do not retry in lockstep.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GcpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GcpError>>,
{
    let mut retries_left = max_retries;
    let mut delay = Duration::from_millis(backoff_base_ms);
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_left == 0 || !is_retriable(&err) => return Err(err),
            Err(err) => err,
        };
        retries_left -= 1;

        let pause = jittered(delay.min(MAX_DELAY));
        tracing::warn!(
            retries_left,
            pause_ms = pause.as_millis(),
            error = %err,
            "Google API call failed, retrying"
        );
        tokio::time::sleep(pause).await;
        delay = delay.saturating_mul(2);
    }
}

fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(rand::rng().random_range(0.75..1.25))
}

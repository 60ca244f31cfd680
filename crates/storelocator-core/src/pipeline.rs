//! The load loop: prepare the warehouse, then insert and publish one batch
//! at a time.

use std::future::Future;

use crate::batch::{batch_count, batches, BatchSize};
use crate::error::LoadError;
use crate::models::StoreRecord;

/// Destination table for store records.
pub trait WarehouseSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the dataset and table if they do not exist yet. Must succeed
    /// when they already exist.
    fn prepare(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Insert every record of `batch` as a table row.
    fn insert(&self, batch: &[StoreRecord]) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Topic notified after each batch lands in the warehouse.
pub trait NotificationSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish `batch` as a single message and return its message id.
    fn publish(
        &self,
        batch: &[StoreRecord],
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Progress of a load run: batches and records that were both inserted and
/// published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub batches: usize,
    pub records: usize,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} batches ({} records) completed",
            self.batches, self.records
        )
    }
}

/// Load `records` into `warehouse` and notify `notifier`, one batch at a
/// time and strictly in order.
///
/// Each batch is inserted, then published; the next batch starts only after
/// both succeed. The first failure aborts the run.
///
/// # Errors
///
/// - [`LoadError::Prepare`] if dataset/table creation fails.
/// - [`LoadError::Insert`] or [`LoadError::Publish`] for the first failing
///   batch, carrying the batches completed before it. A failed insert may
///   have written part of its batch; nothing is rolled back.
pub async fn run_load<W, N>(
    records: &[StoreRecord],
    batch_size: BatchSize,
    warehouse: &W,
    notifier: &N,
) -> Result<LoadReport, LoadError>
where
    W: WarehouseSink,
    N: NotificationSink,
{
    warehouse.prepare().await.map_err(|e| LoadError::Prepare {
        source: Box::new(e),
    })?;

    let total_batches = batch_count(records.len(), batch_size);
    let mut report = LoadReport::default();

    for (index, batch) in batches(records, batch_size).enumerate() {
        let number = index + 1;

        tracing::info!(
            batch = number,
            total_batches,
            stores = batch.len(),
            "inserting stores into warehouse"
        );
        warehouse
            .insert(batch)
            .await
            .map_err(|e| LoadError::Insert {
                batch: number,
                total_batches,
                completed: report,
                source: Box::new(e),
            })?;

        let message_id = notifier
            .publish(batch)
            .await
            .map_err(|e| LoadError::Publish {
                batch: number,
                total_batches,
                completed: report,
                source: Box::new(e),
            })?;
        tracing::info!(batch = number, %message_id, "published batch notification");

        report.batches += 1;
        report.records += batch.len();
    }

    tracing::info!(
        batches = report.batches,
        stores = report.records,
        "done loading stores"
    );
    Ok(report)
}

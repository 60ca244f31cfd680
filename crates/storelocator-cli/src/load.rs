//! The `load` command: CSV file in, BigQuery rows and Pub/Sub notifications
//! out.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use storelocator_core::{
    batch_count, batches, build_load_config, read_store_file, run_load, LoadArgs, LoadConfig,
    Settings, StoreRecord,
};
use storelocator_gcp::{
    resolve_token_source, BigQueryClient, BigQueryTable, ClientOptions, PubSubClient, PubSubTopic,
};

/// Arguments of `storelocator load`. Values left unset fall back to the
/// config file.
#[derive(Debug, Args)]
pub struct LoadCommand {
    /// Store data file to load from
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,
    /// BigQuery dataset ID
    #[arg(short = 'd', long)]
    pub dataset: Option<String>,
    /// Table name in BigQuery
    #[arg(short = 't', long)]
    pub table: Option<String>,
    /// Google Cloud project
    #[arg(short = 'p', long, env = "STORELOCATOR_PROJECT")]
    pub project: Option<String>,
    /// Credentials file, relative to the config directory unless absolute
    #[arg(short = 'c', long, env = "STORELOCATOR_CREDENTIALS")]
    pub credentials: Option<String>,
    /// Pub/Sub topic notified after each batch
    #[arg(short = 'q', long, env = "STORELOCATOR_TOPIC")]
    pub topic: Option<String>,
    /// Stores per BigQuery insert / Pub/Sub message
    #[arg(
        short = 'b',
        long = "batchsize",
        alias = "batchSize",
        env = "STORELOCATOR_BATCH_SIZE",
        allow_negative_numbers = true
    )]
    pub batch_size: Option<i64>,
    /// Read and batch the file without calling BigQuery or Pub/Sub
    #[arg(long)]
    pub dry_run: bool,
    /// Bearer token used instead of the credentials file
    #[arg(long, env = "STORELOCATOR_ACCESS_TOKEN", hide = true, hide_env_values = true)]
    pub access_token: Option<String>,
}

impl LoadCommand {
    fn load_args(&self) -> LoadArgs {
        LoadArgs {
            file: self.file.clone(),
            dataset: self.dataset.clone(),
            table: self.table.clone(),
            project: self.project.clone(),
            credentials: self.credentials.clone(),
            topic: self.topic.clone(),
            batch_size: self.batch_size,
        }
    }
}

/// Run a load end to end.
///
/// Configuration is validated before the data file is read; the data file
/// is fully read and mapped before any Google API call is made.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreadable or malformed
/// data file, missing credentials, or the first failing BigQuery or Pub/Sub
/// call. Load failures include how many batches completed.
pub(crate) async fn run_load_command(
    args: LoadCommand,
    settings: Settings,
    config_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let config = build_load_config(args.load_args(), settings, config_dir)?;
    tracing::info!(
        project = %config.project_id,
        dataset = %config.dataset_id,
        table = %config.table_name,
        topic = %config.topic,
        batch_size = %config.batch_size,
        credentials = ?config.credentials_path,
        "starting load"
    );

    let stores = read_store_file(&config.file)
        .with_context(|| format!("failed to read {}", config.file.display()))?;

    if args.dry_run {
        print_dry_run(&config, &stores);
        return Ok(());
    }

    let tokens = resolve_token_source(
        args.access_token,
        config.credentials_path.as_deref(),
        config.request_timeout_secs,
    )
    .await
    .context("failed to obtain Google Cloud credentials")?;

    let options = ClientOptions {
        timeout_secs: config.request_timeout_secs,
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    };

    let bigquery = match config.bigquery_endpoint.as_deref() {
        Some(url) => BigQueryClient::with_base_url(&config.project_id, tokens.clone(), options, url),
        None => BigQueryClient::new(&config.project_id, tokens.clone(), options),
    }
    .context("failed to build BigQuery client")?;

    let pubsub = match config.pubsub_endpoint.as_deref() {
        Some(url) => PubSubClient::with_base_url(&config.project_id, tokens, options, url),
        None => PubSubClient::new(&config.project_id, tokens, options),
    }
    .context("failed to build Pub/Sub client")?;

    let warehouse = BigQueryTable::new(
        bigquery,
        &config.dataset_id,
        &config.table_name,
        &config.dataset_location,
    );
    let topic = PubSubTopic::new(pubsub, &config.topic);

    let report = run_load(&stores, config.batch_size, &warehouse, &topic)
        .await
        .context("load aborted")?;

    println!(
        "loaded {} stores in {} batches into {}.{}; notified topic {}",
        report.records, report.batches, config.dataset_id, config.table_name, config.topic
    );
    Ok(())
}

fn print_dry_run(config: &LoadConfig, stores: &[StoreRecord]) {
    let total = batch_count(stores.len(), config.batch_size);
    println!(
        "dry-run: would load {} stores in {} batches into {}.{} and publish to {}",
        stores.len(),
        total,
        config.dataset_id,
        config.table_name,
        config.topic
    );
    for (index, batch) in batches(stores, config.batch_size).enumerate() {
        let first = batch.first().map_or("", |s| s.store_code.as_str());
        let last = batch.last().map_or("", |s| s.store_code.as_str());
        println!(
            "  batch {}/{total}: {} stores ({first} .. {last})",
            index + 1,
            batch.len()
        );
    }
}

#[cfg(test)]
#[path = "load_test.rs"]
mod tests;

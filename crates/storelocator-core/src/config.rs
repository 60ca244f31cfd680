use std::path::{Path, PathBuf};

use crate::batch::BatchSize;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Values supplied on the command line (or through their environment
/// variables) for a single `load` run. `None` and empty strings both mean
/// "not given".
#[derive(Debug, Clone, Default)]
pub struct LoadArgs {
    pub file: Option<PathBuf>,
    pub dataset: Option<String>,
    pub table: Option<String>,
    pub project: Option<String>,
    pub credentials: Option<String>,
    pub topic: Option<String>,
    pub batch_size: Option<i64>,
}

/// Fully resolved configuration for a load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub file: PathBuf,
    pub dataset_id: String,
    pub table_name: String,
    pub project_id: String,
    /// Absolute or config-dir-relative path to the credentials file, if any.
    pub credentials_path: Option<PathBuf>,
    pub topic: String,
    pub batch_size: BatchSize,
    pub dataset_location: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub bigquery_endpoint: Option<String>,
    pub pubsub_endpoint: Option<String>,
}

/// Merge command-line values over the settings file and validate the result.
///
/// Required values are checked in the order the user is most likely to fix
/// them: data file, dataset, table, then project and topic. The data file
/// must exist; nothing else touches the filesystem. `config_dir` is only
/// needed to resolve a relative credentials path.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn build_load_config(
    args: LoadArgs,
    settings: Settings,
    config_dir: Option<&Path>,
) -> Result<LoadConfig, ConfigError> {
    let file = args
        .file
        .filter(|f| !f.as_os_str().is_empty())
        .ok_or_else(|| ConfigError::MissingDataFile("no --file given".to_string()))?;
    if !file.is_file() {
        return Err(ConfigError::MissingDataFile(file.display().to_string()));
    }

    let dataset_id = non_empty(args.dataset).ok_or(ConfigError::MissingDataset)?;
    let table_name = non_empty(args.table).ok_or(ConfigError::MissingTable)?;

    let project_id = non_empty(args.project)
        .or_else(|| non_empty(settings.project))
        .ok_or(ConfigError::MissingSetting {
            key: "project",
            flag: "project",
            env: "STORELOCATOR_PROJECT",
        })?;

    let topic = non_empty(args.topic)
        .or_else(|| non_empty(settings.topic))
        .ok_or(ConfigError::MissingSetting {
            key: "topic",
            flag: "topic",
            env: "STORELOCATOR_TOPIC",
        })?;

    let batch_size = match args.batch_size.or(settings.batchsize) {
        Some(n) => BatchSize::try_from(n)?,
        None => BatchSize::default(),
    };

    let credentials_path = non_empty(args.credentials)
        .or_else(|| non_empty(settings.credentials))
        .map(|raw| resolve_credentials_path(&raw, config_dir))
        .transpose()?;

    Ok(LoadConfig {
        file,
        dataset_id,
        table_name,
        project_id,
        credentials_path,
        topic,
        batch_size,
        dataset_location: non_empty(settings.dataset_location).unwrap_or_else(|| "US".to_string()),
        request_timeout_secs: settings.request_timeout_secs.unwrap_or(30),
        max_retries: settings.max_retries.unwrap_or(3),
        retry_backoff_base_ms: settings.retry_backoff_base_ms.unwrap_or(1_000),
        bigquery_endpoint: non_empty(settings.bigquery_endpoint),
        pubsub_endpoint: non_empty(settings.pubsub_endpoint),
    })
}

/// Credentials paths are relative to the configuration directory unless
/// given as absolute paths.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] for a relative path when there is
/// no configuration directory to resolve it against.
pub fn resolve_credentials_path(raw: &str, config_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    config_dir
        .map(|dir| dir.join(path))
        .ok_or(ConfigError::NoConfigDir)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::*;

fn data_file() -> NamedTempFile {
    NamedTempFile::new().expect("temp data file")
}

/// Arguments with every required value populated.
fn full_args(file: &Path) -> LoadArgs {
    LoadArgs {
        file: Some(file.to_path_buf()),
        dataset: Some("stores_ds".to_string()),
        table: Some("stores".to_string()),
        project: Some("my-project".to_string()),
        credentials: None,
        topic: Some("store-updates".to_string()),
        batch_size: None,
    }
}

fn config_dir() -> Option<&'static Path> {
    Some(Path::new("/home/alice/.storelocator"))
}

#[test]
fn succeeds_with_required_values_and_defaults() {
    let file = data_file();
    let cfg = build_load_config(full_args(file.path()), Settings::default(), config_dir())
        .expect("config should build");

    assert_eq!(cfg.file, file.path());
    assert_eq!(cfg.dataset_id, "stores_ds");
    assert_eq!(cfg.table_name, "stores");
    assert_eq!(cfg.project_id, "my-project");
    assert_eq!(cfg.topic, "store-updates");
    assert_eq!(cfg.batch_size.get(), 10);
    assert!(cfg.credentials_path.is_none());
    assert_eq!(cfg.dataset_location, "US");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1_000);
    assert!(cfg.bigquery_endpoint.is_none());
    assert!(cfg.pubsub_endpoint.is_none());
}

#[test]
fn fails_without_file() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.file = None;
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingDataFile(_))),
        "expected MissingDataFile, got: {result:?}"
    );
}

#[test]
fn fails_when_file_does_not_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("stores.csv");
    let result = build_load_config(full_args(&missing), Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingDataFile(ref p)) if p.ends_with("stores.csv")),
        "expected MissingDataFile, got: {result:?}"
    );
}

#[test]
fn fails_when_file_is_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let result = build_load_config(full_args(dir.path()), Settings::default(), config_dir());
    assert!(matches!(result, Err(ConfigError::MissingDataFile(_))));
}

#[test]
fn fails_without_dataset() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.dataset = Some(String::new());
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingDataset)),
        "expected MissingDataset, got: {result:?}"
    );
}

#[test]
fn fails_without_table() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.table = None;
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingTable)),
        "expected MissingTable, got: {result:?}"
    );
}

#[test]
fn fails_without_project_anywhere() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.project = None;
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingSetting { key: "project", .. })),
        "expected MissingSetting(project), got: {result:?}"
    );
}

#[test]
fn fails_without_topic_anywhere() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.topic = None;
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(
        matches!(result, Err(ConfigError::MissingSetting { key: "topic", .. })),
        "expected MissingSetting(topic), got: {result:?}"
    );
}

#[test]
fn settings_fill_in_missing_flags() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.project = None;
    args.topic = None;
    let settings = Settings {
        project: Some("from-file".to_string()),
        topic: Some("file-topic".to_string()),
        batchsize: Some(4),
        credentials: Some("sa.json".to_string()),
        dataset_location: Some("EU".to_string()),
        max_retries: Some(0),
        ..Settings::default()
    };

    let cfg = build_load_config(args, settings, config_dir()).unwrap();
    assert_eq!(cfg.project_id, "from-file");
    assert_eq!(cfg.topic, "file-topic");
    assert_eq!(cfg.batch_size.get(), 4);
    assert_eq!(
        cfg.credentials_path,
        Some(PathBuf::from("/home/alice/.storelocator/sa.json"))
    );
    assert_eq!(cfg.dataset_location, "EU");
    assert_eq!(cfg.max_retries, 0);
}

#[test]
fn flags_override_settings() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.batch_size = Some(2);
    args.credentials = Some("/abs/creds.json".to_string());
    let settings = Settings {
        project: Some("from-file".to_string()),
        topic: Some("file-topic".to_string()),
        batchsize: Some(50),
        credentials: Some("sa.json".to_string()),
        ..Settings::default()
    };

    let cfg = build_load_config(args, settings, config_dir()).unwrap();
    assert_eq!(cfg.project_id, "my-project");
    assert_eq!(cfg.topic, "store-updates");
    assert_eq!(cfg.batch_size.get(), 2);
    assert_eq!(cfg.credentials_path, Some(PathBuf::from("/abs/creds.json")));
}

#[test]
fn zero_batch_size_is_rejected() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.batch_size = Some(0);
    let result = build_load_config(args, Settings::default(), config_dir());
    assert!(matches!(result, Err(ConfigError::InvalidBatchSize(0))));
}

#[test]
fn negative_batch_size_in_settings_is_rejected() {
    let file = data_file();
    let settings = Settings {
        batchsize: Some(-1),
        ..Settings::default()
    };
    let result = build_load_config(full_args(file.path()), settings, config_dir());
    assert!(matches!(result, Err(ConfigError::InvalidBatchSize(-1))));
}

#[test]
fn relative_credentials_resolve_under_config_dir() {
    assert_eq!(
        resolve_credentials_path("keys/sa.json", Some(Path::new("/cfg"))).unwrap(),
        PathBuf::from("/cfg/keys/sa.json")
    );
}

#[test]
fn absolute_credentials_need_no_config_dir() {
    assert_eq!(
        resolve_credentials_path("/keys/sa.json", None).unwrap(),
        PathBuf::from("/keys/sa.json")
    );
}

#[test]
fn relative_credentials_without_config_dir_fail() {
    let file = data_file();
    let mut args = full_args(file.path());
    args.credentials = Some("sa.json".to_string());
    let result = build_load_config(args, Settings::default(), None);
    assert!(matches!(result, Err(ConfigError::NoConfigDir)), "got: {result:?}");
}

#[test]
fn builds_without_config_dir_when_unneeded() {
    let file = data_file();
    let cfg = build_load_config(full_args(file.path()), Settings::default(), None)
        .expect("config should build without a config dir");
    assert!(cfg.credentials_path.is_none());
}

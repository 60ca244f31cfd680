use std::io::Write;

use serde_json::json;
use storelocator_core::ConfigError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const HEADER: &str = "code,name,addr1,addr2,city,state,zip,country,phone,web,desc,pay,cat,photo,unused,lat,lon,sap,sun,mon,tue,wed,thu,fri,sat";

fn data_file(codes: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for code in codes {
        writeln!(
            file,
            "{code},Acme,1 Main,,Springfield,IL,62701,US,555-1234,acme.com,desc,cash,retail,photo.jpg,,37.7,-122.4,SAP1,9-5,9-5,9-5,9-5,9-5,,"
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn command(file: &Path) -> LoadCommand {
    LoadCommand {
        file: Some(file.to_path_buf()),
        dataset: Some("stores_ds".to_owned()),
        table: Some("stores".to_owned()),
        project: Some("test-project".to_owned()),
        credentials: None,
        topic: Some("store-updates".to_owned()),
        batch_size: Some(2),
        dry_run: false,
        access_token: Some("test-token".to_owned()),
    }
}

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        bigquery_endpoint: Some(server.uri()),
        pubsub_endpoint: Some(server.uri()),
        max_retries: Some(0),
        retry_backoff_base_ms: Some(0),
        ..Settings::default()
    }
}

async fn mount_warehouse(server: &MockServer, inserts: u64) {
    Mock::given(method("POST"))
        .and(path("/projects/test-project/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/test-project/datasets/stores_ds/tables"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": {"code": 409, "message": "Already Exists"}})),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/projects/test-project/datasets/stores_ds/tables/stores/insertAll",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(inserts)
        .mount(server)
        .await;
}

#[tokio::test]
async fn loads_all_batches_and_publishes_each() {
    let server = MockServer::start().await;
    mount_warehouse(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/projects/test-project/topics/store-updates:publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageIds": ["1"]})))
        .expect(2)
        .mount(&server)
        .await;

    let file = data_file(&["S1", "S2", "S3"]);
    let dir = tempfile::tempdir().unwrap();
    run_load_command(command(file.path()), settings_for(&server), Some(dir.path()))
        .await
        .expect("load should succeed");
}

#[tokio::test]
async fn publish_failure_aborts_with_progress() {
    let server = MockServer::start().await;
    mount_warehouse(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/projects/test-project/topics/store-updates:publish"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"error": {"code": 404, "message": "Resource not found"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let file = data_file(&["S1", "S2", "S3"]);
    let dir = tempfile::tempdir().unwrap();
    let err = run_load_command(command(file.path()), settings_for(&server), Some(dir.path()))
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(
        message.contains("publish failed on batch 1 of 2 after 0 batches (0 records) completed"),
        "unexpected error: {message}"
    );
    assert!(message.contains("Resource not found"), "unexpected error: {message}");
}

#[tokio::test]
async fn dry_run_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let file = data_file(&["S1", "S2", "S3"]);
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = command(file.path());
    cmd.dry_run = true;
    cmd.access_token = None;

    run_load_command(cmd, settings_for(&server), Some(dir.path()))
        .await
        .expect("dry run should succeed without credentials");
}

#[tokio::test]
async fn missing_data_file_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = command(&dir.path().join("absent.csv"));

    let err = run_load_command(cmd, Settings::default(), Some(dir.path()))
        .await
        .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::MissingDataFile(_))),
        "unexpected error: {err:#}"
    );
}

#[tokio::test]
async fn malformed_row_names_its_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "S1,too,short").unwrap();
    file.flush().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = run_load_command(command(file.path()), Settings::default(), Some(dir.path()))
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(
        message.contains("row 2: expected 25 fields, found 3"),
        "unexpected error: {message}"
    );
}

#[tokio::test]
async fn missing_credentials_is_fatal() {
    let file = data_file(&["S1"]);
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = command(file.path());
    cmd.access_token = None;

    let err = run_load_command(cmd, Settings::default(), Some(dir.path()))
        .await
        .unwrap_err();
    assert!(
        format!("{err:#}").contains("failed to obtain Google Cloud credentials"),
        "unexpected error: {err:#}"
    );
}

#[tokio::test]
async fn relative_credentials_need_a_config_dir() {
    let file = data_file(&["S1"]);
    let mut cmd = command(file.path());
    cmd.access_token = None;
    cmd.credentials = Some("sa.json".to_owned());

    let err = run_load_command(cmd, Settings::default(), None)
        .await
        .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NoConfigDir)),
        "unexpected error: {err:#}"
    );
}

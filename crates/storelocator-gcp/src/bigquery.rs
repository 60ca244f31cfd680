//! BigQuery v2 REST client: idempotent dataset/table creation and
//! streaming inserts of store records.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Url;
use sha2::{Digest, Sha256};
use storelocator_core::{StoreRecord, WarehouseSink};

use crate::auth::TokenSource;
use crate::client::{join_segments, parse_base_url, ClientOptions, GcpHttp};
use crate::error::GcpError;
use crate::types::{
    DatasetReference, DatasetResource, InsertAllRequest, InsertAllResponse, InsertRow,
    TableFieldSchema, TableReference, TableResource, TableSchema, WarehouseRow,
};

const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2/";

/// Client for the BigQuery v2 REST API, scoped to one project.
///
/// Use [`BigQueryClient::new`] for production or
/// [`BigQueryClient::with_base_url`] to point at an emulator or mock server.
pub struct BigQueryClient {
    http: GcpHttp,
    base_url: Url,
    project_id: String,
    run_id: u64,
}

impl BigQueryClient {
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
            run_id: rand::random(),
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Create `dataset_id` in `location`. Returns `false` when the dataset
    /// already exists.
    ///
    /// # Errors
    ///
    /// Any [`GcpError`] other than an "already exists" conflict.
    pub async fn create_dataset(&self, dataset_id: &str, location: &str) -> Result<bool, GcpError> {
        let url = self.endpoint(&["projects", &self.project_id, "datasets"]);
        let body = DatasetResource {
            dataset_reference: DatasetReference {
                project_id: &self.project_id,
                dataset_id,
            },
            location,
        };

        match self.http.post_json(&url, &body, "create dataset").await {
            Ok(_) => {
                tracing::info!(dataset = dataset_id, location, "dataset created");
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                tracing::info!(dataset = dataset_id, "dataset already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Create `table_id` with [`store_table_schema`]. Returns `false` when
    /// the table already exists; an existing table's schema is left as is.
    ///
    /// # Errors
    ///
    /// Any [`GcpError`] other than an "already exists" conflict.
    pub async fn create_table(&self, dataset_id: &str, table_id: &str) -> Result<bool, GcpError> {
        let url = self.endpoint(&["projects", &self.project_id, "datasets", dataset_id, "tables"]);
        let body = TableResource {
            table_reference: TableReference {
                project_id: &self.project_id,
                dataset_id,
                table_id,
            },
            schema: store_table_schema(),
        };

        match self.http.post_json(&url, &body, "create table").await {
            Ok(_) => {
                tracing::info!(dataset = dataset_id, table = table_id, "table created");
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                tracing::info!(dataset = dataset_id, table = table_id, "table already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Stream `records` into the table with `tabledata.insertAll`.
    ///
    /// `first_row` is the position of `records[0]` within the whole load.
    /// Each row carries an `insertId` hashed from this client's run id, the
    /// row's position and its content: a retried request re-sends the same
    /// ids and is de-duplicated by BigQuery on a best-effort basis, while
    /// identical rows at different positions are all kept.
    ///
    /// # Errors
    ///
    /// - [`GcpError::InsertErrors`] if any row is rejected. Rows that were
    ///   accepted in the same request stay inserted.
    /// - [`GcpError::Api`], [`GcpError::Http`] for request failures.
    pub async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        first_row: u64,
        records: &[StoreRecord],
    ) -> Result<(), GcpError> {
        if records.is_empty() {
            return Ok(());
        }

        let url = self.endpoint(&[
            "projects",
            &self.project_id,
            "datasets",
            dataset_id,
            "tables",
            table_id,
            "insertAll",
        ]);
        let rows = (first_row..)
            .zip(records)
            .map(|(position, r)| {
                let json = WarehouseRow::from(r);
                let insert_id = insert_id(self.run_id, position, &json)?;
                Ok(InsertRow { insert_id, json })
            })
            .collect::<Result<Vec<_>, GcpError>>()?;
        let body = InsertAllRequest {
            skip_invalid_rows: false,
            ignore_unknown_values: false,
            rows,
        };

        let value = self.http.post_json(&url, &body, "insertAll").await?;
        let response: InsertAllResponse = if value.is_null() {
            InsertAllResponse::default()
        } else {
            serde_json::from_value(value).map_err(|e| GcpError::Deserialize {
                context: "insertAll".to_owned(),
                source: e,
            })?
        };

        if let Some(first) = response.insert_errors.first() {
            let detail = first
                .errors
                .iter()
                .find_map(|e| e.message.clone().or_else(|| e.reason.clone()))
                .unwrap_or_else(|| "no detail".to_owned());
            return Err(GcpError::InsertErrors {
                failed_rows: response.insert_errors.len(),
                total_rows: records.len(),
                first: format!("row {}: {detail}", first.index),
            });
        }

        tracing::debug!(
            dataset = dataset_id,
            table = table_id,
            rows = records.len(),
            "rows inserted"
        );
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        join_segments(&self.base_url, segments)
    }
}

fn insert_id(run_id: u64, position: u64, row: &WarehouseRow<'_>) -> Result<String, GcpError> {
    let bytes = serde_json::to_vec(row).map_err(|e| GcpError::Serialize {
        context: "insertAll row".to_owned(),
        source: e,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(run_id.to_be_bytes());
    hasher.update(position.to_be_bytes());
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn string_field(name: &'static str) -> TableFieldSchema {
    TableFieldSchema {
        name,
        field_type: "STRING",
        mode: None,
        fields: None,
    }
}

fn float_field(name: &'static str) -> TableFieldSchema {
    TableFieldSchema {
        name,
        field_type: "FLOAT",
        mode: None,
        fields: None,
    }
}

/// Schema of the stores table: flat string columns, a repeated `Hours`
/// record and a `Location` record.
#[must_use]
pub fn store_table_schema() -> TableSchema {
    let mut fields: Vec<TableFieldSchema> = [
        "StoreCode",
        "BusinessName",
        "Address1",
        "Address2",
        "City",
        "State",
        "PostalCode",
        "Country",
        "PrimaryPhone",
        "Website",
        "Description",
        "PaymentTypes",
        "PrimaryCategory",
        "Photo",
    ]
    .into_iter()
    .map(string_field)
    .collect();

    fields.push(TableFieldSchema {
        name: "Hours",
        field_type: "RECORD",
        mode: Some("REPEATED"),
        fields: Some(vec![
            string_field("DayOfWeek"),
            string_field("OpenTime"),
            string_field("CloseTime"),
        ]),
    });
    fields.push(TableFieldSchema {
        name: "Location",
        field_type: "RECORD",
        mode: None,
        fields: Some(vec![float_field("Latitude"), float_field("Longitude")]),
    });
    fields.push(string_field("SapID"));

    TableSchema { fields }
}

/// A BigQuery table used as the load's warehouse sink. Rows are numbered
/// across batches so every record of the load gets its own insert id.
pub struct BigQueryTable {
    client: BigQueryClient,
    dataset_id: String,
    table_id: String,
    location: String,
    next_row: AtomicU64,
}

impl BigQueryTable {
    #[must_use]
    pub fn new(client: BigQueryClient, dataset_id: &str, table_id: &str, location: &str) -> Self {
        Self {
            client,
            dataset_id: dataset_id.to_owned(),
            table_id: table_id.to_owned(),
            location: location.to_owned(),
            next_row: AtomicU64::new(0),
        }
    }
}

impl WarehouseSink for BigQueryTable {
    type Error = GcpError;

    async fn prepare(&self) -> Result<(), GcpError> {
        self.client
            .create_dataset(&self.dataset_id, &self.location)
            .await?;
        self.client
            .create_table(&self.dataset_id, &self.table_id)
            .await?;
        Ok(())
    }

    async fn insert(&self, batch: &[StoreRecord]) -> Result<(), GcpError> {
        let first_row = self
            .next_row
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.client
            .insert_rows(&self.dataset_id, &self.table_id, first_row, batch)
            .await
    }
}

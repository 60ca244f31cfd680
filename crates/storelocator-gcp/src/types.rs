//! Request and response bodies for the BigQuery v2 and Pub/Sub v1 REST APIs.

use serde::{Deserialize, Serialize};
use storelocator_core::{StoreHour, StoreRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Standard Google API error envelope: `{"error": {"code", "message", ...}}`.
#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorDetail {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// BigQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResource<'a> {
    pub dataset_reference: DatasetReference<'a>,
    pub location: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
    pub table_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResource<'a> {
    pub table_reference: TableReference<'a>,
    pub schema: TableSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

/// One column of a table schema. Nested `fields` are only set for
/// `RECORD` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFieldSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableFieldSchema>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest<'a> {
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: Vec<InsertRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRow<'a> {
    pub insert_id: String,
    pub json: WarehouseRow<'a>,
}

/// A [`StoreRecord`] laid out with the table's column names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarehouseRow<'a> {
    pub store_code: &'a str,
    pub business_name: &'a str,
    pub address1: &'a str,
    pub address2: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
    pub primary_phone: &'a str,
    pub website: &'a str,
    pub description: &'a str,
    pub payment_types: &'a str,
    pub primary_category: &'a str,
    pub photo: &'a str,
    pub hours: Vec<WarehouseHour<'a>>,
    pub location: WarehouseLocation,
    #[serde(rename = "SapID")]
    pub sap_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarehouseHour<'a> {
    pub day_of_week: &'static str,
    pub open_time: &'a str,
    pub close_time: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarehouseLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl<'a> From<&'a StoreHour> for WarehouseHour<'a> {
    fn from(hour: &'a StoreHour) -> Self {
        Self {
            day_of_week: hour.day_of_week.as_str(),
            open_time: &hour.open_time,
            close_time: &hour.close_time,
        }
    }
}

impl<'a> From<&'a StoreRecord> for WarehouseRow<'a> {
    fn from(r: &'a StoreRecord) -> Self {
        Self {
            store_code: &r.store_code,
            business_name: &r.business_name,
            address1: &r.address1,
            address2: &r.address2,
            city: &r.city,
            state: &r.state,
            postal_code: &r.postal_code,
            country: &r.country,
            primary_phone: &r.primary_phone,
            website: &r.website,
            description: &r.description,
            payment_types: &r.payment_types,
            primary_category: &r.primary_category,
            photo: &r.photo,
            hours: r.hours.iter().map(WarehouseHour::from).collect(),
            location: WarehouseLocation {
                latitude: r.location.latitude,
                longitude: r.location.longitude,
            },
            sap_id: &r.sap_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    #[serde(default)]
    pub insert_errors: Vec<InsertErrors>,
}

/// Errors for one rejected row; `index` is the row's position in the request.
#[derive(Debug, Deserialize)]
pub struct InsertErrors {
    pub index: u64,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Pub/Sub
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

/// Outgoing message; `data` is base64-encoded.
#[derive(Debug, Serialize)]
pub struct PubsubMessage {
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(default)]
    pub message_ids: Vec<String>,
}

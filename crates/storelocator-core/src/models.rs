use serde::{Deserialize, Serialize};

/// Day label attached to each [`StoreHour`]. Declaration order is the fixed
/// Sunday-through-Saturday order used everywhere hours are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sun,
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Sun => "SUN",
            DayOfWeek::Mon => "MON",
            DayOfWeek::Tue => "TUE",
            DayOfWeek::Wed => "WED",
            DayOfWeek::Thu => "THU",
            DayOfWeek::Fri => "FRI",
            DayOfWeek::Sat => "SAT",
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opening hours for one day. Times are kept exactly as they appear in the
/// source file; no format validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHour {
    pub day_of_week: DayOfWeek,
    pub open_time: String,
    pub close_time: String,
}

/// Marker written to `close_time` for days with no listed hours.
pub const CLOSED: &str = "CLOSED";

/// Placeholder written to `open_time` for days with no listed hours.
pub const CLOSED_OPEN_TIME: &str = " ";

impl StoreHour {
    /// Hours entry for a day with no listed hours: a single blank open time
    /// and the literal `CLOSED` close time. Downstream consumers key off this
    /// exact shape.
    #[must_use]
    pub fn closed(day_of_week: DayOfWeek) -> Self {
        Self {
            day_of_week,
            open_time: CLOSED_OPEN_TIME.to_string(),
            close_time: CLOSED.to_string(),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.open_time == CLOSED_OPEN_TIME && self.close_time == CLOSED
    }
}

/// Geographic position of a store in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreLocation {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

/// One store listing as read from the input file.
///
/// Serializes with the snake_case field names the downstream indexing
/// service consumes from the notification topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_code: String,
    pub business_name: String,
    #[serde(rename = "address_1")]
    pub address1: String,
    #[serde(rename = "address_2")]
    pub address2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub primary_phone: String,
    pub website: String,
    pub description: String,
    pub payment_types: String,
    pub primary_category: String,
    pub photo: String,
    /// Always one entry per day, in [`DayOfWeek::ALL`] order.
    #[serde(rename = "store_hours")]
    pub hours: [StoreHour; 7],
    pub location: StoreLocation,
    pub sap_id: String,
}

pub mod batch;
pub mod config;
pub mod error;
pub mod hours;
pub mod mapper;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod settings;

pub use batch::{batch_count, batches, BatchSize};
pub use config::{build_load_config, resolve_credentials_path, LoadArgs, LoadConfig};
pub use error::{ConfigError, HoursError, LoadError, ReadError, RowError};
pub use hours::{parse_hour, parse_hours};
pub use mapper::{map_row, FIELD_COUNT};
pub use models::{DayOfWeek, StoreHour, StoreLocation, StoreRecord};
pub use pipeline::{run_load, LoadReport, NotificationSink, WarehouseSink};
pub use reader::{read_store_file, read_stores};
pub use settings::{
    config_dir, load_settings, load_settings_or_default, LoadedSettings, Settings, SettingsSource,
};

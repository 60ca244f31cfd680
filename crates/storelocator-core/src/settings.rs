//! Per-user settings file (`$HOME/.storelocator/config.yaml`).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Name of the per-user configuration directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".storelocator";

/// File name of the settings file inside the configuration directory.
pub const SETTINGS_FILE_NAME: &str = "config.yaml";

/// Values read from the settings file. Every key is optional; command-line
/// flags and environment variables take precedence over these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project: Option<String>,
    /// Credentials file, relative to the configuration directory unless
    /// absolute.
    pub credentials: Option<String>,
    pub topic: Option<String>,
    #[serde(alias = "batchSize")]
    pub batchsize: Option<i64>,
    /// Location for a newly created dataset (e.g. `US`, `EU`).
    pub dataset_location: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_base_ms: Option<u64>,
    /// Base URL override for the warehouse API, for emulators and tests.
    pub bigquery_endpoint: Option<String>,
    /// Base URL override for the messaging API, for emulators and tests.
    pub pubsub_endpoint: Option<String>,
    pub log_level: Option<String>,
}

/// Resolve the per-user configuration directory.
///
/// `STORELOCATOR_HOME` names the directory directly; otherwise it is
/// `$HOME/.storelocator`.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if neither variable is set.
pub fn config_dir<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    if let Ok(dir) = lookup("STORELOCATOR_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    match lookup("HOME") {
        Ok(home) if !home.is_empty() => Ok(Path::new(&home).join(CONFIG_DIR_NAME)),
        _ => Err(ConfigError::NoConfigDir),
    }
}

/// Load settings from an explicit YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::SettingsFileIo`] if the file cannot be read and
/// [`ConfigError::SettingsFileParse`] if it is not valid YAML for
/// [`Settings`].
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    // An empty file deserializes as YAML null, not as an empty mapping.
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&content).map_err(|e| ConfigError::SettingsFileParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Where the settings of a run came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    /// The file named by `--config`.
    Explicit(PathBuf),
    /// `config.yaml` in the configuration directory.
    Default(PathBuf),
    /// The default file does not exist; built-in defaults apply.
    Missing(PathBuf),
    /// There is no configuration directory; built-in defaults apply.
    NoConfigDir,
}

/// Settings for a run together with their origin, so the caller can log
/// it once logging is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

/// Load the settings for a run.
///
/// An `explicit` file must exist. Otherwise `config.yaml` in `config_dir`
/// is used when present, and built-in defaults when it (or the directory)
/// is missing.
///
/// # Errors
///
/// Same as [`load_settings`] for a file that must be or is present but
/// cannot be read or parsed.
pub fn load_settings_or_default(
    explicit: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedSettings, ConfigError> {
    if let Some(path) = explicit {
        return Ok(LoadedSettings {
            settings: load_settings(path)?,
            source: SettingsSource::Explicit(path.to_path_buf()),
        });
    }
    let Some(dir) = config_dir else {
        return Ok(LoadedSettings {
            settings: Settings::default(),
            source: SettingsSource::NoConfigDir,
        });
    };

    let path = dir.join(SETTINGS_FILE_NAME);
    if !path.exists() {
        return Ok(LoadedSettings {
            settings: Settings::default(),
            source: SettingsSource::Missing(path),
        });
    }
    Ok(LoadedSettings {
        settings: load_settings(&path)?,
        source: SettingsSource::Default(path),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn config_dir_defaults_under_home() {
        let map = HashMap::from([("HOME", "/home/alice")]);
        let dir = config_dir(lookup_from_map(&map)).unwrap();
        assert_eq!(dir, PathBuf::from("/home/alice/.storelocator"));
    }

    #[test]
    fn config_dir_prefers_storelocator_home() {
        let map = HashMap::from([("HOME", "/home/alice"), ("STORELOCATOR_HOME", "/etc/stores")]);
        let dir = config_dir(lookup_from_map(&map)).unwrap();
        assert_eq!(dir, PathBuf::from("/etc/stores"));
    }

    #[test]
    fn config_dir_fails_without_home() {
        let map = HashMap::new();
        assert!(matches!(
            config_dir(lookup_from_map(&map)),
            Err(ConfigError::NoConfigDir)
        ));
    }

    #[test]
    fn parses_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "project: my-project\n\
             credentials: creds.json\n\
             topic: stores\n\
             batchsize: 25\n\
             dataset_location: EU\n\
             request_timeout_secs: 5\n\
             max_retries: 1\n\
             retry_backoff_base_ms: 10\n\
             bigquery_endpoint: http://localhost:9050\n\
             pubsub_endpoint: http://localhost:8085\n\
             log_level: debug\n",
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.project.as_deref(), Some("my-project"));
        assert_eq!(settings.credentials.as_deref(), Some("creds.json"));
        assert_eq!(settings.topic.as_deref(), Some("stores"));
        assert_eq!(settings.batchsize, Some(25));
        assert_eq!(settings.dataset_location.as_deref(), Some("EU"));
        assert_eq!(settings.request_timeout_secs, Some(5));
        assert_eq!(settings.max_retries, Some(1));
        assert_eq!(settings.retry_backoff_base_ms, Some(10));
        assert_eq!(settings.bigquery_endpoint.as_deref(), Some("http://localhost:9050"));
        assert_eq!(settings.pubsub_endpoint.as_deref(), Some("http://localhost:8085"));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn accepts_camel_case_batch_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "batchSize: 3\n").unwrap();
        assert_eq!(load_settings(&path).unwrap().batchsize, Some(3));
    }

    #[test]
    fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "batchsize: [not, a, number]\n").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(ConfigError::SettingsFileParse { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_settings(&dir.path().join("absent.yaml")),
            Err(ConfigError::SettingsFileIo { .. })
        ));
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_or_default(None, Some(dir.path())).unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(
            loaded.source,
            SettingsSource::Missing(dir.path().join(SETTINGS_FILE_NAME))
        );
    }

    #[test]
    fn default_file_is_read_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "project: from-dir\n").unwrap();

        let loaded = load_settings_or_default(None, Some(dir.path())).unwrap();
        assert_eq!(loaded.settings.project.as_deref(), Some("from-dir"));
        assert_eq!(loaded.source, SettingsSource::Default(path));
    }

    #[test]
    fn explicit_file_wins_and_needs_no_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alt.yaml");
        std::fs::write(&path, "topic: alt-topic\n").unwrap();

        let loaded = load_settings_or_default(Some(&path), None).unwrap();
        assert_eq!(loaded.settings.topic.as_deref(), Some("alt-topic"));
        assert_eq!(loaded.source, SettingsSource::Explicit(path));
    }

    #[test]
    fn explicit_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings_or_default(Some(&dir.path().join("absent.yaml")), Some(dir.path()));
        assert!(matches!(result, Err(ConfigError::SettingsFileIo { .. })));
    }

    #[test]
    fn no_config_dir_uses_defaults() {
        let loaded = load_settings_or_default(None, None).unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(loaded.source, SettingsSource::NoConfigDir);
    }
}

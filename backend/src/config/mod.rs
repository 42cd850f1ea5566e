//! Sync configuration.
//!
//! Options come from a JSON file (`config.json` by default):
//!
//! ```json
//! {
//!     "upload_url": "https://api.example.com/v3/enterprise/collections",
//!     "api_key": "…",
//!     "csv_path": "lists.csv"
//! }
//! ```
//!
//! `csv_path` is only needed by the file-driven `sync` command. Each option
//! can be overridden from the environment, which keeps the key out of the
//! file. Loading a `.env` file into the environment is left to the binary.
//!
//! | Variable              | Option       |
//! |-----------------------|--------------|
//! | `LISTLOAD_UPLOAD_URL` | `upload_url` |
//! | `LISTLOAD_API_KEY`    | `api_key`    |
//! | `LISTLOAD_CSV_PATH`   | `csv_path`   |

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const ENV_UPLOAD_URL: &str = "LISTLOAD_UPLOAD_URL";
const ENV_API_KEY: &str = "LISTLOAD_API_KEY";
const ENV_CSV_PATH: &str = "LISTLOAD_CSV_PATH";

/// Connection parameters and input location for a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// REST endpoint of the collections resource.
    #[serde(default)]
    pub upload_url: String,

    /// Bearer credential.
    #[serde(default)]
    pub api_key: String,

    /// CSV file for the file-driven variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl SyncConfig {
    pub fn new(upload_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            api_key: api_key.into(),
            csv_path: None,
        }
    }

    /// Read the config file as-is, without overrides or validation.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the config file, apply environment overrides and validate.
    ///
    /// A missing file is not an error when the environment supplies every
    /// required option.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// [`SyncConfig::load`] with overrides read from `lookup` instead of the
    /// process environment.
    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(ConfigError::Unreadable { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound
                    && lookup(ENV_UPLOAD_URL).is_some()
                    && lookup(ENV_API_KEY).is_some() =>
            {
                Self::default()
            }
            Err(e) => return Err(e),
        };

        let config = config.with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Replace options for which `lookup` returns a non-empty value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = lookup(ENV_UPLOAD_URL) {
            self.upload_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(path) = lookup(ENV_CSV_PATH) {
            self.csv_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Check that the connection options are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.upload_url.trim().is_empty() {
            return Err(ConfigError::MissingField("upload_url"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key"));
        }

        let url = reqwest::Url::parse(&self.upload_url).map_err(|e| ConfigError::InvalidValue {
            field: "upload_url",
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "upload_url",
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(())
    }

    /// Write the config back as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = to_json_4_spaces(self)?;
        fs::write(path, content + "\n").map_err(|source| ConfigError::Unwritable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy safe to show: the key keeps only its last four characters.
    pub fn masked(&self) -> Self {
        let visible: String = {
            let chars: Vec<char> = self.api_key.chars().collect();
            let start = chars.len().saturating_sub(4);
            chars[start..].iter().collect()
        };
        let api_key = if self.api_key.chars().count() > 4 {
            format!("****{}", visible)
        } else if self.api_key.is_empty() {
            String::new()
        } else {
            "****".to_string()
        };

        Self {
            api_key,
            ..self.clone()
        }
    }

    /// CSV path to use: the explicit one if given, else the configured one.
    pub fn resolve_csv_path(&self, explicit: Option<&Path>) -> ConfigResult<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.csv_path.clone())
            .ok_or(ConfigError::MissingField("csv_path"))
    }
}

fn to_json_4_spaces<T: Serialize>(value: &T) -> ConfigResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

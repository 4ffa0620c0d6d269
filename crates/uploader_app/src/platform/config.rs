//! Application configuration, read from `uploader.ron`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use uploader_core::{
    Dimensions, UploadMetadata, UploaderConfig, ValidationRules, DEFAULT_ALLOWED_MIME_TYPES,
    DEFAULT_MAX_FILE_SIZE_BYTES,
};
use uploader_engine::TransportSettings;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "uploader.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub record_id: String,
    pub table: String,
    pub table_field: String,
    pub folder: Option<String>,
    pub preset: Option<String>,
    pub auto_upload: bool,
    pub max_file_size_bytes: u64,
    pub allowed_mime_types: Vec<String>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub connect_timeout_secs: u64,
    /// `None` disables the client-side request ceiling.
    pub request_timeout_secs: Option<u64>,
    pub state_dir: PathBuf,
    pub log: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let transport = TransportSettings::default();
        Self {
            endpoint: transport.endpoint,
            record_id: String::new(),
            table: String::new(),
            table_field: String::new(),
            folder: None,
            preset: None,
            auto_upload: true,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            min_width: None,
            min_height: None,
            connect_timeout_secs: transport.connect_timeout.as_secs(),
            request_timeout_secs: transport.request_timeout.map(|timeout| timeout.as_secs()),
            state_dir: PathBuf::from("."),
            log: LogDestination::File,
        }
    }
}

impl AppConfig {
    /// Missing file yields defaults; an unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn uploader_config(&self, initial_url: Option<String>) -> UploaderConfig {
        let min_dimensions = match (self.min_width, self.min_height) {
            (None, None) => None,
            (width, height) => Some(Dimensions::new(width.unwrap_or(0), height.unwrap_or(0))),
        };
        UploaderConfig {
            rules: ValidationRules {
                max_file_size_bytes: self.max_file_size_bytes,
                allowed_mime_types: self.allowed_mime_types.iter().cloned().collect(),
                min_dimensions,
            },
            auto_upload: self.auto_upload,
            metadata: self.metadata(),
            initial_url,
        }
    }

    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            record_id: self.record_id.clone(),
            table: self.table.clone(),
            table_field: self.table_field.clone(),
            folder: self.folder.clone(),
            preset: self.preset.clone(),
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            endpoint: self.endpoint.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            ..TransportSettings::default()
        }
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use upload_logging::{upload_info, upload_warn};
use uploader_core::UploadMetadata;

const STATE_FILENAME: &str = ".uploader_state.ron";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize state: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersistedImage {
    url: String,
    uploaded_utc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct PersistedState {
    images: BTreeMap<String, PersistedImage>,
}

/// One image slot: `table/record_id/table_field`.
fn slot_key(metadata: &UploadMetadata) -> String {
    format!(
        "{}/{}/{}",
        metadata.table, metadata.record_id, metadata.table_field
    )
}

fn load_state(dir: &Path) -> PersistedState {
    let path = dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedState::default();
        }
        Err(err) => {
            upload_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return PersistedState::default();
        }
    };

    match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            upload_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            PersistedState::default()
        }
    }
}

/// Last successfully uploaded URL for this slot, if one was recorded.
pub(crate) fn load_last_good_url(dir: &Path, metadata: &UploadMetadata) -> Option<String> {
    let url = load_state(dir)
        .images
        .remove(&slot_key(metadata))
        .map(|image| image.url);
    if let Some(url) = &url {
        upload_info!("Restored last uploaded image {}", url);
    }
    url
}

pub(crate) fn save_last_good_url(
    dir: &Path,
    metadata: &UploadMetadata,
    url: &str,
) -> Result<(), PersistError> {
    let mut state = load_state(dir);
    state.images.insert(
        slot_key(metadata),
        PersistedImage {
            url: url.to_string(),
            uploaded_utc: chrono::Utc::now().to_rfc3339(),
        },
    );

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&state, pretty)
        .map_err(|err| PersistError::Serialize(err.to_string()))?;

    fs::create_dir_all(dir)?;
    // Temp file + rename: readers never observe a partial write.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(dir.join(STATE_FILENAME))
        .map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}

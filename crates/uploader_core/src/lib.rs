//! Uploader core: pure image-upload state machine, validation, classification
//! and view-model helpers. Owns no IO.
mod classify;
mod effect;
mod error;
mod file;
mod msg;
mod preview;
mod state;
mod update;
mod validate;
mod view_model;

pub use classify::{classify, RawSignal};
pub use effect::Effect;
pub use error::{format_size, ErrorCode, ErrorInfo, UnknownErrorCode};
pub use file::{sniff_mime_type, Dimensions, FileInspector, LocalFile, UNKNOWN_MIME_TYPE};
pub use msg::Msg;
pub use preview::PreviewManager;
pub use state::{AttemptId, UploadMetadata, UploadStatus, UploaderConfig, UploaderState};
pub use update::update;
pub use validate::{
    validate, ValidationRules, DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_FILE_SIZE_BYTES,
};
pub use view_model::UploadViewModel;

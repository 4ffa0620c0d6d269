use crate::{ErrorInfo, UploadStatus, UploaderState};

/// Everything the presentation layer needs to draw one image field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadViewModel {
    pub status: UploadStatus,
    pub progress_percent: u8,
    pub error: Option<ErrorInfo>,
    pub preview_url: Option<String>,
    pub file_name: Option<String>,
    pub picker_enabled: bool,
    pub can_confirm: bool,
    pub can_retry: bool,
    pub can_dismiss: bool,
    pub can_cancel: bool,
}

impl UploadViewModel {
    pub(crate) fn from_state(state: &UploaderState) -> Self {
        let status = state.status();
        let error = state.error().cloned();
        Self {
            status,
            progress_percent: state.progress_percent(),
            preview_url: state.preview().displayed_url().map(ToOwned::to_owned),
            file_name: state.selection().map(|file| file.name().to_string()),
            picker_enabled: status != UploadStatus::Uploading,
            can_confirm: matches!(
                status,
                UploadStatus::Selected | UploadStatus::AwaitingConfirm
            ),
            can_retry: status == UploadStatus::Failed && state.selection().is_some(),
            can_dismiss: error.is_some(),
            can_cancel: status == UploadStatus::Uploading,
            error,
        }
    }
}

use crate::view_model::UploadViewModel;
use crate::{ErrorInfo, LocalFile, PreviewManager, ValidationRules};

/// Identifies one transport attempt. Events tagged with any other id are stale.
pub type AttemptId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Selected,
    AwaitingConfirm,
    Uploading,
    Succeeded,
    Failed,
}

/// Routing values forwarded to the upload endpoint untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadMetadata {
    pub record_id: String,
    pub table: String,
    pub table_field: String,
    pub folder: Option<String>,
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    pub rules: ValidationRules,
    pub auto_upload: bool,
    pub metadata: UploadMetadata,
    pub initial_url: Option<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            rules: ValidationRules::default(),
            auto_upload: true,
            metadata: UploadMetadata::default(),
            initial_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct UploadSession {
    pub(crate) status: UploadStatus,
    pub(crate) progress_percent: u8,
    pub(crate) error: Option<ErrorInfo>,
    pub(crate) attempt: Option<AttemptId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderState {
    config: UploaderConfig,
    session: UploadSession,
    selection: Option<LocalFile>,
    preview: PreviewManager,
    next_attempt: AttemptId,
    dirty: bool,
}

impl Default for UploaderState {
    fn default() -> Self {
        Self::new(UploaderConfig::default())
    }
}

impl UploaderState {
    pub fn new(config: UploaderConfig) -> Self {
        let preview = PreviewManager::new(config.initial_url.clone());
        Self {
            config,
            session: UploadSession::default(),
            selection: None,
            preview,
            next_attempt: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> UploadViewModel {
        UploadViewModel::from_state(self)
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn status(&self) -> UploadStatus {
        self.session.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.session.progress_percent
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.session.error.as_ref()
    }

    pub fn selection(&self) -> Option<&LocalFile> {
        self.selection.as_ref()
    }

    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.session.attempt
    }

    pub fn last_good_url(&self) -> Option<&str> {
        self.preview.last_good()
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn preview(&self) -> &PreviewManager {
        &self.preview
    }

    pub(crate) fn preview_mut(&mut self) -> &mut PreviewManager {
        self.dirty = true;
        &mut self.preview
    }

    pub(crate) fn session_mut(&mut self) -> &mut UploadSession {
        self.dirty = true;
        &mut self.session
    }

    pub(crate) fn set_selection(&mut self, file: Option<LocalFile>) {
        self.dirty = true;
        self.selection = file;
    }

    pub(crate) fn allocate_attempt(&mut self) -> AttemptId {
        let id = self.next_attempt;
        self.next_attempt += 1;
        id
    }

    pub(crate) fn is_current_attempt(&self, attempt: AttemptId) -> bool {
        self.session.status == UploadStatus::Uploading && self.session.attempt == Some(attempt)
    }
}

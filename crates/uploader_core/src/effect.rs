use crate::{AttemptId, LocalFile, UploadMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartUpload {
        attempt: AttemptId,
        file: LocalFile,
        metadata: UploadMetadata,
    },
    CancelUpload { attempt: AttemptId },
    /// Emitted exactly once per successful upload.
    UploadCompleted { remote_url: String },
}

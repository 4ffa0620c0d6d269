use crate::{AttemptId, LocalFile, RawSignal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file in the image picker.
    FileSelected(LocalFile),
    /// User confirmed the pending file (manual upload flow).
    ConfirmClicked,
    /// User asked to re-send the pending file after a failure.
    RetryClicked,
    /// User dismissed the current error.
    DismissClicked,
    /// User cancelled the in-flight upload.
    CancelClicked,
    /// Transport progress for an attempt.
    UploadProgress { attempt: AttemptId, percent: u8 },
    /// Transport confirmed the upload.
    UploadSucceeded { attempt: AttemptId, remote_url: String },
    /// Transport reported a failure.
    UploadFailed { attempt: AttemptId, signal: RawSignal },
    /// The displayed image could not be decoded by the host.
    PreviewLoadFailed,
    /// Fallback for placeholder wiring.
    NoOp,
}

use uploader_core::{AttemptId, LocalFile, Msg, RawSignal, UploadMetadata};

/// One upload attempt as handed to a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: LocalFile,
    pub metadata: UploadMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        attempt: AttemptId,
        percent: u8,
    },
    /// Terminal event; sent exactly once per attempt, after all progress.
    Completed {
        attempt: AttemptId,
        result: Result<String, RawSignal>,
    },
}

impl From<EngineEvent> for Msg {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Progress { attempt, percent } => Msg::UploadProgress { attempt, percent },
            EngineEvent::Completed {
                attempt,
                result: Ok(remote_url),
            } => Msg::UploadSucceeded {
                attempt,
                remote_url,
            },
            EngineEvent::Completed {
                attempt,
                result: Err(signal),
            } => Msg::UploadFailed { attempt, signal },
        }
    }
}

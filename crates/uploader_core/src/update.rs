use upload_logging::{upload_debug, upload_info, upload_warn};

use crate::{
    classify, validate, AttemptId, Effect, LocalFile, Msg, UploadStatus, UploaderState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: UploaderState, msg: Msg) -> (UploaderState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => select(&mut state, file),
        Msg::ConfirmClicked => match state.status() {
            UploadStatus::Selected | UploadStatus::AwaitingConfirm => start_upload(&mut state),
            _ => Vec::new(),
        },
        Msg::RetryClicked => {
            if state.status() == UploadStatus::Failed {
                start_upload(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::DismissClicked => {
            dismiss(&mut state);
            Vec::new()
        }
        Msg::CancelClicked => cancel(&mut state),
        Msg::UploadProgress { attempt, percent } => {
            if state.is_current_attempt(attempt) {
                let percent = percent.min(100);
                if percent > state.progress_percent() {
                    state.session_mut().progress_percent = percent;
                }
            } else {
                upload_debug!("Ignoring stale progress for attempt {}", attempt);
            }
            Vec::new()
        }
        Msg::UploadSucceeded {
            attempt,
            remote_url,
        } => {
            if state.is_current_attempt(attempt) {
                complete(&mut state, remote_url)
            } else {
                upload_debug!("Ignoring stale completion for attempt {}", attempt);
                Vec::new()
            }
        }
        Msg::UploadFailed { attempt, signal } => {
            if state.is_current_attempt(attempt) {
                if signal.aborted {
                    upload_info!("Attempt {} aborted", attempt);
                    reset_to_idle(&mut state);
                } else {
                    let info = classify(&signal);
                    upload_warn!(
                        "Attempt {} failed as {} ({})",
                        attempt,
                        info.code,
                        signal
                    );
                    let session = state.session_mut();
                    session.status = UploadStatus::Failed;
                    session.progress_percent = 0;
                    session.error = Some(info);
                    session.attempt = None;
                }
            } else {
                upload_debug!("Ignoring stale failure for attempt {}", attempt);
            }
            Vec::new()
        }
        Msg::PreviewLoadFailed => {
            upload_warn!("Displayed image failed to load; showing placeholder");
            state.preview_mut().mark_broken();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn select(state: &mut UploaderState, file: LocalFile) -> Vec<Effect> {
    // The picker is inert while a request is in flight.
    if state.status() == UploadStatus::Uploading {
        upload_debug!("Ignoring selection of {:?} while uploading", file.name());
        return Vec::new();
    }

    if let Err(info) = validate(&file, &state.config().rules) {
        upload_info!("Rejected {:?}: {}", file.name(), info);
        state.set_selection(None);
        state.preview_mut().revert_to_last_good();
        let session = state.session_mut();
        session.status = UploadStatus::Idle;
        session.progress_percent = 0;
        session.error = Some(info);
        return Vec::new();
    }

    upload_info!("Selected {:?} ({} bytes)", file.name(), file.len());
    state.preview_mut().show_local_preview(&file);
    state.set_selection(Some(file));
    let session = state.session_mut();
    session.status = UploadStatus::Selected;
    session.progress_percent = 0;
    session.error = None;
    session.attempt = None;

    if state.config().auto_upload {
        start_upload(state)
    } else {
        state.session_mut().status = UploadStatus::AwaitingConfirm;
        Vec::new()
    }
}

fn start_upload(state: &mut UploaderState) -> Vec<Effect> {
    let Some(file) = state.selection().cloned() else {
        return Vec::new();
    };
    let attempt: AttemptId = state.allocate_attempt();
    let metadata = state.config().metadata.clone();
    upload_info!("Starting attempt {} for {:?}", attempt, file.name());

    let session = state.session_mut();
    session.status = UploadStatus::Uploading;
    session.progress_percent = 0;
    session.error = None;
    session.attempt = Some(attempt);

    vec![Effect::StartUpload {
        attempt,
        file,
        metadata,
    }]
}

fn complete(state: &mut UploaderState, remote_url: String) -> Vec<Effect> {
    upload_info!("Upload complete: {}", remote_url);
    state.session_mut().status = UploadStatus::Succeeded;
    state.preview_mut().promote(remote_url.clone());
    reset_to_idle(state);
    vec![Effect::UploadCompleted { remote_url }]
}

fn cancel(state: &mut UploaderState) -> Vec<Effect> {
    if state.status() != UploadStatus::Uploading {
        return Vec::new();
    }
    let attempt = state.current_attempt();
    reset_to_idle(state);
    match attempt {
        Some(attempt) => {
            upload_info!("Cancelled attempt {}", attempt);
            vec![Effect::CancelUpload { attempt }]
        }
        None => Vec::new(),
    }
}

fn dismiss(state: &mut UploaderState) {
    match state.status() {
        UploadStatus::Failed => reset_to_idle(state),
        // Validation errors are shown while idle.
        UploadStatus::Idle if state.error().is_some() => state.session_mut().error = None,
        _ => {}
    }
}

/// Clears the session and pending file; the preview falls back to last-known-good.
fn reset_to_idle(state: &mut UploaderState) {
    state.set_selection(None);
    state.preview_mut().revert_to_last_good();
    let session = state.session_mut();
    session.status = UploadStatus::Idle;
    session.progress_percent = 0;
    session.error = None;
    session.attempt = None;
}

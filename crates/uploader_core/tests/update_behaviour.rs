use std::sync::Once;

use uploader_core::{
    update, AttemptId, Effect, ErrorCode, LocalFile, Msg, RawSignal, UploadMetadata,
    UploadStatus, UploaderConfig, UploaderState,
};

const MB: usize = 1024 * 1024;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(upload_logging::initialize_for_tests);
}

fn metadata() -> UploadMetadata {
    UploadMetadata {
        record_id: "42".to_string(),
        table: "products".to_string(),
        table_field: "image_url".to_string(),
        folder: Some("catalog".to_string()),
        preset: None,
    }
}

fn auto_state() -> UploaderState {
    UploaderState::new(UploaderConfig {
        metadata: metadata(),
        ..UploaderConfig::default()
    })
}

fn manual_state() -> UploaderState {
    UploaderState::new(UploaderConfig {
        auto_upload: false,
        metadata: metadata(),
        ..UploaderConfig::default()
    })
}

fn png(len: usize) -> LocalFile {
    LocalFile::new("photo.png", "image/png", vec![7u8; len])
}

fn started_attempt(effects: &[Effect]) -> AttemptId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartUpload { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .expect("start effect")
}

#[test]
fn oversized_selection_is_rejected_without_upload() {
    init_logging();
    let file = LocalFile::new("big.jpg", "image/jpeg", vec![0u8; 6 * MB]);

    let (mut state, effects) = update(auto_state(), Msg::FileSelected(file));
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.status, UploadStatus::Idle);
    let error = view.error.expect("validation error");
    assert_eq!(error.code, ErrorCode::FileTooLarge);
    assert!(error.message.ends_with("5MB"));
    assert_eq!(view.preview_url, None);
    assert!(state.consume_dirty());
}

#[test]
fn unsupported_type_is_rejected_without_upload() {
    init_logging();
    let file = LocalFile::new("doc.pdf", "application/pdf", vec![0u8; 1024]);

    let (state, effects) = update(auto_state(), Msg::FileSelected(file));

    assert!(effects.is_empty());
    assert_eq!(state.status(), UploadStatus::Idle);
    assert_eq!(state.error().unwrap().code, ErrorCode::UnsupportedFormat);
}

#[test]
fn auto_upload_starts_immediately_with_metadata() {
    init_logging();
    let file = png(2 * MB);

    let (state, effects) = update(auto_state(), Msg::FileSelected(file.clone()));
    let view = state.view();

    assert_eq!(view.status, UploadStatus::Uploading);
    assert!(!view.picker_enabled);
    assert!(view.can_cancel);
    assert!(view.preview_url.unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(
        effects,
        vec![Effect::StartUpload {
            attempt: 1,
            file,
            metadata: metadata(),
        }]
    );
}

#[test]
fn manual_flow_waits_for_confirm() {
    init_logging();
    let (state, effects) = update(manual_state(), Msg::FileSelected(png(1024)));
    assert!(effects.is_empty());
    assert_eq!(state.status(), UploadStatus::AwaitingConfirm);
    assert!(state.view().can_confirm);

    let (state, effects) = update(state, Msg::ConfirmClicked);
    assert_eq!(state.status(), UploadStatus::Uploading);
    assert_eq!(started_attempt(&effects), 1);

    // A second confirm while in flight must not start another request.
    let (state, effects) = update(state, Msg::ConfirmClicked);
    assert!(effects.is_empty());
    assert_eq!(state.current_attempt(), Some(1));
}

#[test]
fn successful_upload_promotes_url_and_notifies_once() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(2 * MB)));
    let attempt = started_attempt(&effects);

    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 60 });
    assert_eq!(state.progress_percent(), 60);

    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            attempt,
            remote_url: "https://cdn/x.png".to_string(),
        },
    );
    let view = state.view();

    assert_eq!(view.status, UploadStatus::Idle);
    assert_eq!(view.preview_url.as_deref(), Some("https://cdn/x.png"));
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.error, None);
    assert!(state.selection().is_none());
    assert_eq!(
        effects,
        vec![Effect::UploadCompleted {
            remote_url: "https://cdn/x.png".to_string()
        }]
    );

    // A duplicate completion for the same attempt is stale and ignored.
    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            attempt,
            remote_url: "https://cdn/other.png".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.last_good_url(), Some("https://cdn/x.png"));
}

#[test]
fn progress_never_goes_backwards() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(1024)));
    let attempt = started_attempt(&effects);

    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 40 });
    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 25 });
    assert_eq!(state.progress_percent(), 40);

    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 250 });
    assert_eq!(state.progress_percent(), 100);
}

#[test]
fn server_failure_is_classified_and_retry_reuses_file() {
    init_logging();
    let initial = UploaderState::new(UploaderConfig {
        initial_url: Some("https://cdn/old.png".to_string()),
        metadata: metadata(),
        ..UploaderConfig::default()
    });
    let file = png(2 * MB);
    let (state, effects) = update(initial, Msg::FileSelected(file.clone()));
    let attempt = started_attempt(&effects);

    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 30 });
    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::http(500, "signature mismatch"),
        },
    );
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.status, UploadStatus::Failed);
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.error.unwrap().code, ErrorCode::InvalidSignature);
    assert!(view.can_retry);
    assert!(view.can_dismiss);
    assert_eq!(state.last_good_url(), Some("https://cdn/old.png"));

    let (state, effects) = update(state, Msg::RetryClicked);
    assert_eq!(state.status(), UploadStatus::Uploading);
    match effects.as_slice() {
        [Effect::StartUpload {
            attempt: retry_attempt,
            file: resent,
            metadata: resent_metadata,
        }] => {
            assert_ne!(*retry_attempt, attempt);
            assert!(resent.shares_payload_with(&file));
            assert_eq!(resent, &file);
            assert_eq!(resent_metadata, &metadata());
        }
        other => panic!("unexpected effects: {other:?}"),
    }
}

#[test]
fn server_reported_abort_code_is_a_retryable_failure() {
    init_logging();
    let file = png(1024);
    let (state, effects) = update(auto_state(), Msg::FileSelected(file.clone()));
    let attempt = started_attempt(&effects);

    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::http(500, "internal error")
                .with_code(Some("upload_aborted".to_string())),
        },
    );
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.status, UploadStatus::Failed);
    assert_eq!(view.error.unwrap().code, ErrorCode::UploadFailed);
    assert!(view.can_retry);
    assert!(view.can_dismiss);
    assert_eq!(state.selection(), Some(&file));
}

#[test]
fn dismiss_keeps_last_known_good_preview() {
    init_logging();
    let initial = UploaderState::new(UploaderConfig {
        initial_url: Some("https://cdn/old.png".to_string()),
        ..UploaderConfig::default()
    });
    let (state, effects) = update(initial, Msg::FileSelected(png(1024)));
    let attempt = started_attempt(&effects);
    let (state, _) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::network("connection reset"),
        },
    );
    assert_eq!(state.error().unwrap().code, ErrorCode::NetworkError);

    let (state, _) = update(state, Msg::DismissClicked);
    let view = state.view();
    assert_eq!(view.status, UploadStatus::Idle);
    assert_eq!(view.error, None);
    assert_eq!(view.preview_url.as_deref(), Some("https://cdn/old.png"));
}

#[test]
fn cancel_resets_to_idle_without_error() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(1024)));
    let attempt = started_attempt(&effects);
    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 40 });

    let (state, effects) = update(state, Msg::CancelClicked);
    let view = state.view();

    assert_eq!(effects, vec![Effect::CancelUpload { attempt }]);
    assert_eq!(view.status, UploadStatus::Idle);
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.error, None);
    assert!(view.picker_enabled);

    // The aborted attempt's late callbacks are ignored.
    let (state, _) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::aborted(),
        },
    );
    let (state, _) = update(state, Msg::UploadProgress { attempt, percent: 90 });
    assert_eq!(state.status(), UploadStatus::Idle);
    assert_eq!(state.progress_percent(), 0);
    assert_eq!(state.error(), None);
}

#[test]
fn unsolicited_abort_is_not_an_error() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(1024)));
    let attempt = started_attempt(&effects);

    let (state, _) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::aborted(),
        },
    );
    assert_eq!(state.status(), UploadStatus::Idle);
    assert_eq!(state.error(), None);
}

#[test]
fn selection_while_uploading_is_ignored() {
    init_logging();
    let first = png(1024);
    let (state, _) = update(auto_state(), Msg::FileSelected(first.clone()));

    let second = LocalFile::new("other.png", "image/png", vec![1u8; 10]);
    let (state, effects) = update(state, Msg::FileSelected(second));

    assert!(effects.is_empty());
    assert_eq!(state.current_attempt(), Some(1));
    assert_eq!(state.selection(), Some(&first));
}

#[test]
fn late_events_from_old_attempt_do_not_touch_new_session() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(1024)));
    let old = started_attempt(&effects);
    let (state, _) = update(state, Msg::CancelClicked);

    let (state, effects) = update(state, Msg::FileSelected(png(2048)));
    let new = started_attempt(&effects);
    assert_ne!(old, new);

    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            attempt: old,
            remote_url: "https://cdn/stale.png".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.status(), UploadStatus::Uploading);
    assert_eq!(state.current_attempt(), Some(new));
    assert_eq!(state.last_good_url(), None);
}

#[test]
fn dismiss_and_retry_are_idempotent() {
    init_logging();
    let (state, effects) = update(auto_state(), Msg::FileSelected(png(1024)));
    let attempt = started_attempt(&effects);
    let (state, _) = update(
        state,
        Msg::UploadFailed {
            attempt,
            signal: RawSignal::http(500, "boom"),
        },
    );

    let (state, _) = update(state, Msg::DismissClicked);
    let (state, _) = update(state, Msg::DismissClicked);
    assert_eq!(state.status(), UploadStatus::Idle);

    let (state, effects) = update(state, Msg::RetryClicked);
    assert!(effects.is_empty());
    assert_eq!(state.status(), UploadStatus::Idle);
}

#[test]
fn invalid_selection_discards_pending_file() {
    init_logging();
    let (state, _) = update(manual_state(), Msg::FileSelected(png(1024)));
    assert_eq!(state.status(), UploadStatus::AwaitingConfirm);

    let bad = LocalFile::new("notes.txt", "text/plain", vec![0u8; 10]);
    let (state, effects) = update(state, Msg::FileSelected(bad));

    assert!(effects.is_empty());
    assert_eq!(state.status(), UploadStatus::Idle);
    assert!(state.selection().is_none());
    assert_eq!(state.view().preview_url, None);

    let (state, _) = update(state, Msg::ConfirmClicked);
    assert_eq!(state.status(), UploadStatus::Idle);

    // Dismiss clears a validation error shown while idle.
    let (state, _) = update(state, Msg::DismissClicked);
    assert_eq!(state.error(), None);
}

#[test]
fn broken_preview_falls_back_to_placeholder() {
    init_logging();
    let state = UploaderState::new(UploaderConfig {
        initial_url: Some("https://cdn/broken.png".to_string()),
        ..UploaderConfig::default()
    });
    assert_eq!(
        state.view().preview_url.as_deref(),
        Some("https://cdn/broken.png")
    );

    let (mut state, effects) = update(state, Msg::PreviewLoadFailed);
    assert!(effects.is_empty());
    assert_eq!(state.view().preview_url, None);
    assert_eq!(state.status(), UploadStatus::Idle);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

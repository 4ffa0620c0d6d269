use uploader_core::{UploadStatus, UploadViewModel};

const BAR_WIDTH: usize = 20;

/// Renders the field as terminal lines: status, then preview, then any error and hints.
pub fn render(view: &UploadViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);

    let name = view.file_name.as_deref().unwrap_or("no file");
    lines.push(match view.status {
        UploadStatus::Uploading => format!(
            "{} {:>3}% Uploading {}",
            progress_bar(view.progress_percent),
            view.progress_percent,
            name
        ),
        status => format!("{} {}", status_label(status), name),
    });

    lines.push(format!(
        "Image: {}",
        view.preview_url
            .as_deref()
            .map(summarize_url)
            .unwrap_or_else(|| "(placeholder)".to_string())
    ));

    if let Some(error) = &view.error {
        lines.push(format!("Error [{}]: {}", error.code, error.message));
    }

    let hints = action_hints(view);
    if !hints.is_empty() {
        lines.push(hints.join("  "));
    }
    lines
}

fn status_label(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Idle => "Idle",
        UploadStatus::Selected => "Selected",
        UploadStatus::AwaitingConfirm => "Ready",
        UploadStatus::Uploading => "Uploading",
        UploadStatus::Succeeded => "Uploaded",
        UploadStatus::Failed => "Failed",
    }
}

fn action_hints(view: &UploadViewModel) -> Vec<&'static str> {
    let mut hints = Vec::new();
    if view.can_confirm {
        hints.push("[u] upload");
    }
    if view.can_retry {
        hints.push("[r] retry");
    }
    if view.can_dismiss {
        hints.push("[d] dismiss");
    }
    if view.can_cancel {
        hints.push("[c] cancel");
    }
    if view.status != UploadStatus::Uploading {
        hints.push("[q] quit");
    }
    hints
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

// Local previews are data URLs; printing the payload is useless.
fn summarize_url(url: &str) -> String {
    match url.split_once(";base64,") {
        Some((prefix, payload)) if url.starts_with("data:") => {
            format!("{prefix} (local preview, {} chars)", payload.len())
        }
        _ => url.to_string(),
    }
}

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::{FileInspector, LocalFile};

/// Tracks what the image slot displays: a transient local preview of the
/// pending file, or the last successfully uploaded remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewManager {
    local: Option<String>,
    last_good: Option<String>,
    broken: bool,
}

impl PreviewManager {
    pub fn new(initial_url: Option<String>) -> Self {
        Self {
            local: None,
            last_good: initial_url.filter(|url| !url.trim().is_empty()),
            broken: false,
        }
    }

    /// Renders the file as a `data:` URL and shows it in place of the remote image.
    pub fn show_local_preview(&mut self, file: &LocalFile) -> &str {
        let encoded = STANDARD.encode(&file.bytes()[..]);
        self.broken = false;
        self.local
            .insert(format!("data:{};base64,{encoded}", file.mime_type()))
    }

    /// Adopts a remote URL after a successful upload and drops the local preview.
    pub fn promote(&mut self, remote_url: impl Into<String>) {
        self.local = None;
        self.last_good = Some(remote_url.into());
        self.broken = false;
    }

    /// Drops the local preview; the last-known-good remote URL is shown again.
    pub fn revert_to_last_good(&mut self) {
        self.local = None;
    }

    /// The displayed image failed to load: show the placeholder instead.
    pub fn mark_broken(&mut self) {
        self.local = None;
        self.broken = true;
    }

    pub fn displayed_url(&self) -> Option<&str> {
        if self.broken {
            return None;
        }
        self.local.as_deref().or(self.last_good.as_deref())
    }

    pub fn last_good(&self) -> Option<&str> {
        self.last_good.as_deref()
    }

    pub fn has_local_preview(&self) -> bool {
        self.local.is_some()
    }
}

use upload_logging::upload_debug;
use uploader_core::{
    update, Effect, LocalFile, Msg, UploadViewModel, UploaderConfig, UploaderState,
};

use crate::{EngineHandle, UploadRequest};

pub type CompletionCallback = Box<dyn FnMut(&str) + Send>;

/// Binds one upload state machine to one engine: the presentation adapter a
/// host embeds per image field.
///
/// All mutation happens on the caller's thread through [`UploadField::dispatch`];
/// engine events are folded in by [`UploadField::pump`].
pub struct UploadField {
    state: UploaderState,
    engine: EngineHandle,
    on_upload_complete: Option<CompletionCallback>,
}

impl UploadField {
    pub fn new(config: UploaderConfig, engine: EngineHandle) -> Self {
        Self {
            state: UploaderState::new(config),
            engine,
            on_upload_complete: None,
        }
    }

    /// Called once per successful upload with the new remote URL.
    pub fn on_upload_complete(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_upload_complete = Some(Box::new(callback));
        self
    }

    pub fn select(&mut self, file: LocalFile) {
        self.dispatch(Msg::FileSelected(file));
    }

    pub fn confirm(&mut self) {
        self.dispatch(Msg::ConfirmClicked);
    }

    pub fn retry(&mut self) {
        self.dispatch(Msg::RetryClicked);
    }

    pub fn dismiss(&mut self) {
        self.dispatch(Msg::DismissClicked);
    }

    pub fn cancel(&mut self) {
        self.dispatch(Msg::CancelClicked);
    }

    pub fn preview_load_failed(&mut self) {
        self.dispatch(Msg::PreviewLoadFailed);
    }

    /// Drains pending engine events into the state machine. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.engine.try_recv() {
            self.dispatch(event.into());
            applied += 1;
        }
        applied
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    pub fn view(&self) -> UploadViewModel {
        self.state.view()
    }

    pub fn state(&self) -> &UploaderState {
        &self.state
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartUpload {
                attempt,
                file,
                metadata,
            } => self.engine.start(attempt, UploadRequest { file, metadata }),
            Effect::CancelUpload { attempt } => self.engine.cancel(attempt),
            Effect::UploadCompleted { remote_url } => match self.on_upload_complete.as_mut() {
                Some(callback) => callback(&remote_url),
                None => upload_debug!("Upload completed without a listener: {}", remote_url),
            },
        }
    }
}

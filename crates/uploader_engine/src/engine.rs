use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;
use tokio_util::sync::CancellationToken;
use upload_logging::{upload_debug, upload_info};
use uploader_core::AttemptId;

use crate::transport::{ProgressSink, ReqwestTransport, Transport, TransportSettings};
use crate::{EngineEvent, UploadRequest};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid upload endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to start upload runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    Start {
        attempt: AttemptId,
        request: UploadRequest,
    },
    Cancel {
        attempt: AttemptId,
    },
}

type InFlight = Arc<Mutex<HashMap<AttemptId, CancellationToken>>>;

/// Runs upload attempts on a background runtime and reports [`EngineEvent`]s.
///
/// One handle serves one image field; independent fields each own a handle.
pub struct EngineHandle {
    cmd_tx: tokio_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: TransportSettings) -> Result<Self, EngineError> {
        let transport = ReqwestTransport::new(settings)?;
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Result<Self, EngineError> {
        let (cmd_tx, mut cmd_rx) = tokio_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        // One attempt in flight per field; a single-threaded runtime is enough.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("uploader-engine".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
                    while let Some(command) = cmd_rx.recv().await {
                        match command {
                            EngineCommand::Start { attempt, request } => {
                                let cancel = CancellationToken::new();
                                if let Ok(mut tokens) = in_flight.lock() {
                                    tokens.insert(attempt, cancel.clone());
                                }
                                let transport = transport.clone();
                                let event_tx = event_tx.clone();
                                let in_flight = in_flight.clone();
                                tokio::spawn(async move {
                                    run_attempt(
                                        transport.as_ref(),
                                        attempt,
                                        request,
                                        cancel,
                                        event_tx,
                                    )
                                    .await;
                                    if let Ok(mut tokens) = in_flight.lock() {
                                        tokens.remove(&attempt);
                                    }
                                });
                            }
                            EngineCommand::Cancel { attempt } => {
                                let token = in_flight
                                    .lock()
                                    .ok()
                                    .and_then(|mut tokens| tokens.remove(&attempt));
                                match token {
                                    Some(token) => token.cancel(),
                                    None => {
                                        upload_debug!("Cancel for finished attempt {}", attempt)
                                    }
                                }
                            }
                        }
                    }
                });
                // Dropping the runtime aborts anything still in flight.
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn start(&self, attempt: AttemptId, request: UploadRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Start { attempt, request });
    }

    pub fn cancel(&self, attempt: AttemptId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { attempt });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

struct ChannelProgressSink {
    attempt: AttemptId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, percent: u8) {
        let _ = self.tx.send(EngineEvent::Progress {
            attempt: self.attempt,
            percent,
        });
    }
}

async fn run_attempt(
    transport: &dyn Transport,
    attempt: AttemptId,
    request: UploadRequest,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    upload_info!(
        "Attempt {} uploading {:?} ({} bytes)",
        attempt,
        request.file.name(),
        request.file.len()
    );
    let sink = Arc::new(ChannelProgressSink {
        attempt,
        tx: event_tx.clone(),
    });
    let result = transport.upload(request, sink, cancel).await;
    match &result {
        Ok(url) => upload_info!("Attempt {} uploaded to {}", attempt, url),
        Err(signal) => upload_info!("Attempt {} ended: {}", attempt, signal),
    }
    let _ = event_tx.send(EngineEvent::Completed { attempt, result });
}

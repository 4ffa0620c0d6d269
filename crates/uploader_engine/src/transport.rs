use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio_util::sync::CancellationToken;
use upload_logging::upload_debug;
use uploader_core::{FileInspector, RawSignal, UploadMetadata};

use crate::response::interpret_response;
use crate::{EngineError, UploadRequest};

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Ceiling for the whole request; `None` leaves it unbounded.
    pub request_timeout: Option<Duration>,
    /// Granularity of progress reporting while the body streams out.
    pub chunk_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/upload".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Some(Duration::from_secs(120)),
            chunk_size: 64 * 1024,
        }
    }
}

/// Receives integer upload percentages for one attempt, in non-decreasing order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, percent: u8);
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Uploads one file and resolves to the remote URL.
    ///
    /// Cancelling `cancel` must resolve promptly with an aborted [`RawSignal`].
    async fn upload(
        &self,
        request: UploadRequest,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<String, RawSignal>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    chunk_size: usize,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, EngineError> {
        let endpoint =
            reqwest::Url::parse(&settings.endpoint).map_err(|err| EngineError::InvalidEndpoint {
                endpoint: settings.endpoint.clone(),
                message: err.to_string(),
            })?;

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            chunk_size: settings.chunk_size.max(1),
        })
    }

    async fn send(
        &self,
        request: UploadRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<String, RawSignal> {
        let form = build_form(&request, self.chunk_size, sink)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        upload_debug!("Upload endpoint answered {} ({} bytes)", status, body.len());
        interpret_response(status, &body)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn upload(
        &self,
        request: UploadRequest,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<String, RawSignal> {
        let remote_url = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RawSignal::aborted()),
            result = self.send(request, sink.clone()) => result?,
        };
        sink.emit(100);
        Ok(remote_url)
    }
}

fn build_form(
    request: &UploadRequest,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> Result<Form, RawSignal> {
    let file = &request.file;
    let payload = Bytes::from_owner(file.bytes().clone());
    let total = payload.len() as u64;
    let part = Part::stream_with_length(progress_body(payload, chunk_size, sink), total)
        .file_name(file.name().to_string())
        .mime_str(file.mime_type())
        .map_err(|err| RawSignal {
            message: format!("invalid content type {}: {err}", file.mime_type()),
            ..RawSignal::default()
        })?;

    Ok(metadata_fields(Form::new(), &request.metadata).part("file", part))
}

fn metadata_fields(form: Form, metadata: &UploadMetadata) -> Form {
    let mut form = form
        .text("recordId", metadata.record_id.clone())
        .text("table", metadata.table.clone())
        .text("tableField", metadata.table_field.clone());
    if let Some(preset) = &metadata.preset {
        form = form.text("cloudinaryPreset", preset.clone());
    }
    if let Some(folder) = &metadata.folder {
        form = form.text("folder", folder.clone());
    }
    form
}

/// Streams the payload in chunks, reporting progress as each chunk is handed to
/// the connection. Reported values stop at 99; 100 is reserved for a confirmed
/// response.
fn progress_body(payload: Bytes, chunk_size: usize, sink: Arc<dyn ProgressSink>) -> reqwest::Body {
    let total = payload.len();
    let mut last_reported = 0u8;
    let chunks = (0..total).step_by(chunk_size).map(move |start| {
        let end = (start + chunk_size).min(total);
        let percent = sent_percent(end as u64, total as u64);
        if percent > last_reported {
            last_reported = percent;
            sink.emit(percent);
        }
        Ok::<Bytes, std::io::Error>(payload.slice(start..end))
    });
    reqwest::Body::wrap_stream(futures_util::stream::iter(chunks))
}

fn sent_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (sent.saturating_mul(100) / total).min(99) as u8
}

fn map_reqwest_error(err: reqwest::Error) -> RawSignal {
    if err.is_timeout() {
        return RawSignal::network(format!("request timed out: {err}"));
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return RawSignal::network(err.to_string());
    }
    RawSignal {
        status: err.status().map(|status| status.as_u16()),
        message: err.to_string(),
        ..RawSignal::default()
    }
}

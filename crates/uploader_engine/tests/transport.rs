use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use uploader_core::{classify, ErrorCode, LocalFile, UploadMetadata};
use uploader_engine::{ProgressSink, ReqwestTransport, Transport, TransportSettings, UploadRequest};
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<u8>>,
}

impl TestSink {
    fn take(&self) -> Vec<u8> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, percent: u8) {
        self.events.lock().unwrap().push(percent);
    }
}

fn request(len: usize) -> UploadRequest {
    UploadRequest {
        file: LocalFile::new("photo.png", "image/png", vec![b'p'; len]),
        metadata: UploadMetadata {
            record_id: "rec-7".to_string(),
            table: "offers".to_string(),
            table_field: "banner".to_string(),
            folder: Some("banners".to_string()),
            preset: Some("storefront".to_string()),
        },
    }
}

fn transport(endpoint: String, settings: TransportSettings) -> ReqwestTransport {
    ReqwestTransport::new(TransportSettings {
        endpoint,
        chunk_size: 1024,
        ..settings
    })
    .expect("transport")
}

#[tokio::test]
async fn upload_sends_multipart_and_returns_image_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"recordId\""))
        .and(body_string_contains("rec-7"))
        .and(body_string_contains("name=\"tableField\""))
        .and(body_string_contains("name=\"cloudinaryPreset\""))
        .and(body_string_contains("name=\"folder\""))
        .and(body_string_contains("filename=\"photo.png\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"imageUrl":"https://cdn/x.png"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(
        format!("{}/api/upload", server.uri()),
        TransportSettings::default(),
    );
    let sink = Arc::new(TestSink::default());

    let url = transport
        .upload(request(10 * 1024), sink.clone(), CancellationToken::new())
        .await
        .expect("upload ok");
    assert_eq!(url, "https://cdn/x.png");

    let progress = sink.take();
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(progress[..progress.len() - 1].iter().all(|p| *p < 100));
}

#[tokio::test]
async fn server_error_becomes_raw_signal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"error":"signature mismatch"}"#),
        )
        .mount(&server)
        .await;

    let transport = transport(server.uri(), TransportSettings::default());
    let sink = Arc::new(TestSink::default());

    let signal = transport
        .upload(request(512), sink.clone(), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(signal.status, Some(500));
    assert_eq!(signal.message, "signature mismatch");
    assert_eq!(classify(&signal).code, ErrorCode::InvalidSignature);
    assert!(!sink.take().contains(&100));
}

#[tokio::test]
async fn success_status_without_url_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let transport = transport(server.uri(), TransportSettings::default());
    let signal = transport
        .upload(request(16), Arc::new(TestSink::default()), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(signal.status, Some(200));
    assert_eq!(classify(&signal).code, ErrorCode::UploadFailed);
}

#[tokio::test]
async fn cancellation_resolves_as_abort() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_string(r#"{"imageUrl":"https://cdn/late.png"}"#),
        )
        .mount(&server)
        .await;

    let transport = transport(server.uri(), TransportSettings::default());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let signal = transport
        .upload(request(64), Arc::new(TestSink::default()), cancel)
        .await
        .unwrap_err();
    assert!(signal.aborted);
    assert_eq!(classify(&signal).code, ErrorCode::UploadAborted);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn slow_endpoint_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string(r#"{"imageUrl":"https://cdn/slow.png"}"#),
        )
        .mount(&server)
        .await;

    let settings = TransportSettings {
        request_timeout: Some(Duration::from_millis(50)),
        ..TransportSettings::default()
    };
    let transport = transport(server.uri(), settings);

    let signal = transport
        .upload(request(64), Arc::new(TestSink::default()), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(signal.network);
    assert_eq!(classify(&signal).code, ErrorCode::NetworkError);
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let transport = transport(
        format!("http://127.0.0.1:{port}/api/upload"),
        TransportSettings::default(),
    );

    let signal = transport
        .upload(request(64), Arc::new(TestSink::default()), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(signal.network);
    assert_eq!(classify(&signal).code, ErrorCode::NetworkError);
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    let err = ReqwestTransport::new(TransportSettings {
        endpoint: "not a url".to_string(),
        ..TransportSettings::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("not a url"));
}

//! Test helpers: a throwaway backend on an ephemeral port, a multipart body
//! builder, and in-memory stand-ins for the form's transport and download sink.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Multipart, OriginalUri, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;

use crate::form::download::{DownloadError, DownloadSink};
use crate::form::transport::{TransportError, UploadTransport};
use crate::outcome::RelayOutcome;
use crate::upload::{UploadFile, UploadRequest, PDF_MEDIA_TYPE};

/// What the mock backend answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Pdf(Vec<u8>),
    Json(StatusCode, Value),
    /// A JSON body sent byte for byte as given.
    RawJson(&'static str),
    Text(StatusCode, String),
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    async fn render(self) -> Response {
        let mut reply = self;
        while let MockReply::Delayed(delay, inner) = reply {
            tokio::time::sleep(delay).await;
            reply = *inner;
        }
        match reply {
            MockReply::Pdf(bytes) => {
                ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response()
            }
            MockReply::Json(status, value) => (status, Json(value)).into_response(),
            MockReply::RawJson(body) => {
                ([(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            MockReply::Text(status, text) => (status, text).into_response(),
            MockReply::Delayed(..) => unreachable!(),
        }
    }
}

/// One multipart request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub path: String,
    pub fields: HashMap<String, String>,
    pub file: Option<UploadFile>,
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    received: Arc<Mutex<Vec<ReceivedUpload>>>,
}

pub struct MockBackend {
    pub url: String,
    received: Arc<Mutex<Vec<ReceivedUpload>>>,
}

impl MockBackend {
    /// Serves `reply` on both `/api/upload` and `/upload`.
    pub async fn spawn(reply: MockReply) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/api/upload", post(mock_upload))
            .route("/upload", post(mock_upload))
            .layer(DefaultBodyLimit::disable())
            .with_state(state);

        let addr = serve(app).await;
        Self {
            url: format!("http://{addr}"),
            received,
        }
    }

    pub fn received(&self) -> Vec<ReceivedUpload> {
        self.received.lock().unwrap().clone()
    }
}

async fn mock_upload(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    mut multipart: Multipart,
) -> Response {
    let mut fields = HashMap::new();
    let mut file = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let media_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();
            file = Some(UploadFile::new(filename, media_type, bytes));
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }
    state.received.lock().unwrap().push(ReceivedUpload {
        path: uri.path().to_string(),
        fields,
        file,
    });
    state.reply.render().await
}

/// Binds `127.0.0.1:0`, serves `app` in the background and returns the bound address.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Hand-rolled multipart/form-data body for driving the router with `oneshot`.
pub struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "relay-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            buf: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Returns the `Content-Type` header value and the encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.buf,
        )
    }
}

/// A small byte string that starts like a real PDF.
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(len.max(bytes.len()), b'x');
    bytes
}

/// Transport that records each request and answers from a script, in order.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<RelayOutcome, TransportError>>>>,
    sent: Arc<Mutex<Vec<UploadRequest>>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn replying(replies: Vec<Result<RelayOutcome, TransportError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    /// Each reply arrives after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn sent(&self) -> Vec<UploadRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn send(&self, request: &UploadRequest) -> Result<RelayOutcome, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left")
    }
}

/// Download sink that keeps saved files in memory under `/downloads`.
#[derive(Clone, Default)]
pub struct MemorySink {
    saved: Arc<Mutex<Vec<(String, Bytes)>>>,
    fail: bool,
}

impl MemorySink {
    /// A sink whose every save fails with a permission error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, Bytes)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, filename: &str, bytes: Bytes) -> Result<PathBuf, DownloadError> {
        if self.fail {
            return Err(DownloadError::Io {
                filename: filename.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        self.saved.lock().unwrap().push((filename.to_string(), bytes));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

/// A PDF reply named the way the relay names it for `file`.
pub fn pdf_reply(bytes: &'static [u8], file: &UploadFile) -> RelayOutcome {
    RelayOutcome::Binary {
        bytes: Bytes::from_static(bytes),
        suggested_filename: file.download_filename(),
    }
}

/// A JSON reply whose raw body is the compact encoding of `value`.
pub fn structured(value: Value) -> RelayOutcome {
    let raw = Bytes::from(value.to_string());
    RelayOutcome::Structured { value, raw }
}

/// A PDF upload of `size` bytes named `jane_doe.pdf`.
pub fn resume(size: usize) -> UploadFile {
    UploadFile::new("jane_doe.pdf", PDF_MEDIA_TYPE, vec![b'x'; size])
}

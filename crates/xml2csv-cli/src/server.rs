//! HTTP front end for the converter.
//!
//! - `GET /` serves the upload page
//! - `POST /convert` takes a multipart upload (`xml` file, optional `rowTag`)
//!   and streams back `result.csv`
//!
//! The upload is spooled to an anonymous temp file, then converted on the
//! blocking pool straight into the response body. Once the first byte is out
//! the status is committed, so a failed conversion aborts the body stream
//! instead of trying to send an error status.

use std::io::{self, BufWriter, SeekFrom, Write};
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};
use xml2csv_core::config::{ConvertConfig, ServeConfig};
use xml2csv_io::{SpreadsheetWriter, StreamingRowConverter};

use crate::browser;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Body chunks buffered between the converter thread and the client.
const BODY_CHANNEL_DEPTH: usize = 16;
const BODY_CHUNK_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServeConfig>,
}

pub fn create_router(config: ServeConfig) -> Router {
    let limit = config.max_upload_bytes;
    Router::new()
        .route("/", get(index_page))
        .route("/convert", post(convert_upload))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(AppState {
            config: Arc::new(config),
        })
}

pub async fn run(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    if config.open_browser {
        let url = config.local_url();
        if let Err(e) = browser::open_url(&url) {
            warn!(%url, error = %e, "could not open browser");
        }
    }

    axum::serve(listener, create_router(config)).await?;
    Ok(())
}

async fn index_page() -> impl IntoResponse {
    Html(INDEX_HTML)
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("please choose an XML file: {0}")]
    Multipart(#[from] MultipartError),

    #[error("please choose an XML file: missing form field `xml`")]
    MissingFile,

    #[error("failed to buffer upload: {0}")]
    Spool(#[from] io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::Multipart(e) => e.status(),
            UploadError::MissingFile => StatusCode::BAD_REQUEST,
            UploadError::Spool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

struct Upload {
    file: std::fs::File,
    row_tag: String,
    bytes: u64,
}

/// Drain the multipart stream; the file part goes to disk, never into memory whole.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, UploadError> {
    let mut spooled: Option<(tokio::fs::File, u64)> = None;
    let mut row_tag = String::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "xml" => {
                let mut file = tokio::fs::File::from_std(tempfile::tempfile()?);
                let mut total = 0u64;
                while let Some(chunk) = field.chunk().await? {
                    file.write_all(&chunk).await?;
                    total += chunk.len() as u64;
                }
                spooled = Some((file, total));
            }
            "rowTag" => row_tag = field.text().await?,
            _ => {}
        }
    }

    let (mut file, bytes) = spooled.ok_or(UploadError::MissingFile)?;
    file.flush().await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(Upload {
        file: file.into_std().await,
        row_tag,
        bytes,
    })
}

async fn convert_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(error = %e, "rejected upload");
            return e.into_response();
        }
    };

    let config = state.config.convert_config(&upload.row_tag);
    info!(row_tag = %config.row_tag, bytes = upload.bytes, "converting upload");

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(BODY_CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || stream_conversion(upload.file, config, tx));

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"result.csv\""),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

/// Runs on the blocking pool. Output is BOM + CRLF CSV for spreadsheet apps.
fn stream_conversion(
    input: std::fs::File,
    config: ConvertConfig,
    tx: mpsc::Sender<io::Result<Bytes>>,
) {
    let body = BufWriter::with_capacity(BODY_CHUNK_BYTES, ChannelWriter::new(tx.clone()));
    let result = SpreadsheetWriter::with_bom(body)
        .map_err(xml2csv_core::Error::from)
        .and_then(|out| StreamingRowConverter::new(config).convert(input, out));

    match result {
        Ok(summary) => info!(
            rows = summary.rows_written,
            columns = summary.columns.len(),
            bytes = summary.bytes_written,
            "conversion streamed"
        ),
        Err(e) => {
            error!(error = %e, "convert error");
            // Status is already committed; abort the body so the client sees a broken download.
            if tx.blocking_send(Err(io::Error::other(e.to_string()))).is_err() {
                debug!("client disconnected before the abort reached it");
            }
        }
    }
}

/// Blocking `Write` adapter feeding the response body channel.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<io::Result<Bytes>>) -> Self {
        Self { tx }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    const BOUNDARY: &str = "xml2csv-test-boundary";

    fn app() -> Router {
        create_router(ServeConfig::default())
    }

    fn multipart_request(xml: Option<&str>, row_tag: Option<&str>) -> Request<Body> {
        let mut body = String::new();
        if let Some(xml) = xml {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"xml\"; filename=\"feed.xml\"\r\nContent-Type: text/xml\r\n\r\n{xml}\r\n"
            ));
        }
        if let Some(tag) = row_tag {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"rowTag\"\r\n\r\n{tag}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method(Method::POST)
            .uri("/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_upload_form() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("name=\"xml\""));
        assert!(html.contains("name=\"rowTag\""));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let resp = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn convert_requires_post() {
        let resp = app()
            .oneshot(Request::builder().uri("/convert").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn convert_streams_excel_friendly_csv() {
        let xml = "<root><record><x>a</x><y>b</y></record></root>";
        let resp = app()
            .oneshot(multipart_request(Some(xml), Some(" record ")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"result.csv\""
        );
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"\xEF\xBB\xBFx,y\r\na,b\r\n");
    }

    #[tokio::test]
    async fn blank_row_tag_defaults_to_item() {
        let xml = "<root><item><a>1</a></item></root>";
        let resp = app()
            .oneshot(multipart_request(Some(xml), Some("")))
            .await
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"\xEF\xBB\xBFa\r\n1\r\n");
    }

    #[tokio::test]
    async fn missing_file_is_bad_request() {
        let resp = app()
            .oneshot(multipart_request(None, Some("item")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_xml_aborts_body() {
        let xml = "<root><item><a>1</a></item><item><a>2</b></item></root>";
        let resp = app()
            .oneshot(multipart_request(Some(xml), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await;
        assert!(body.is_err());
    }

    #[test]
    fn channel_writer_reports_disconnect() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut w = ChannelWriter::new(tx);
        let err = w.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}

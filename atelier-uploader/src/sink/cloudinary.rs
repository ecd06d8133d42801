/// Cloudinary upload sink
///
/// Each chunk is a signed multipart POST to
/// `https://api.cloudinary.com/v1_1/<cloud>/<resource_type>/upload` with the
/// fields `file`, `api_key`, `timestamp`, `signature` and `folder`. When a
/// file needs more than one request, every request also carries
/// `chunk_number` and `total_chunks` plus the `X-Unique-Upload-Id` and
/// `Content-Range` headers Cloudinary uses to join the pieces.
///
/// The signature bundle comes from the API (`POST /v1/media/sign`), so the
/// API secret never leaves the server.

use super::{Chunk, ChunkSink};
use crate::uploader::{UploadError, UploadResult};
use async_trait::async_trait;
use atelier_shared::cloudinary::SignatureBundle;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Per-chunk request timeout
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub const UPLOAD_ID_HEADER: &str = "X-Unique-Upload-Id";

pub const CONTENT_RANGE_HEADER: &str = "Content-Range";

pub struct CloudinarySink {
    client: reqwest::Client,
    bundle: SignatureBundle,
    upload_url: String,
    timeout: Duration,
}

impl CloudinarySink {
    /// `resource_type` is one of `image`, `video`, `raw` or `auto`
    pub fn new(client: reqwest::Client, bundle: SignatureBundle, resource_type: &str) -> Self {
        let upload_url = bundle.upload_url(resource_type);
        CloudinarySink {
            client,
            bundle,
            upload_url,
            timeout: DEFAULT_CHUNK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends chunks somewhere other than the Cloudinary API host
    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = upload_url.into();
        self
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Text fields sent alongside the file part
    pub fn form_fields(&self, chunk: &Chunk) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("api_key", self.bundle.api_key.clone()),
            ("timestamp", self.bundle.timestamp.to_string()),
            ("signature", self.bundle.signature.clone()),
        ];

        if let Some(folder) = &self.bundle.folder {
            fields.push(("folder", folder.clone()));
        }

        if chunk.is_chunked() {
            fields.push(("chunk_number", chunk.number().to_string()));
            fields.push(("total_chunks", chunk.total_chunks.to_string()));
        }

        fields
    }

    fn form(&self, chunk: Chunk) -> Form {
        let fields = self.form_fields(&chunk);
        let len = chunk.data.len() as u64;
        let file = Part::stream_with_length(chunk.data, len).file_name(chunk.filename);

        fields
            .into_iter()
            .fold(Form::new().part("file", file), |form, (name, value)| {
                form.text(name, value)
            })
    }
}

/// Headers that tie the chunks of one upload together
pub fn chunk_headers(chunk: &Chunk) -> Vec<(&'static str, String)> {
    if !chunk.is_chunked() {
        return Vec::new();
    }

    vec![
        (UPLOAD_ID_HEADER, chunk.upload_id.clone()),
        (CONTENT_RANGE_HEADER, chunk.content_range.clone()),
    ]
}

#[async_trait]
impl ChunkSink for CloudinarySink {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn send_chunk(&self, chunk: Chunk) -> UploadResult<JsonValue> {
        let number = chunk.number();
        let headers = chunk_headers(&chunk);

        let request = headers.into_iter().fold(
            self.client
                .post(&self.upload_url)
                .timeout(self.timeout)
                .multipart(self.form(chunk)),
            |request, (name, value)| request.header(name, value),
        );

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UploadError::Timeout { chunk: number }
            } else {
                UploadError::Http {
                    chunk: number,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                chunk: number,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| UploadError::InvalidResponse {
                chunk: number,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn bundle(folder: Option<&str>) -> SignatureBundle {
        SignatureBundle {
            timestamp: 1_700_000_000,
            signature: "abc123".to_string(),
            api_key: "key".to_string(),
            cloud_name: "atelier".to_string(),
            folder: folder.map(String::from),
        }
    }

    fn chunk(index: u64, total_chunks: u64) -> Chunk {
        Chunk {
            index,
            total_chunks,
            file_size: 25,
            upload_id: "u1".to_string(),
            filename: "reel.mp4".to_string(),
            content_range: "bytes 10-19/25".to_string(),
            data: Bytes::from_static(b"0123456789"),
        }
    }

    #[test]
    fn test_upload_url_uses_resource_type() {
        let sink = CloudinarySink::new(reqwest::Client::new(), bundle(None), "video");
        assert_eq!(
            sink.upload_url(),
            "https://api.cloudinary.com/v1_1/atelier/video/upload"
        );
    }

    #[test]
    fn test_single_request_has_no_chunk_fields() {
        let sink = CloudinarySink::new(reqwest::Client::new(), bundle(Some("reels")), "auto");
        let fields = sink.form_fields(&chunk(0, 1));

        assert_eq!(
            fields,
            vec![
                ("api_key", "key".to_string()),
                ("timestamp", "1700000000".to_string()),
                ("signature", "abc123".to_string()),
                ("folder", "reels".to_string()),
            ]
        );
        assert!(chunk_headers(&chunk(0, 1)).is_empty());
    }

    #[test]
    fn test_chunked_request_fields_and_headers() {
        let sink = CloudinarySink::new(reqwest::Client::new(), bundle(None), "auto");
        let fields = sink.form_fields(&chunk(1, 3));

        assert!(fields.contains(&("chunk_number", "2".to_string())));
        assert!(fields.contains(&("total_chunks", "3".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "folder"));

        assert_eq!(
            chunk_headers(&chunk(1, 3)),
            vec![
                ("X-Unique-Upload-Id", "u1".to_string()),
                ("Content-Range", "bytes 10-19/25".to_string()),
            ]
        );
    }

    /// Local endpoint that answers with what it received
    async fn echo_server() -> String {
        use axum::{extract::Multipart, http::HeaderMap, routing::post, Json, Router};

        async fn echo(headers: HeaderMap, mut multipart: Multipart) -> Json<JsonValue> {
            let mut received = serde_json::Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                if name == "file" {
                    received.insert("filename".into(), field.file_name().map(String::from).into());
                    let data = field.bytes().await.unwrap();
                    received.insert("file".into(), String::from_utf8_lossy(&data).into_owned().into());
                } else {
                    received.insert(name, field.text().await.unwrap().into());
                }
            }

            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(String::from)
            };
            received.insert("upload_id".into(), header(UPLOAD_ID_HEADER).into());
            received.insert("content_range".into(), header(CONTENT_RANGE_HEADER).into());

            Json(JsonValue::Object(received))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/upload", post(echo)))
                .await
                .unwrap();
        });

        format!("http://{}/upload", addr)
    }

    #[tokio::test]
    async fn test_chunk_is_posted_as_multipart() {
        let sink = CloudinarySink::new(reqwest::Client::new(), bundle(Some("reels")), "video")
            .with_upload_url(echo_server().await);

        let body = sink.send_chunk(chunk(1, 3)).await.unwrap();

        assert_eq!(body["file"], "0123456789");
        assert_eq!(body["filename"], "reel.mp4");
        assert_eq!(body["signature"], "abc123");
        assert_eq!(body["folder"], "reels");
        assert_eq!(body["chunk_number"], "2");
        assert_eq!(body["total_chunks"], "3");
        assert_eq!(body["upload_id"], "u1");
        assert_eq!(body["content_range"], "bytes 10-19/25");
    }

    #[tokio::test]
    async fn test_single_request_sends_no_chunk_headers() {
        let sink = CloudinarySink::new(reqwest::Client::new(), bundle(None), "auto")
            .with_upload_url(echo_server().await);

        let body = sink.send_chunk(chunk(0, 1)).await.unwrap();

        assert_eq!(body["file"], "0123456789");
        assert!(body["upload_id"].is_null());
        assert!(body.get("chunk_number").is_none());
    }
}

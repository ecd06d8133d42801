/// In-memory sink for tests
///
/// Records every accepted chunk and answers with a Cloudinary-shaped JSON
/// body. It can be told to reject a given chunk or to fire a cancellation
/// token once a number of chunks have been accepted.

use super::{Chunk, ChunkSink};
use crate::uploader::{UploadError, UploadResult};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// What the mock saw for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChunk {
    pub number: u64,
    pub total_chunks: u64,
    pub len: usize,
    pub upload_id: String,
    pub content_range: String,
    pub chunked: bool,
}

#[derive(Default)]
pub struct MockSink {
    chunks: Mutex<Vec<RecordedChunk>>,
    received: Mutex<Vec<u8>>,
    fail_at: Option<u64>,
    cancel_after: Option<(u64, CancellationToken)>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects chunk `number` (1-based) with a 500
    pub fn fail_at(mut self, number: u64) -> Self {
        self.fail_at = Some(number);
        self
    }

    /// Cancels `token` after chunk `number` (1-based) is accepted
    pub fn cancel_after(mut self, number: u64, token: CancellationToken) -> Self {
        self.cancel_after = Some((number, token));
        self
    }

    pub fn chunks(&self) -> Vec<RecordedChunk> {
        self.chunks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Concatenated bytes of all accepted chunks
    pub fn received(&self) -> Vec<u8> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChunkSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_chunk(&self, chunk: Chunk) -> UploadResult<JsonValue> {
        if self.fail_at == Some(chunk.number()) {
            return Err(UploadError::Rejected {
                chunk: chunk.number(),
                status: 500,
                body: "simulated failure".to_string(),
            });
        }

        let received = {
            let mut buf = self.received.lock().map_err(|_| UploadError::Http {
                chunk: chunk.number(),
                message: "mock state poisoned".to_string(),
            })?;
            buf.extend_from_slice(&chunk.data);
            buf.len()
        };

        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(RecordedChunk {
                number: chunk.number(),
                total_chunks: chunk.total_chunks,
                len: chunk.data.len(),
                upload_id: chunk.upload_id.clone(),
                content_range: chunk.content_range.clone(),
                chunked: chunk.is_chunked(),
            });
        }

        if let Some((after, token)) = &self.cancel_after {
            if chunk.number() == *after {
                token.cancel();
            }
        }

        Ok(serde_json::json!({
            "public_id": format!("mock/{}", chunk.upload_id),
            "original_filename": chunk.filename,
            "chunk_number": chunk.number(),
            "done": chunk.is_last(),
            "bytes": received,
        }))
    }
}

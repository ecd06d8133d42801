/// Upload sinks
///
/// A sink receives the chunks of one file in order and returns the remote's
/// JSON response for each. The response to the last chunk is the finished
/// asset.
///
/// - **Cloudinary**: signed multipart POSTs to the Cloudinary upload API
/// - **Mock**: records chunks in memory for tests

pub mod cloudinary;
pub mod mock;

use crate::uploader::UploadResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value as JsonValue;

pub use cloudinary::CloudinarySink;
pub use mock::MockSink;

/// One byte range of the file, ready to send
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based position in the file
    pub index: u64,
    pub total_chunks: u64,
    pub file_size: u64,
    /// Shared by every chunk of one upload
    pub upload_id: String,
    pub filename: String,
    /// `bytes start-end/total`
    pub content_range: String,
    pub data: Bytes,
}

impl Chunk {
    /// 1-based chunk number
    pub fn number(&self) -> u64 {
        self.index + 1
    }

    pub fn is_last(&self) -> bool {
        self.number() == self.total_chunks
    }

    /// True when the file is split across several requests
    pub fn is_chunked(&self) -> bool {
        self.total_chunks > 1
    }
}

#[async_trait]
pub trait ChunkSink: Send + Sync {
    fn name(&self) -> &str;

    /// Sends one chunk and returns the parsed response body
    ///
    /// Any non-success status must be returned as an error.
    async fn send_chunk(&self, chunk: Chunk) -> UploadResult<JsonValue>;
}

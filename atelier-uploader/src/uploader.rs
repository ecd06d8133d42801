/// Sequential chunked uploads
///
/// A file of `S` bytes is cut into `ceil(S / K)` chunks of `K` bytes (see
/// [`ChunkPlan`]) and each chunk is handed to a [`ChunkSink`] in order. After
/// every accepted chunk a [`UploadEvent::Progress`] is emitted; the response
/// to the last chunk is the finished asset.
///
/// There is no retry and no resume: the first failed chunk aborts the
/// upload. Cancellation is checked before each chunk, so a chunk already in
/// flight is allowed to finish.
///
/// # Example
///
/// ```no_run
/// use atelier_uploader::{ChunkedUploader, MockSink};
/// use atelier_shared::chunking::ChunkProfile;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let uploader = ChunkedUploader::with_profile(MockSink::new(), ChunkProfile::Video);
/// let (tx, mut rx) = mpsc::unbounded_channel();
///
/// let asset = uploader
///     .upload("reel.mp4".as_ref(), tx, CancellationToken::new())
///     .await?;
///
/// while let Some(event) = rx.recv().await {
///     println!("{}", event);
/// }
/// println!("{}", asset);
/// # Ok(())
/// # }
/// ```

use crate::events::UploadEvent;
use crate::sink::{Chunk, ChunkSink};
use atelier_shared::chunking::{ChunkError, ChunkPlan, ChunkProfile};
use bytes::Bytes;
use serde_json::Value as JsonValue;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error("Request for chunk {chunk} failed: {message}")]
    Http { chunk: u64, message: String },

    #[error("Chunk {chunk} timed out")]
    Timeout { chunk: u64 },

    #[error("Chunk {chunk} rejected with status {status}: {body}")]
    Rejected { chunk: u64, status: u16, body: String },

    #[error("Invalid response for chunk {chunk}: {message}")]
    InvalidResponse { chunk: u64, message: String },

    #[error("Upload cancelled")]
    Cancelled,
}

pub type UploadResult<T> = Result<T, UploadError>;

pub struct ChunkedUploader<S> {
    sink: S,
    chunk_size: u64,
}

impl<S: ChunkSink> ChunkedUploader<S> {
    pub fn new(sink: S, chunk_size: u64) -> Self {
        ChunkedUploader { sink, chunk_size }
    }

    pub fn with_profile(sink: S, profile: ChunkProfile) -> Self {
        Self::new(sink, profile.chunk_size())
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Uploads `path` and returns the asset descriptor from the last chunk
    ///
    /// Emits `Started`, one `Progress` per chunk, then `Completed` or
    /// `Failed`. A closed event channel does not stop the upload.
    ///
    /// # Errors
    ///
    /// - [`UploadError::Io`]: The file could not be opened or read
    /// - [`UploadError::Cancelled`]: `cancel` fired between chunks
    /// - Any error the sink returns for a chunk
    pub async fn upload(
        &self,
        path: &Path,
        events: mpsc::UnboundedSender<UploadEvent>,
        cancel: CancellationToken,
    ) -> UploadResult<JsonValue> {
        match self.run(path, &events, &cancel).await {
            Ok(asset) => {
                emit(
                    &events,
                    UploadEvent::Completed {
                        asset: asset.clone(),
                    },
                );
                Ok(asset)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), sink = self.sink.name(), error = %err, "Upload failed");
                emit(
                    &events,
                    UploadEvent::Failed {
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        path: &Path,
        events: &mpsc::UnboundedSender<UploadEvent>,
        cancel: &CancellationToken,
    ) -> UploadResult<JsonValue> {
        let mut file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        let plan = ChunkPlan::new(file_size, self.chunk_size)?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let upload_id = Uuid::new_v4().simple().to_string();

        tracing::info!(
            filename = %filename,
            file_size,
            chunk_size = self.chunk_size,
            total_chunks = plan.total_chunks(),
            sink = self.sink.name(),
            "Upload starting"
        );

        emit(
            events,
            UploadEvent::Started {
                filename: filename.clone(),
                file_size,
                total_chunks: plan.total_chunks(),
            },
        );

        let mut asset = JsonValue::Null;

        for index in 0..plan.total_chunks() {
            if cancel.is_cancelled() {
                tracing::info!(filename = %filename, chunk = index + 1, "Upload cancelled");
                return Err(UploadError::Cancelled);
            }

            let data = read_range(&mut file, &plan, index).await?;

            let chunk = Chunk {
                index,
                total_chunks: plan.total_chunks(),
                file_size,
                upload_id: upload_id.clone(),
                filename: filename.clone(),
                content_range: plan.content_range(index)?,
                data,
            };

            asset = self.sink.send_chunk(chunk).await?;

            let completed = index + 1;
            let percent = plan.progress_percent(completed);
            tracing::debug!(chunk = completed, total_chunks = plan.total_chunks(), percent, "Chunk sent");

            emit(
                events,
                UploadEvent::Progress {
                    chunk: completed,
                    total_chunks: plan.total_chunks(),
                    percent,
                },
            );
        }

        tracing::info!(filename = %filename, upload_id = %upload_id, "Upload complete");
        Ok(asset)
    }
}

async fn read_range(file: &mut File, plan: &ChunkPlan, index: u64) -> UploadResult<Bytes> {
    let range = plan.range(index)?;
    let mut buf = vec![0u8; (range.end - range.start) as usize];

    file.seek(SeekFrom::Start(range.start)).await?;
    file.read_exact(&mut buf).await?;

    Ok(Bytes::from(buf))
}

fn emit(events: &mpsc::UnboundedSender<UploadEvent>, event: UploadEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Upload event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MockSink;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(size: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();
        file
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn progress(events: &[UploadEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_request_count_is_ceiling_of_size_over_chunk() {
        let file = temp_file(2500);
        let uploader = ChunkedUploader::new(MockSink::new(), 1000);
        let (tx, rx) = mpsc::unbounded_channel();

        let asset = uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap();

        let chunks = uploader.sink().chunks();
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(|c| c.len).collect::<Vec<_>>(),
            vec![1000, 1000, 500]
        );
        assert_eq!(chunks[2].content_range, "bytes 2000-2499/2500");
        assert!(chunks.iter().all(|c| c.upload_id == chunks[0].upload_id));
        assert_eq!(uploader.sink().received(), std::fs::read(file.path()).unwrap());

        assert_eq!(asset["bytes"], 2500);
        assert_eq!(asset["chunk_number"], 3);

        let events = drain(rx);
        assert_eq!(progress(&events), vec![40, 80, 100]);
        assert_eq!(events.first().unwrap().kind(), "started");
        assert_eq!(events.last().unwrap(), &UploadEvent::Completed { asset });
    }

    #[tokio::test]
    async fn test_progress_is_rounded() {
        let file = temp_file(3);
        let uploader = ChunkedUploader::new(MockSink::new(), 1);
        let (tx, rx) = mpsc::unbounded_channel();

        uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(progress(&drain(rx)), vec![33, 67, 100]);
    }

    #[tokio::test]
    async fn test_small_file_is_single_request() {
        let file = temp_file(10);
        let uploader = ChunkedUploader::new(MockSink::new(), 1024);
        let (tx, rx) = mpsc::unbounded_channel();

        uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(uploader.sink().chunks().len(), 1);
        assert!(!uploader.sink().chunks()[0].chunked);
        assert_eq!(progress(&drain(rx)), vec![100]);
    }

    #[tokio::test]
    async fn test_empty_file_sends_one_empty_chunk() {
        let file = temp_file(0);
        let uploader = ChunkedUploader::new(MockSink::new(), 1024);
        let (tx, rx) = mpsc::unbounded_channel();

        uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap();

        let chunks = uploader.sink().chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len, 0);
        assert_eq!(progress(&drain(rx)), vec![100]);
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_upload() {
        let file = temp_file(5000);
        let uploader = ChunkedUploader::new(MockSink::new().fail_at(2), 1000);
        let (tx, rx) = mpsc::unbounded_channel();

        let err = uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Rejected { chunk: 2, status: 500, .. }));
        assert_eq!(uploader.sink().chunks().len(), 1);

        let events = drain(rx);
        assert_eq!(progress(&events), vec![20]);
        assert!(matches!(events.last(), Some(UploadEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_chunk() {
        let file = temp_file(4000);
        let cancel = CancellationToken::new();
        let sink = MockSink::new().cancel_after(2, cancel.clone());
        let uploader = ChunkedUploader::new(sink, 1000);
        let (tx, rx) = mpsc::unbounded_channel();

        let err = uploader.upload(file.path(), tx, cancel).await.unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
        assert_eq!(uploader.sink().chunks().len(), 2);

        let events = drain(rx);
        assert_eq!(progress(&events), vec![25, 50]);
        assert_eq!(
            events.last(),
            Some(&UploadEvent::Failed {
                error: "Upload cancelled".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let uploader = ChunkedUploader::new(MockSink::new(), 1000);
        let (tx, rx) = mpsc::unbounded_channel();

        let err = uploader
            .upload(Path::new("/nonexistent/reel.mp4"), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Io(_)));
        assert!(uploader.sink().chunks().is_empty());
        assert_eq!(drain(rx).len(), 1);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let file = temp_file(10);
        let uploader = ChunkedUploader::new(MockSink::new(), 0);
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Chunk(ChunkError::ZeroChunkSize)));
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stop_upload() {
        let file = temp_file(2000);
        let uploader = ChunkedUploader::new(MockSink::new(), 1000);
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        uploader
            .upload(file.path(), tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(uploader.sink().chunks().len(), 2);
    }

    #[test]
    fn test_profile_chunk_sizes() {
        let video = ChunkedUploader::with_profile(MockSink::new(), ChunkProfile::Video);
        assert_eq!(video.chunk_size(), 100 * 1024 * 1024);

        let media = ChunkedUploader::with_profile(MockSink::new(), ChunkProfile::Media);
        assert_eq!(media.chunk_size(), 10 * 1024 * 1024);
    }
}

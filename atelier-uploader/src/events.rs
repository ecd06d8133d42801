/// Upload progress events
///
/// Emitted over an unbounded channel while a file is uploaded:
///
/// ```text
/// ChunkedUploader::upload()
///   ├─> Started
///   ├─> Progress (once per chunk)
///   ├─> Completed on success
///   └─> Failed on error or cancellation
/// ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadEvent {
    /// Emitted before the first chunk is read
    Started {
        filename: String,
        file_size: u64,
        total_chunks: u64,
    },

    /// Emitted after each chunk is accepted
    Progress {
        /// 1-based number of the chunk just sent
        chunk: u64,
        total_chunks: u64,
        percent: u8,
    },

    /// Final asset descriptor returned by the remote
    Completed { asset: JsonValue },

    Failed { error: String },
}

impl UploadEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            UploadEvent::Started { .. } => "started",
            UploadEvent::Progress { .. } => "progress",
            UploadEvent::Completed { .. } => "completed",
            UploadEvent::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Completed { .. } | UploadEvent::Failed { .. })
    }
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadEvent::Started {
                filename,
                file_size,
                total_chunks,
            } => write!(
                f,
                "uploading {} ({} bytes, {} chunks)",
                filename, file_size, total_chunks
            ),
            UploadEvent::Progress {
                chunk,
                total_chunks,
                percent,
            } => write!(f, "chunk {}/{} sent ({}%)", chunk, total_chunks, percent),
            UploadEvent::Completed { .. } => write!(f, "upload complete"),
            UploadEvent::Failed { error } => write!(f, "upload failed: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = UploadEvent::Progress {
            chunk: 2,
            total_chunks: 3,
            percent: 80,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["percent"], 80);

        let back: UploadEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_terminal_events() {
        assert!(!UploadEvent::Progress {
            chunk: 1,
            total_chunks: 1,
            percent: 100
        }
        .is_terminal());
        assert!(UploadEvent::Failed {
            error: "boom".into()
        }
        .is_terminal());
        assert_eq!(
            UploadEvent::Completed {
                asset: serde_json::json!({})
            }
            .kind(),
            "completed"
        );
    }

    #[test]
    fn test_display() {
        let event = UploadEvent::Started {
            filename: "reel.mp4".into(),
            file_size: 250,
            total_chunks: 3,
        };
        assert_eq!(event.to_string(), "uploading reel.mp4 (250 bytes, 3 chunks)");
    }
}

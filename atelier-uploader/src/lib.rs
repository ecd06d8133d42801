//! # Atelier Uploader
//!
//! Client for large media uploads. Files are split into fixed-size chunks
//! and sent one after another to a [`sink::ChunkSink`], with progress
//! reported over a channel.
//!
//! ## Modules
//!
//! - `uploader`: The chunk loop, errors and cancellation
//! - `sink`: Upload targets (Cloudinary, mock)
//! - `events`: Progress events

pub mod events;
pub mod sink;
pub mod uploader;

pub use events::UploadEvent;
pub use sink::{ChunkSink, CloudinarySink, MockSink};
pub use uploader::{ChunkedUploader, UploadError, UploadResult};

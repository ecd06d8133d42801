/// Chunk planning for large uploads
///
/// A file of `S` bytes uploaded in chunks of `K` bytes is sent as
/// `ceil(S / K)` sequential requests; chunk `i` (0-based) covers
/// `[i*K, min((i+1)*K, S))`. An empty file is sent as one empty chunk.
///
/// Progress after chunk `n` (1-based) is `round(min(n*K, S) / S * 100)`,
/// so it never exceeds 100 and is exactly 100 after the last chunk.
///
/// # Example
///
/// ```
/// use atelier_shared::chunking::{ChunkPlan, MEDIA_CHUNK_SIZE};
///
/// let plan = ChunkPlan::new(25 * 1024 * 1024, MEDIA_CHUNK_SIZE).unwrap();
/// assert_eq!(plan.total_chunks(), 3);
/// assert_eq!(plan.progress_percent(1), 40);
/// assert_eq!(plan.progress_percent(3), 100);
/// ```

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Chunk size for video uploads (100 MiB)
pub const VIDEO_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Chunk size for general media uploads (10 MiB)
pub const MEDIA_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("Chunk {index} out of range (file has {total} chunks)")]
    OutOfRange { index: u64, total: u64 },

    #[error("Unknown chunk profile: {0} (expected 'video' or 'media')")]
    UnknownProfile(String),
}

/// Named chunk sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkProfile {
    Video,
    #[default]
    Media,
}

impl ChunkProfile {
    pub fn chunk_size(&self) -> u64 {
        match self {
            ChunkProfile::Video => VIDEO_CHUNK_SIZE,
            ChunkProfile::Media => MEDIA_CHUNK_SIZE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkProfile::Video => "video",
            ChunkProfile::Media => "media",
        }
    }
}

impl fmt::Display for ChunkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkProfile {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(ChunkProfile::Video),
            "media" => Ok(ChunkProfile::Media),
            other => Err(ChunkError::UnknownProfile(other.to_string())),
        }
    }
}

/// Byte ranges and progress values for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    total_chunks: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }

        let total_chunks = if file_size == 0 {
            1
        } else {
            file_size.div_ceil(chunk_size)
        };

        Ok(ChunkPlan {
            file_size,
            chunk_size,
            total_chunks,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// True when the file needs more than one request
    pub fn is_chunked(&self) -> bool {
        self.total_chunks > 1
    }

    /// Byte range of chunk `index` (0-based)
    pub fn range(&self, index: u64) -> Result<Range<u64>, ChunkError> {
        if index >= self.total_chunks {
            return Err(ChunkError::OutOfRange {
                index,
                total: self.total_chunks,
            });
        }

        let start = index * self.chunk_size;
        let end = (start + self.chunk_size).min(self.file_size);
        Ok(start..end)
    }

    /// All chunk ranges in upload order
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.total_chunks).map(move |i| {
            let start = i * self.chunk_size;
            start..(start + self.chunk_size).min(self.file_size)
        })
    }

    /// Progress percentage after `completed` chunks (1-based count)
    pub fn progress_percent(&self, completed: u64) -> u8 {
        if self.file_size == 0 {
            return if completed == 0 { 0 } else { 100 };
        }

        let done = completed.saturating_mul(self.chunk_size).min(self.file_size);
        ((done as f64 / self.file_size as f64) * 100.0).round() as u8
    }

    /// `Content-Range` header value for chunk `index`
    ///
    /// Uses the inclusive `bytes start-end/total` form.
    pub fn content_range(&self, index: u64) -> Result<String, ChunkError> {
        let range = self.range(index)?;
        let last = range.end.saturating_sub(1).max(range.start);
        Ok(format!("bytes {}-{}/{}", range.start, last, self.file_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_total_chunks_is_ceiling() {
        assert_eq!(ChunkPlan::new(10, 5).unwrap().total_chunks(), 2);
        assert_eq!(ChunkPlan::new(11, 5).unwrap().total_chunks(), 3);
        assert_eq!(ChunkPlan::new(4, 5).unwrap().total_chunks(), 1);
        assert_eq!(
            ChunkPlan::new(250 * MIB, VIDEO_CHUNK_SIZE).unwrap().total_chunks(),
            3
        );
    }

    #[test]
    fn test_empty_file_is_one_chunk() {
        let plan = ChunkPlan::new(0, MEDIA_CHUNK_SIZE).unwrap();
        assert_eq!(plan.total_chunks(), 1);
        assert_eq!(plan.range(0).unwrap(), 0..0);
        assert_eq!(plan.progress_percent(1), 100);
        assert!(!plan.is_chunked());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(ChunkPlan::new(10, 0), Err(ChunkError::ZeroChunkSize));
    }

    #[test]
    fn test_ranges_cover_file() {
        let plan = ChunkPlan::new(11, 5).unwrap();
        let ranges: Vec<_> = plan.ranges().collect();
        assert_eq!(ranges, vec![0..5, 5..10, 10..11]);
        assert_eq!(plan.range(2).unwrap(), 10..11);
        assert!(matches!(
            plan.range(3),
            Err(ChunkError::OutOfRange { index: 3, total: 3 })
        ));
    }

    #[test]
    fn test_progress_is_rounded_and_capped() {
        let plan = ChunkPlan::new(250 * MIB, VIDEO_CHUNK_SIZE).unwrap();
        assert_eq!(plan.progress_percent(1), 40);
        assert_eq!(plan.progress_percent(2), 80);
        assert_eq!(plan.progress_percent(3), 100);
        assert_eq!(plan.progress_percent(4), 100);

        let plan = ChunkPlan::new(3, 1).unwrap();
        assert_eq!(plan.progress_percent(1), 33);
        assert_eq!(plan.progress_percent(2), 67);
    }

    #[test]
    fn test_content_range_inclusive() {
        let plan = ChunkPlan::new(11, 5).unwrap();
        assert_eq!(plan.content_range(0).unwrap(), "bytes 0-4/11");
        assert_eq!(plan.content_range(2).unwrap(), "bytes 10-10/11");
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("video".parse::<ChunkProfile>().unwrap(), ChunkProfile::Video);
        assert_eq!("MEDIA".parse::<ChunkProfile>().unwrap(), ChunkProfile::Media);
        assert!("audio".parse::<ChunkProfile>().is_err());
        assert_eq!(ChunkProfile::Video.chunk_size(), 100 * MIB);
        assert_eq!(ChunkProfile::Media.chunk_size(), 10 * MIB);
    }
}

//! TranscriptStore trait for abstracting transcript persistence.
//!
//! Defined in writers-room-core so the director can save transcripts without
//! depending on any specific filesystem implementation. The
//! `LocalTranscriptStore` adapter lives in writers-room-infra.

use std::path::Path;

/// Destination for rendered transcripts.
///
/// Lets the director persist transcripts without coupling to the real
/// filesystem, so tests can use an in-memory implementation.
pub trait TranscriptStore: Send + Sync {
    /// Write the full transcript text to `path`, replacing any previous
    /// content and creating parent directories as needed.
    fn write_transcript(
        &self,
        path: &Path,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;
}

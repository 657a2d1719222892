//! Filesystem adapters for the Writers' Room.
//!
//! - [`LocalTranscriptStore`]: the `TranscriptStore` port over `tokio::fs`
//! - [`character`] / [`scene`]: read-only YAML loaders
//! - [`resolve_config_dir`]: where `writers_room.toml` is looked up

pub mod character;
pub mod scene;

use std::path::{Path, PathBuf};

use writers_room_core::storage::TranscriptStore;

pub use character::{load_catalog, load_character};
pub use scene::{discover_scenes, load_scene};

/// Transcript store writing plain files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTranscriptStore;

impl LocalTranscriptStore {
    pub fn new() -> Self {
        Self
    }
}

impl TranscriptStore for LocalTranscriptStore {
    async fn write_transcript(&self, path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    }
}

/// Whether `path` looks like a YAML document.
pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Resolve the configuration directory.
///
/// Priority:
/// 1. `WRITERS_ROOM_CONFIG_DIR` environment variable
/// 2. Platform config directory (e.g. `~/.config/writers-room` on Linux)
/// 3. `.writers-room` in the current directory
pub fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WRITERS_ROOM_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(config) = dirs::config_dir() {
        return config.join("writers-room");
    }

    PathBuf::from(".writers-room")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_transcript_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = LocalTranscriptStore::new();
        let path = dir.path().join("transcripts").join("week_1").join("closing_time.txt");

        store
            .write_transcript(&path, "Alice: We're closed.\n")
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "Alice: We're closed.\n");
    }

    #[tokio::test]
    async fn test_write_transcript_overwrites() {
        let dir = tempdir().unwrap();
        let store = LocalTranscriptStore::new();
        let path = dir.path().join("scene.txt");

        store.write_transcript(&path, "old\n").await.unwrap();
        store.write_transcript(&path, "new\n").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "new\n");
    }

    #[test]
    fn test_is_yaml() {
        assert!(is_yaml(Path::new("a/alice.yml")));
        assert!(is_yaml(Path::new("bob.yaml")));
        assert!(!is_yaml(Path::new("notes.md")));
        assert!(!is_yaml(Path::new("README")));
    }
}

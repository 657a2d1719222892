//! Character profile loading.
//!
//! One YAML document per character:
//! ```yaml
//! name: Alice
//! age: 34
//! personality: Guarded, dry wit
//! voice_pattern: Short sentences, never says sorry
//! relationships:
//!   Bob: estranged brother
//! current_arc: Learning to forgive
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use writers_room_types::character::{CharacterCatalog, CharacterProfile};
use writers_room_types::error::LoadError;

use super::is_yaml;

pub async fn load_character(path: &Path) -> Result<CharacterProfile, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    parse_character(path, &content)
}

fn parse_character(path: &Path, content: &str) -> Result<CharacterProfile, LoadError> {
    let profile: CharacterProfile =
        serde_yaml_ng::from_str(content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if profile.name.trim().is_empty() {
        return Err(LoadError::Parse {
            path: path.to_path_buf(),
            message: "character name is empty".to_string(),
        });
    }
    if !CharacterProfile::is_valid_name(&profile.name) {
        return Err(LoadError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "character name '{}' must be a single word of letters, digits or underscores",
                profile.name
            ),
        });
    }
    Ok(profile)
}

/// Load every `*.yml` / `*.yaml` file in `dir` into a name-keyed catalog.
///
/// An unreadable directory or file is an error. When two files declare the
/// same name, the later one in sorted path order wins.
pub async fn load_catalog(dir: &Path) -> Result<CharacterCatalog, LoadError> {
    let mut catalog = CharacterCatalog::new();
    for path in yaml_files(dir).await? {
        let profile = load_character(&path).await?;
        debug!(name = %profile.name, path = %path.display(), "Loaded character");
        if let Some(previous) = catalog.insert(profile) {
            warn!(name = %previous.name, path = %path.display(), "Duplicate character name, replacing earlier profile");
        }
    }
    Ok(catalog)
}

/// YAML files directly inside `dir`, sorted by path.
pub(crate) async fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |e: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if is_yaml(&path) && entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

//! Scene definition loading.
//!
//! ```yaml
//! scene_id: s01
//! scene_name: Closing Time
//! location: The diner
//! week: 1
//! characters: [Alice, Bob]
//! objectives:
//!   Alice: Get Bob to leave
//! context: Rain outside. The last bus left ten minutes ago.
//! ```

use std::path::{Path, PathBuf};

use writers_room_types::error::LoadError;
use writers_room_types::scene::SceneDefinition;

use super::character::yaml_files;

pub async fn load_scene(path: &Path) -> Result<SceneDefinition, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    serde_yaml_ng::from_str(&content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Scene files in `dir`, in sorted path order. An empty directory is an error.
pub async fn discover_scenes(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let files = yaml_files(dir).await?;
    if files.is_empty() {
        return Err(LoadError::NoScenes(dir.to_path_buf()));
    }
    Ok(files)
}

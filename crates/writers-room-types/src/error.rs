use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;

/// Errors that prevent a scene from starting or persisting its transcript.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene '{scene}' references unknown character '{character}'")]
    MissingCharacter { scene: String, character: String },

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scene '{scene}' cannot start while {state}")]
    NotIdle { scene: String, state: String },

    #[error("channel error: {0}")]
    Channel(String),

    #[error("failed to save transcript to {path}: {message}")]
    TranscriptSave { path: PathBuf, message: String },
}

/// Errors from a single dialog generation attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("agent has no scene assigned")]
    NoScene,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("text generation returned no usable dialogue")]
    Empty,
}

impl GenerationError {
    /// Whether another attempt at the same turn could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::NoScene => false,
            GenerationError::Llm(e) => e.is_retryable(),
            GenerationError::Empty => true,
        }
    }
}

/// Errors loading character or scene records from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no scene files found in {0}")]
    NoScenes(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_character_display() {
        let err = SceneError::MissingCharacter {
            scene: "s1".to_string(),
            character: "Dave".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "scene 's1' references unknown character 'Dave'"
        );
    }

    #[test]
    fn test_generation_error_wraps_llm_error() {
        let err: GenerationError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
        assert!(!err.is_retryable());
        assert!(GenerationError::Empty.is_retryable());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Parse {
            path: PathBuf::from("scenes/a.yml"),
            message: "missing field `characters`".to_string(),
        };
        assert!(err.to_string().contains("scenes/a.yml"));
        assert!(err.to_string().contains("characters"));
    }
}

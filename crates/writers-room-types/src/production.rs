//! Scene lifecycle and production result types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Line counts for one scene.
///
/// `total_lines` always equals the sum of `lines_by_character`; the only way
/// to add a line is [`SceneStatistics::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStatistics {
    pub total_lines: usize,
    pub lines_by_character: BTreeMap<String, usize>,
}

impl SceneStatistics {
    pub fn record(&mut self, speaker: &str) {
        *self
            .lines_by_character
            .entry(speaker.to_string())
            .or_insert(0) += 1;
        self.total_lines += 1;
    }

    pub fn lines_for(&self, speaker: &str) -> usize {
        self.lines_by_character.get(speaker).copied().unwrap_or(0)
    }
}

impl<'a> FromIterator<&'a str> for SceneStatistics {
    fn from_iter<I: IntoIterator<Item = &'a str>>(speakers: I) -> Self {
        let mut stats = Self::default();
        for speaker in speakers {
            stats.record(speaker);
        }
        stats
    }
}

/// Why a scene stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SceneOutcome {
    /// Line ceiling reached or the conversation went quiet.
    Normal,
    /// Stopped by `cut()` (operator interrupt or runner).
    Cut,
    /// Repeated generation failures ended the scene.
    Error(String),
}

impl fmt::Display for SceneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneOutcome::Normal => write!(f, "normal"),
            SceneOutcome::Cut => write!(f, "cut"),
            SceneOutcome::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Director state machine: `Idle -> Running -> Stopped(outcome)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneState {
    Idle,
    Running,
    Stopped(SceneOutcome),
}

impl SceneState {
    pub fn is_running(&self) -> bool {
        matches!(self, SceneState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, SceneState::Stopped(_))
    }

    pub fn outcome(&self) -> Option<&SceneOutcome> {
        match self {
            SceneState::Stopped(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneState::Idle => write!(f, "idle"),
            SceneState::Running => write!(f, "running"),
            SceneState::Stopped(outcome) => write!(f, "stopped ({outcome})"),
        }
    }
}

/// Per-scene status reported by the production runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Completed,
    Cut,
    Failed,
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneStatus::Completed => write!(f, "completed"),
            SceneStatus::Cut => write!(f, "cut"),
            SceneStatus::Failed => write!(f, "failed"),
        }
    }
}

impl From<&SceneOutcome> for SceneStatus {
    fn from(outcome: &SceneOutcome) -> Self {
        match outcome {
            SceneOutcome::Normal => SceneStatus::Completed,
            SceneOutcome::Cut => SceneStatus::Cut,
            SceneOutcome::Error(_) => SceneStatus::Failed,
        }
    }
}

/// Outcome record for one scene of a production run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionResult {
    /// Scene identifier, or the source path when the scene failed to load.
    pub scene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    pub statistics: SceneStatistics,
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProductionResult {
    /// A scene that never produced a transcript.
    pub fn failed(scene: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            transcript_path: None,
            statistics: SceneStatistics::default(),
            status: SceneStatus::Failed,
            error: Some(error.into()),
        }
    }
}

//! Event types for the in-process scene event bus.
//!
//! `SceneEvent` carries scene lifecycle notifications from the director and
//! its agents to any subscriber (the director itself, CLI progress output).
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.
//! These never travel over the dialog channel.

use serde::{Deserialize, Serialize};

use crate::production::SceneOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    /// The director is running and every agent is listening.
    SceneStarted {
        scene: String,
        cast: Vec<String>,
        max_lines: usize,
    },

    /// A dialog line was appended to the transcript.
    LineRecorded {
        scene: String,
        speaker: String,
        content: String,
        total_lines: usize,
    },

    /// An agent gave up on a turn after exhausting its retries.
    GenerationFailed {
        scene: String,
        character: String,
        error: String,
        attempts: u32,
    },

    /// The scene reached a terminal state.
    SceneStopped {
        scene: String,
        outcome: SceneOutcome,
        total_lines: usize,
    },
}

impl SceneEvent {
    pub fn scene(&self) -> &str {
        match self {
            SceneEvent::SceneStarted { scene, .. }
            | SceneEvent::LineRecorded { scene, .. }
            | SceneEvent::GenerationFailed { scene, .. }
            | SceneEvent::SceneStopped { scene, .. } => scene,
        }
    }
}

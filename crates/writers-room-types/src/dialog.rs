//! Dialog wire protocol.
//!
//! Two event kinds travel over a named broadcast channel: `DialogEvent` (a
//! line of dialogue) and `ControlEvent` (scene lifecycle commands). Both are
//! wrapped in the `ChannelEvent` envelope, which serializes as JSON with a
//! `type` tag so network brokers can carry it as a plain string payload.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel name used when the operator does not pick one.
pub const DEFAULT_CHANNEL: &str = "writers_room:dialog";

/// One line of dialogue spoken by a character.
///
/// Once published a dialog event is history: it is never edited or retracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogEvent {
    /// Speaker name.
    pub from: String,
    pub content: String,
    /// Scene identifier this line belongs to.
    pub scene: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Character the line is addressed to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addressing: Option<String>,
}

impl DialogEvent {
    /// Whether the line mentions `name` anywhere in its content.
    pub fn mentions(&self, name: &str) -> bool {
        !name.is_empty() && self.content.contains(name)
    }
}

/// Scene lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Start,
    Stop,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Start => write!(f, "start"),
            ControlCommand::Stop => write!(f, "stop"),
        }
    }
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(ControlCommand::Start),
            "stop" => Ok(ControlCommand::Stop),
            other => Err(format!("invalid control command: '{other}'")),
        }
    }
}

/// Director-issued control signal for every agent in a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub scene: String,
    pub command: ControlCommand,
}

/// Envelope for everything carried on a dialog channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Dialog(DialogEvent),
    Control(ControlEvent),
}

impl ChannelEvent {
    /// Scene identifier carried by the event.
    pub fn scene(&self) -> &str {
        match self {
            ChannelEvent::Dialog(d) => &d.scene,
            ChannelEvent::Control(c) => &c.scene,
        }
    }

    /// Check the fields every consumer relies on.
    ///
    /// Events failing this check are dropped at the receiving boundary.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ChannelEvent::Dialog(d) => {
                if d.from.trim().is_empty() {
                    return Err("dialog event without speaker".to_string());
                }
                if d.scene.trim().is_empty() {
                    return Err(format!("dialog event from {} without scene", d.from));
                }
                if d.content.trim().is_empty() {
                    return Err(format!("empty dialog event from {}", d.from));
                }
                Ok(())
            }
            ChannelEvent::Control(c) => {
                if c.scene.trim().is_empty() {
                    return Err(format!("{} control event without scene", c.command));
                }
                Ok(())
            }
        }
    }

    /// Whether this is a `stop` command for `scene`.
    pub fn is_stop_for(&self, scene: &str) -> bool {
        matches!(
            self,
            ChannelEvent::Control(ControlEvent { scene: s, command: ControlCommand::Stop }) if s == scene
        )
    }
}

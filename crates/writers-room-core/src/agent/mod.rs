//! Character agents for the Writers' Room.
//!
//! Each character in a scene is driven by one `CharacterAgent`:
//! - `ConversationHistory`: the lines this agent has observed in its scene
//! - `TurnPolicy`: decides whether the agent speaks after a foreign line
//! - `prompt`: builds the generation prompt and cleans the model's reply
//! - `CharacterAgent`: generation, publishing and the reactive `run` loop

pub mod character;
pub mod history;
pub mod policy;
pub mod prompt;

pub use character::{AgentError, AgentRuntime, AgentSettings, CharacterAgent, GeneratedLine};
pub use history::ConversationHistory;
pub use policy::{TurnDecision, TurnPolicy};

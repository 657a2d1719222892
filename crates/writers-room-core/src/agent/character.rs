//! The character agent.
//!
//! A `CharacterAgent` plays one character in one scene. It keeps its own
//! history, decides locally whether to speak, calls the text-generation
//! provider and publishes its lines to the shared channel. Agents never wait
//! on each other; everything they know arrives through their subscription.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use writers_room_types::character::CharacterProfile;
use writers_room_types::config::RoomConfig;
use writers_room_types::dialog::{ChannelEvent, DialogEvent};
use writers_room_types::error::GenerationError;
use writers_room_types::event::SceneEvent;
use writers_room_types::llm::{CompletionRequest, Message};
use writers_room_types::scene::SceneDefinition;

use crate::channel::envelope;
use crate::channel::{BoxBroker, BrokerError, Subscription};
use crate::director::retry::RetryPolicy;
use crate::event::EventBus;
use crate::llm::box_provider::BoxLlmProvider;

use super::history::ConversationHistory;
use super::policy::{TurnDecision, TurnPolicy};
use super::prompt::{build_system_prompt, clean_dialog, user_prompt};

const OPENING_CONTEXT: &str =
    "The scene is just beginning and nobody has spoken yet. Open the scene.";

/// Generation knobs shared by every agent in a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Empty means "the provider's configured model".
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub history_window: usize,
    pub interjection_probability: f64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&RoomConfig::default())
    }
}

impl From<&RoomConfig> for AgentSettings {
    fn from(config: &RoomConfig) -> Self {
        Self {
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            temperature: Some(config.provider.temperature),
            history_window: config.history_window,
            interjection_probability: config.interjection_probability,
        }
    }
}

/// A generated line, cleaned and ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLine {
    pub text: String,
    pub emotion: Option<String>,
    pub addressing: Option<String>,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent has no scene assigned")]
    NoScene,

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// What the director hands an agent when it starts the agent's loop.
#[derive(Debug, Clone)]
pub struct AgentRuntime {
    pub cancel: CancellationToken,
    pub events: EventBus,
    pub retry: RetryPolicy,
    /// Speak first without waiting for a trigger.
    pub opens_scene: bool,
}

pub struct CharacterAgent {
    profile: CharacterProfile,
    scene: Option<SceneDefinition>,
    history: ConversationHistory,
    policy: TurnPolicy,
    provider: Arc<BoxLlmProvider>,
    broker: Arc<BoxBroker>,
    channel: String,
    settings: AgentSettings,
}

impl CharacterAgent {
    pub fn new(
        profile: CharacterProfile,
        provider: Arc<BoxLlmProvider>,
        broker: Arc<BoxBroker>,
        channel: impl Into<String>,
        settings: AgentSettings,
    ) -> Self {
        let policy = TurnPolicy::new(settings.interjection_probability);
        Self {
            profile,
            scene: None,
            history: ConversationHistory::with_limit(settings.history_window),
            policy,
            provider,
            broker,
            channel: channel.into(),
            settings,
        }
    }

    /// Replace the turn policy, e.g. with a seeded one.
    pub fn with_policy(mut self, policy: TurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn scene(&self) -> Option<&SceneDefinition> {
        self.scene.as_ref()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Bind the agent to `scene` and forget everything heard before.
    pub fn assign_scene(&mut self, scene: SceneDefinition) {
        debug!(character = %self.profile.name, scene = %scene.scene_id, "Scene assigned");
        self.scene = Some(scene);
        self.history.clear();
    }

    /// Record `event` if it belongs to the current scene.
    ///
    /// Returns whether the event was appended. Events from other scenes, or
    /// any event while no scene is assigned, are dropped silently.
    pub fn observe(&mut self, event: &DialogEvent) -> bool {
        match &self.scene {
            Some(scene) if scene.scene_id == event.scene => {
                self.history.push(event.clone());
                true
            }
            _ => false,
        }
    }

    /// Whether to take a turn in response to the newest history entry.
    pub fn decide(&mut self) -> bool {
        let decision = self.policy.evaluate(&self.profile.name, &self.history);
        if decision != TurnDecision::Silent {
            debug!(character = %self.profile.name, ?decision, "Taking a turn");
        }
        decision.speaks()
    }

    /// Ask the provider for this character's next line.
    ///
    /// Makes exactly one provider call; retrying is the caller's business.
    pub async fn generate(&self, context: Option<&str>) -> Result<GeneratedLine, GenerationError> {
        let scene = self.scene.as_ref().ok_or(GenerationError::NoScene)?;
        let request = self.build_request(scene, context);

        let span = info_span!(
            "gen_ai.generate",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            character = %self.profile.name,
            scene = %scene.scene_id,
        );

        let response = self.provider.complete(&request).instrument(span).await?;
        let cleaned =
            clean_dialog(&response.content, &self.profile.name).ok_or(GenerationError::Empty)?;
        let addressing = self.addressee(scene, &cleaned.text);

        Ok(GeneratedLine {
            text: cleaned.text,
            emotion: cleaned.emotion,
            addressing,
        })
    }

    /// Emit a line on the shared channel.
    ///
    /// The line is not appended to history here; the agent hears it back
    /// through its subscription like everyone else.
    pub async fn publish(
        &self,
        text: &str,
        emotion: Option<String>,
        addressing: Option<String>,
    ) -> Result<DialogEvent, AgentError> {
        let scene = self.scene.as_ref().ok_or(AgentError::NoScene)?;
        let event = envelope::dialog_event(
            &self.profile.name,
            &scene.scene_id,
            text,
            emotion,
            addressing,
        );
        let receivers = self
            .broker
            .publish(&self.channel, &ChannelEvent::Dialog(event.clone()))
            .await?;
        debug!(
            character = %self.profile.name,
            scene = %scene.scene_id,
            receivers,
            "Line published"
        );
        Ok(event)
    }

    /// React to the channel until the scene stops.
    pub async fn run(mut self, mut subscription: Subscription, runtime: AgentRuntime) {
        let Some(scene_id) = self.scene.as_ref().map(|s| s.scene_id.clone()) else {
            warn!(character = %self.profile.name, "Agent started without a scene");
            return;
        };
        info!(character = %self.profile.name, scene = %scene_id, "Agent listening");

        if runtime.opens_scene {
            self.take_turn(&runtime, Some(OPENING_CONTEXT)).await;
        }

        loop {
            let event = tokio::select! {
                biased;
                _ = runtime.cancel.cancelled() => break,
                event = subscription.next() => event,
            };
            let Some(event) = event else {
                debug!(character = %self.profile.name, "Channel closed");
                break;
            };

            if event.is_stop_for(&scene_id) {
                break;
            }
            let ChannelEvent::Dialog(dialog) = event else {
                continue;
            };
            let own = dialog.from == self.profile.name;
            if self.observe(&dialog) && !own && self.decide() {
                self.take_turn(&runtime, None).await;
            }
        }

        debug!(character = %self.profile.name, scene = %scene_id, "Agent stopped");
    }

    /// Generate with retries, then publish unless the scene stopped meanwhile.
    async fn take_turn(&self, runtime: &AgentRuntime, context: Option<&str>) {
        let Some(scene_id) = self.scene.as_ref().map(|s| s.scene_id.as_str()) else {
            return;
        };
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                _ = runtime.cancel.cancelled() => return,
                result = self.generate(context) => result,
            };

            match result {
                Ok(line) => {
                    if runtime.cancel.is_cancelled() {
                        debug!(character = %self.profile.name, "Discarding line, scene stopped");
                        return;
                    }
                    if let Err(e) = self.publish(&line.text, line.emotion, line.addressing).await {
                        warn!(character = %self.profile.name, error = %e, "Failed to publish line");
                    }
                    return;
                }
                Err(e) if e.is_retryable() && runtime.retry.should_retry(attempt) => {
                    let delay = runtime.retry.delay_for(attempt);
                    warn!(
                        character = %self.profile.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Generation failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = runtime.cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        character = %self.profile.name,
                        attempts = attempt,
                        error = %e,
                        "Giving up on turn"
                    );
                    runtime.events.publish(SceneEvent::GenerationFailed {
                        scene: scene_id.to_string(),
                        character: self.profile.name.clone(),
                        error: e.to_string(),
                        attempts: attempt,
                    });
                    return;
                }
            }
        }
    }

    fn build_request(&self, scene: &SceneDefinition, context: Option<&str>) -> CompletionRequest {
        let recent = self.history.recent(self.settings.history_window);
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(user_prompt(&self.profile.name, context))],
            system: Some(build_system_prompt(&self.profile, scene, recent)),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stop_sequences: None,
        }
    }

    /// First other participant named in `text`.
    fn addressee(&self, scene: &SceneDefinition, text: &str) -> Option<String> {
        scene
            .characters
            .iter()
            .filter(|name| **name != self.profile.name)
            .find(|name| text.contains(name.as_str()))
            .cloned()
    }
}

impl std::fmt::Debug for CharacterAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterAgent")
            .field("name", &self.profile.name)
            .field("scene", &self.scene.as_ref().map(|s| &s.scene_id))
            .field("history", &self.history.len())
            .field("channel", &self.channel)
            .finish()
    }
}

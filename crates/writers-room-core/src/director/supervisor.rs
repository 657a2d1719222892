//! Scene director.
//!
//! Owns one scene's lifecycle: `Idle -> Running -> Stopped(outcome)`.
//! The director subscribes to the dialog channel alongside its agents,
//! appends every line of its scene to the transcript and stops the scene
//! when the line ceiling is hit, the room goes quiet, too many turns fail in
//! a row, or `cut()` is called. The line ceiling is enforced here, never by
//! the agents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use writers_room_types::character::{CharacterCatalog, CharacterProfile};
use writers_room_types::config::RoomConfig;
use writers_room_types::dialog::{ChannelEvent, DialogEvent};
use writers_room_types::error::SceneError;
use writers_room_types::event::SceneEvent;
use writers_room_types::production::{SceneOutcome, SceneState, SceneStatistics};
use writers_room_types::scene::SceneDefinition;

use crate::agent::{AgentRuntime, AgentSettings, CharacterAgent, TurnPolicy};
use crate::channel::envelope;
use crate::channel::broker::validate_channel;
use crate::channel::{BoxBroker, Subscription};
use crate::event::{EventBus, SceneEvents};
use crate::llm::box_provider::BoxLlmProvider;
use crate::storage::TranscriptStore;

use super::retry::RetryPolicy;
use super::transcript::Transcript;

/// How long `cut()` waits for its stop marker to come back on the channel.
const CUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-scene limits and knobs, usually derived from `RoomConfig`.
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub channel: String,
    pub max_lines: usize,
    /// A scene with no new line for this long is finished.
    pub idle_timeout: Duration,
    /// Consecutive failed turns that end the scene with an error.
    pub max_generation_failures: u32,
    pub transcript_dir: PathBuf,
    pub retry: RetryPolicy,
    pub agent: AgentSettings,
    /// Seed for the agents' interjection draws; agent `i` gets `seed + i`.
    pub seed: Option<u64>,
}

impl From<&RoomConfig> for SceneSettings {
    fn from(config: &RoomConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            max_lines: config.max_lines,
            idle_timeout: config.idle_timeout(),
            max_generation_failures: config.max_generation_failures,
            transcript_dir: config.transcript_dir.clone(),
            retry: RetryPolicy::from(config),
            agent: AgentSettings::from(config),
            seed: None,
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self::from(&RoomConfig::default())
    }
}

/// State shared between the director handle and its observation task.
struct Shared {
    scene: SceneDefinition,
    settings: SceneSettings,
    broker: Arc<BoxBroker>,
    events: EventBus,
    cancel: CancellationToken,
    /// Child of `cancel`; fired early by `cut()` so no new turns start.
    agents: CancellationToken,
    state: watch::Sender<SceneState>,
    transcript: Mutex<Transcript>,
    stop_sent: AtomicBool,
    cut_requested: AtomicBool,
}

impl Shared {
    fn new(
        scene: SceneDefinition,
        settings: SceneSettings,
        broker: Arc<BoxBroker>,
        events: EventBus,
    ) -> Self {
        let transcript = Transcript::new(scene.scene_id.clone());
        let cancel = CancellationToken::new();
        let agents = cancel.child_token();
        Self {
            scene,
            settings,
            broker,
            events,
            cancel,
            agents,
            state: watch::Sender::new(SceneState::Idle),
            transcript: Mutex::new(transcript),
            stop_sent: AtomicBool::new(false),
            cut_requested: AtomicBool::new(false),
        }
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line while running. Returns whether it was recorded.
    ///
    /// The transcript lock is held across the ceiling check and the state
    /// transition, so no line can land after the scene stopped.
    fn record(&self, event: DialogEvent) -> bool {
        let mut transcript = self.transcript();
        if !self.state.borrow().is_running() {
            debug!(scene = %self.scene.scene_id, speaker = %event.from, "Dropping line, scene not running");
            return false;
        }

        let speaker = event.from.clone();
        let content = event.content.clone();
        transcript.push(event);
        let total = transcript.len();
        debug!(scene = %self.scene.scene_id, %speaker, total, "Line recorded");

        self.events.publish(SceneEvent::LineRecorded {
            scene: self.scene.scene_id.clone(),
            speaker,
            content,
            total_lines: total,
        });

        if total >= self.settings.max_lines {
            info!(scene = %self.scene.scene_id, total, "Line limit reached");
            self.transition(total, SceneOutcome::Normal);
        }
        true
    }

    /// Move to `Stopped(outcome)` unless already stopped.
    fn stop(&self, outcome: SceneOutcome) -> bool {
        let transcript = self.transcript();
        self.transition(transcript.len(), outcome)
    }

    fn transition(&self, total: usize, outcome: SceneOutcome) -> bool {
        let stopped = self.state.send_if_modified(|state| {
            if state.is_stopped() {
                return false;
            }
            *state = SceneState::Stopped(outcome.clone());
            true
        });
        if stopped {
            self.cancel.cancel();
            info!(scene = %self.scene.scene_id, %outcome, total_lines = total, "Scene stopped");
            self.events.publish(SceneEvent::SceneStopped {
                scene: self.scene.scene_id.clone(),
                outcome,
                total_lines: total,
            });
        }
        stopped
    }

    /// Tell every listener on the channel that the scene is over. Sent once.
    ///
    /// Returns whether this call put the stop marker on the channel.
    async fn broadcast_stop(&self) -> bool {
        if self.stop_sent.swap(true, Ordering::SeqCst) {
            return false;
        }
        let stop = envelope::stop(self.scene.scene_id.clone());
        match self.broker.publish(&self.settings.channel, &stop).await {
            Ok(_) => true,
            Err(e) => {
                warn!(scene = %self.scene.scene_id, error = %e, "Failed to broadcast stop");
                false
            }
        }
    }
}

/// Supervisor for a single scene.
///
/// Dropping the director cancels the scene's tasks.
pub struct SceneDirector<S> {
    shared: Arc<Shared>,
    catalog: Arc<CharacterCatalog>,
    provider: Arc<BoxLlmProvider>,
    store: Arc<S>,
}

impl<S: TranscriptStore> SceneDirector<S> {
    pub fn new(
        scene: SceneDefinition,
        catalog: Arc<CharacterCatalog>,
        broker: Arc<BoxBroker>,
        provider: Arc<BoxLlmProvider>,
        store: Arc<S>,
        events: EventBus,
        settings: SceneSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(scene, settings, broker, events)),
            catalog,
            provider,
            store,
        }
    }

    pub fn scene(&self) -> &SceneDefinition {
        &self.shared.scene
    }

    pub fn state(&self) -> SceneState {
        self.shared.state.borrow().clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Bring the scene up: validate, subscribe everyone, then let the first
    /// participant open.
    ///
    /// Every subscription is in place before any agent task is spawned, so
    /// the opening line reaches the whole cast. On error the scene stays
    /// `Idle`.
    pub async fn start(&self) -> Result<(), SceneError> {
        let shared = &self.shared;
        let scene_id = shared.scene.scene_id.clone();
        self.ensure_idle()?;

        validate_channel(&shared.settings.channel)
            .map_err(|e| SceneError::InvalidConfig(e.to_string()))?;
        if shared.settings.max_lines == 0 {
            return Err(SceneError::InvalidConfig(
                "max_lines must be a positive integer".to_string(),
            ));
        }
        let cast = self.resolve_cast()?;

        let channel = &shared.settings.channel;
        let subscription = shared
            .broker
            .subscribe(channel)
            .await
            .map_err(|e| SceneError::Channel(e.to_string()))?;
        let mut agent_subscriptions = Vec::with_capacity(cast.len());
        for _ in &cast {
            let sub = shared
                .broker
                .subscribe(channel)
                .await
                .map_err(|e| SceneError::Channel(e.to_string()))?;
            agent_subscriptions.push(sub);
        }
        let failures = shared.events.scene(scene_id.clone());

        let started = shared.state.send_if_modified(|state| {
            if *state == SceneState::Idle {
                *state = SceneState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(self.not_idle());
        }

        let names: Vec<String> = cast.iter().map(|p| p.name.clone()).collect();
        info!(
            scene = %scene_id,
            cast = ?names,
            max_lines = shared.settings.max_lines,
            broker = self.shared.broker.name(),
            "Scene started"
        );
        shared.events.publish(SceneEvent::SceneStarted {
            scene: scene_id,
            cast: names,
            max_lines: shared.settings.max_lines,
        });

        tokio::spawn(observe(Arc::clone(shared), subscription, failures));

        for (index, (profile, subscription)) in cast.into_iter().zip(agent_subscriptions).enumerate() {
            let mut agent = CharacterAgent::new(
                profile,
                Arc::clone(&self.provider),
                Arc::clone(&shared.broker),
                shared.settings.channel.clone(),
                shared.settings.agent.clone(),
            );
            if let Some(seed) = shared.settings.seed {
                agent = agent.with_policy(TurnPolicy::seeded(
                    shared.settings.agent.interjection_probability,
                    seed.wrapping_add(index as u64),
                ));
            }
            agent.assign_scene(shared.scene.clone());

            let runtime = AgentRuntime {
                cancel: shared.agents.child_token(),
                events: shared.events.clone(),
                retry: shared.settings.retry,
                opens_scene: index == 0,
            };
            tokio::spawn(agent.run(subscription, runtime));
        }

        Ok(())
    }

    /// Resolve once the scene has stopped.
    ///
    /// A scene that is never started or cut never resolves.
    pub async fn wait(&self) -> SceneOutcome {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(SceneState::is_stopped).await {
            Ok(state) => state.outcome().cloned().unwrap_or(SceneOutcome::Cut),
            Err(_) => SceneOutcome::Error("director state closed".to_string()),
        }
    }

    /// Stop the scene now. Safe to call repeatedly, concurrently, or before
    /// `start()`; only the first call has any effect.
    ///
    /// Lines published before the cut are still recorded: the stop marker
    /// goes out on the channel first and the scene only stops once the
    /// observation loop reads it back, so everything ahead of it in the
    /// channel lands in the transcript.
    pub async fn cut(&self) {
        let shared = &self.shared;
        if shared.cut_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        if !shared.state.borrow().is_running() {
            if shared.stop(SceneOutcome::Cut) {
                shared.broadcast_stop().await;
            }
            return;
        }

        shared.agents.cancel();
        if shared.broadcast_stop().await {
            let mut rx = shared.state.subscribe();
            let drained = tokio::time::timeout(CUT_DRAIN_TIMEOUT, async {
                rx.wait_for(SceneState::is_stopped).await.map(|_| ())
            })
            .await;
            if !matches!(drained, Ok(Ok(()))) {
                warn!(scene = %shared.scene.scene_id, "Stop marker never came back, cutting without draining");
            }
        }
        shared.stop(SceneOutcome::Cut);
    }

    /// Line counts computed from the transcript at call time.
    pub fn statistics(&self) -> SceneStatistics {
        self.shared.transcript().statistics()
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.shared.transcript().clone()
    }

    /// `<transcript_dir>/<scene-name-slug>.txt`
    pub fn default_transcript_path(&self) -> PathBuf {
        self.shared
            .settings
            .transcript_dir
            .join(format!("{}.txt", self.shared.scene.slug()))
    }

    /// Write the transcript as it stands and return where it went.
    pub async fn save_transcript(&self, path: Option<&Path>) -> Result<PathBuf, SceneError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_transcript_path());
        let (content, lines) = {
            let transcript = self.shared.transcript();
            (transcript.render(), transcript.len())
        };

        self.store
            .write_transcript(&path, &content)
            .await
            .map_err(|e| SceneError::TranscriptSave {
                path: path.clone(),
                message: e.to_string(),
            })?;

        info!(scene = %self.shared.scene.scene_id, path = %path.display(), lines, "Transcript saved");
        Ok(path)
    }

    fn ensure_idle(&self) -> Result<(), SceneError> {
        if *self.shared.state.borrow() == SceneState::Idle {
            Ok(())
        } else {
            Err(self.not_idle())
        }
    }

    fn not_idle(&self) -> SceneError {
        SceneError::NotIdle {
            scene: self.shared.scene.scene_id.clone(),
            state: self.state().to_string(),
        }
    }

    fn resolve_cast(&self) -> Result<Vec<CharacterProfile>, SceneError> {
        let scene = &self.shared.scene;
        if scene.scene_id.trim().is_empty() {
            return Err(SceneError::InvalidScene(
                "scene identifier is empty".to_string(),
            ));
        }
        if scene.characters.is_empty() {
            return Err(SceneError::InvalidScene(format!(
                "scene '{}' has no participants",
                scene.scene_id
            )));
        }

        let mut seen = HashSet::new();
        let mut cast = Vec::with_capacity(scene.characters.len());
        for name in &scene.characters {
            if !seen.insert(name.as_str()) {
                return Err(SceneError::InvalidScene(format!(
                    "scene '{}' lists '{name}' twice",
                    scene.scene_id
                )));
            }
            if !CharacterProfile::is_valid_name(name) {
                return Err(SceneError::InvalidScene(format!(
                    "scene '{}' lists '{name}', character names must be a single word",
                    scene.scene_id
                )));
            }
            let profile = self.catalog.get(name).cloned().ok_or_else(|| {
                SceneError::MissingCharacter {
                    scene: scene.scene_id.clone(),
                    character: name.clone(),
                }
            })?;
            cast.push(profile);
        }
        Ok(cast)
    }
}

impl<S> Drop for SceneDirector<S> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl<S> std::fmt::Debug for SceneDirector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDirector")
            .field("scene", &self.shared.scene.scene_id)
            .field("state", &*self.shared.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Observation loop: records lines and watches for the stop conditions.
async fn observe(
    shared: Arc<Shared>,
    mut subscription: Subscription,
    mut failures: SceneEvents,
) {
    let scene_id = shared.scene.scene_id.clone();
    let idle_timeout = shared.settings.idle_timeout;
    let max_failures = shared.settings.max_generation_failures.max(1);
    let mut consecutive_failures = 0u32;
    let mut failures_open = true;

    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    let outcome = loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break None,
            event = subscription.next() => match event {
                Some(ChannelEvent::Dialog(dialog)) if dialog.scene == scene_id => {
                    if shared.record(dialog) {
                        consecutive_failures = 0;
                        idle.as_mut().reset(Instant::now() + idle_timeout);
                    }
                }
                Some(event) if event.is_stop_for(&scene_id) => {
                    debug!(scene = %scene_id, "Stop marker received");
                    break Some(SceneOutcome::Cut);
                }
                Some(_) => {}
                None => {
                    break Some(SceneOutcome::Error("dialog channel closed".to_string()));
                }
            },
            event = failures.recv(), if failures_open => match event {
                Some(SceneEvent::GenerationFailed { character, error, .. }) => {
                    consecutive_failures += 1;
                    warn!(
                        scene = %scene_id,
                        %character,
                        %error,
                        consecutive_failures,
                        "Turn skipped after generation failure"
                    );
                    if consecutive_failures >= max_failures {
                        break Some(SceneOutcome::Error(format!(
                            "{consecutive_failures} consecutive generation failures, last from {character}: {error}"
                        )));
                    }
                }
                Some(_) => {}
                None => failures_open = false,
            },
            _ = &mut idle => {
                info!(scene = %scene_id, timeout_secs = idle_timeout.as_secs_f64(), "No new lines, scene went quiet");
                break Some(SceneOutcome::Normal);
            }
        }
    };

    // Cancelled without a recorded outcome means the director went away.
    shared.stop(outcome.unwrap_or(SceneOutcome::Cut));
    shared.broadcast_stop().await;
    debug!(scene = %scene_id, "Observation loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;
    use crate::channel::InMemoryBroker;
    use crate::testing::{BrokenTranscriptStore, MemoryTranscriptStore, ScriptedProvider, catalog, scene};

    const CHANNEL: &str = "writers_room:test";

    fn settings(max_lines: usize) -> SceneSettings {
        SceneSettings {
            channel: CHANNEL.to_string(),
            max_lines,
            idle_timeout: Duration::from_secs(5),
            max_generation_failures: 3,
            transcript_dir: PathBuf::from("out"),
            retry: RetryPolicy::none(),
            agent: AgentSettings {
                interjection_probability: 0.0,
                ..AgentSettings::default()
            },
            seed: Some(7),
        }
    }

    fn build(
        scene_def: SceneDefinition,
        provider: ScriptedProvider,
        broker: &Arc<BoxBroker>,
        settings: SceneSettings,
    ) -> (SceneDirector<MemoryTranscriptStore>, MemoryTranscriptStore) {
        let store = MemoryTranscriptStore::new();
        let director = SceneDirector::new(
            scene_def,
            Arc::new(catalog(&["Alice", "Bob", "Carol"])),
            Arc::clone(broker),
            Arc::new(BoxLlmProvider::new(provider)),
            Arc::new(store.clone()),
            EventBus::default(),
            settings,
        );
        (director, store)
    }

    fn memory_broker() -> Arc<BoxBroker> {
        Arc::new(BoxBroker::new(InMemoryBroker::new()))
    }

    async fn wait_for_lines(events: &mut broadcast::Receiver<SceneEvent>, lines: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(SceneEvent::LineRecorded { total_lines, .. }) = events.recv().await {
                    if total_lines >= lines {
                        return;
                    }
                }
            }
        })
        .await
        .expect("lines should be recorded");
    }

    fn running_shared(max_lines: usize) -> Shared {
        let shared = Shared::new(
            scene("s1", &["Alice", "Bob"]),
            settings(max_lines),
            memory_broker(),
            EventBus::default(),
        );
        shared.state.send_replace(SceneState::Running);
        shared
    }

    #[test]
    fn test_record_stops_at_line_limit() {
        let shared = running_shared(3);
        let line = |speaker: &str| envelope::dialog_event(speaker, "s1", "...", None, None);

        assert!(shared.record(line("Alice")));
        assert!(shared.record(line("Bob")));
        assert_eq!(shared.transcript().len(), 2);
        assert!(shared.state.borrow().is_running());

        assert!(shared.record(line("Alice")));
        assert_eq!(
            *shared.state.borrow(),
            SceneState::Stopped(SceneOutcome::Normal)
        );
        assert!(shared.cancel.is_cancelled());

        assert!(!shared.record(line("Bob")));
        let stats = shared.transcript().statistics();
        assert_eq!(stats.total_lines, 3);
        assert_eq!(stats.lines_for("Alice"), 2);
    }

    #[test]
    fn test_stop_is_first_writer_wins() {
        let shared = running_shared(10);
        assert!(shared.stop(SceneOutcome::Cut));
        assert!(!shared.stop(SceneOutcome::Normal));
        assert_eq!(*shared.state.borrow(), SceneState::Stopped(SceneOutcome::Cut));
    }

    #[tokio::test]
    async fn test_scene_runs_to_line_limit() {
        let broker = memory_broker();
        let provider = ScriptedProvider::cycling(["Listen, Alice and Bob."]);
        let (director, store) = build(scene("s1", &["Alice", "Bob"]), provider, &broker, settings(4));

        director.start().await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), director.wait())
            .await
            .unwrap();
        assert_eq!(outcome, SceneOutcome::Normal);

        // Agents may still have lines in flight; none of them may be recorded.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = director.statistics();
        assert_eq!(stats.total_lines, 4);
        assert_eq!(stats.total_lines, stats.lines_by_character.values().sum::<usize>());

        let path = director.save_transcript(None).await.unwrap();
        assert_eq!(path, PathBuf::from("out/scene_s1.txt"));
        let saved = store.get(&path).unwrap();
        assert_eq!(saved.lines().count(), 4);
        assert_eq!(crate::director::report::parse_statistics(&saved), stats);
    }

    #[tokio::test]
    async fn test_cut_after_two_lines() {
        let broker = memory_broker();
        // Alice opens, Bob answers, then every further call hangs.
        let provider = ScriptedProvider::new(["Hello Bob.", "Hi Alice."]);
        let (director, store) = build(scene("s1", &["Alice", "Bob"]), provider, &broker, settings(50));
        let mut events = director.events().subscribe();

        director.start().await.unwrap();
        wait_for_lines(&mut events, 2).await;

        director.cut().await;
        director.cut().await;
        assert_eq!(director.wait().await, SceneOutcome::Cut);

        let path = director.save_transcript(Some(Path::new("cut.txt"))).await.unwrap();
        assert_eq!(store.get(&path).unwrap(), "Alice: Hello Bob.\nBob: Hi Alice.\n");
        assert_eq!(director.statistics().total_lines, 2);
    }

    #[tokio::test]
    async fn test_cut_keeps_lines_already_on_the_channel() {
        let broker = memory_broker();
        let (director, store) = build(
            scene("s1", &["Alice", "Bob"]),
            ScriptedProvider::new(Vec::<String>::new()),
            &broker,
            settings(50),
        );
        director.start().await.unwrap();

        for line in ["one", "two"] {
            broker
                .publish(CHANNEL, &envelope::dialog("Bob", "s1", line, None, None))
                .await
                .unwrap();
        }
        director.cut().await;
        assert_eq!(director.state(), SceneState::Stopped(SceneOutcome::Cut));

        let path = director.save_transcript(None).await.unwrap();
        assert_eq!(store.get(&path).unwrap(), "Bob: one\nBob: two\n");
        assert_eq!(director.statistics().total_lines, 2);
    }

    #[tokio::test]
    async fn test_cut_broadcasts_stop_control() {
        let broker = memory_broker();
        let mut listener = broker.subscribe(CHANNEL).await.unwrap();
        let (director, _) = build(
            scene("s1", &["Alice"]),
            ScriptedProvider::new(Vec::<String>::new()),
            &broker,
            settings(50),
        );
        director.start().await.unwrap();
        director.cut().await;

        let event = tokio::time::timeout(Duration::from_secs(2), listener.next())
            .await
            .unwrap()
            .unwrap();
        assert!(event.is_stop_for("s1"));
    }

    #[tokio::test]
    async fn test_lines_from_other_scenes_are_ignored() {
        let broker = memory_broker();
        let (director, _) = build(
            scene("s1", &["Alice"]),
            ScriptedProvider::new(Vec::<String>::new()),
            &broker,
            settings(50),
        );
        let mut events = director.events().subscribe();
        director.start().await.unwrap();

        broker
            .publish(CHANNEL, &envelope::dialog("Bob", "s2", "Wrong room.", None, None))
            .await
            .unwrap();
        broker
            .publish(CHANNEL, &envelope::dialog("Bob", "s1", "Right room.", None, None))
            .await
            .unwrap();
        wait_for_lines(&mut events, 1).await;

        let transcript = director.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.lines()[0].content, "Right room.");
        director.cut().await;
    }

    #[tokio::test]
    async fn test_missing_character_keeps_scene_idle() {
        let broker = memory_broker();
        let (director, _) = build(
            scene("s1", &["Alice", "Dave"]),
            ScriptedProvider::new(["x"]),
            &broker,
            settings(50),
        );
        let err = director.start().await.unwrap_err();
        assert!(matches!(err, SceneError::MissingCharacter { ref character, .. } if character == "Dave"));
        assert_eq!(director.state(), SceneState::Idle);
    }

    #[tokio::test]
    async fn test_multi_word_participant_rejected() {
        let broker = memory_broker();
        let director = SceneDirector::new(
            scene("s1", &["Alice", "Mary Jane"]),
            Arc::new(catalog(&["Alice", "Mary Jane"])),
            Arc::clone(&broker),
            Arc::new(BoxLlmProvider::new(ScriptedProvider::new(["x"]))),
            Arc::new(MemoryTranscriptStore::new()),
            EventBus::default(),
            settings(50),
        );
        let err = director.start().await.unwrap_err();
        assert!(matches!(err, SceneError::InvalidScene(ref msg) if msg.contains("Mary Jane")));
        assert_eq!(director.state(), SceneState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_scenes_rejected() {
        let broker = memory_broker();
        let (empty, _) = build(scene("s1", &[]), ScriptedProvider::new(["x"]), &broker, settings(50));
        assert!(matches!(empty.start().await, Err(SceneError::InvalidScene(_))));

        let (twice, _) = build(
            scene("s1", &["Alice", "Alice"]),
            ScriptedProvider::new(["x"]),
            &broker,
            settings(50),
        );
        assert!(matches!(twice.start().await, Err(SceneError::InvalidScene(_))));

        let (blank, _) = build(scene(" ", &["Alice"]), ScriptedProvider::new(["x"]), &broker, settings(50));
        assert!(matches!(blank.start().await, Err(SceneError::InvalidScene(_))));

        let mut bad_channel = settings(50);
        bad_channel.channel = String::new();
        let (director, _) = build(scene("s1", &["Alice"]), ScriptedProvider::new(["x"]), &broker, bad_channel);
        assert!(matches!(director.start().await, Err(SceneError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_start_twice_and_start_after_cut() {
        let broker = memory_broker();
        let (director, _) = build(
            scene("s1", &["Alice"]),
            ScriptedProvider::new(Vec::<String>::new()),
            &broker,
            settings(50),
        );
        director.start().await.unwrap();
        assert!(matches!(director.start().await, Err(SceneError::NotIdle { .. })));
        director.cut().await;

        let (never_started, _) = director_pair_for_cut(&broker);
        never_started.cut().await;
        assert_eq!(never_started.state(), SceneState::Stopped(SceneOutcome::Cut));
        assert!(matches!(never_started.start().await, Err(SceneError::NotIdle { .. })));
        assert_eq!(never_started.statistics().total_lines, 0);
    }

    fn director_pair_for_cut(
        broker: &Arc<BoxBroker>,
    ) -> (SceneDirector<MemoryTranscriptStore>, MemoryTranscriptStore) {
        build(scene("s2", &["Bob"]), ScriptedProvider::new(["x"]), broker, settings(50))
    }

    #[tokio::test]
    async fn test_quiet_scene_stops_normally() {
        let broker = memory_broker();
        let mut quiet = settings(50);
        quiet.idle_timeout = Duration::from_millis(100);
        let (director, _) = build(
            scene("s1", &["Alice"]),
            ScriptedProvider::new(Vec::<String>::new()),
            &broker,
            quiet,
        );
        director.start().await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), director.wait())
            .await
            .unwrap();
        assert_eq!(outcome, SceneOutcome::Normal);
    }

    #[tokio::test]
    async fn test_failing_sole_participant() {
        let broker = memory_broker();

        // One failure is tolerated; the room then goes quiet.
        let mut tolerant = settings(50);
        tolerant.idle_timeout = Duration::from_millis(150);
        let (director, _) = build(scene("s1", &["Alice"]), ScriptedProvider::failing(), &broker, tolerant);
        director.start().await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), director.wait())
            .await
            .unwrap();
        assert_eq!(outcome, SceneOutcome::Normal);
        assert_eq!(director.statistics().total_lines, 0);

        // With a limit of one, the first skipped turn ends the scene.
        let mut strict = settings(50);
        strict.max_generation_failures = 1;
        let (director, _) = build(scene("s2", &["Alice"]), ScriptedProvider::failing(), &broker, strict);
        director.start().await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), director.wait())
            .await
            .unwrap();
        assert!(matches!(outcome, SceneOutcome::Error(_)));
        assert_eq!(director.statistics().total_lines, 0);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let broker = memory_broker();
        let director = SceneDirector::new(
            scene("s1", &["Alice"]),
            Arc::new(catalog(&["Alice"])),
            broker,
            Arc::new(BoxLlmProvider::new(ScriptedProvider::new(["x"]))),
            Arc::new(BrokenTranscriptStore),
            EventBus::default(),
            settings(50),
        );
        let err = director.save_transcript(None).await.unwrap_err();
        assert!(matches!(err, SceneError::TranscriptSave { .. }));
    }
}
